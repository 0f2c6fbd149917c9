//! Document field normalizer.
//!
//! Turns the raw OCR document into a flat [`DealRecord`]: logo text
//! candidates from the page header band, labeled form fields, table
//! cell text, and the detected APR. Normalization is lossy on purpose;
//! downstream rules only need labeled values and free text, not page
//! geometry.

use tracing::debug;

use crate::apr;
use crate::document::{OcrDocument, Page};
use crate::types::{DealRecord, FormField, LogoText};

/// Blocks whose mean normalized Y sits below this line count as header
/// content and contribute logo text candidates.
///
/// The upstream extraction used two competing values (0.10 and 0.15)
/// for different code paths; the wider band is kept so short headers
/// on skewed scans still land inside it.
pub const HEADER_Y_THRESHOLD: f64 = 0.15;

/// Flatten an OCR document into an audit-ready deal record.
pub fn normalize(document: &OcrDocument) -> DealRecord {
    let mut form_fields = Vec::new();
    let mut logo_text = Vec::new();
    let mut scan_text = document.text.clone();

    for page in &document.pages {
        collect_logo_text(page, &document.text, &mut logo_text);
        collect_form_fields(page, &document.text, &mut form_fields);
        collect_table_text(page, &document.text, &mut scan_text);
    }

    let candidates = apr::collect_candidates(&scan_text);
    let detected_apr = apr::select_apr(&candidates);
    debug!(
        pages = document.pages.len(),
        fields = form_fields.len(),
        logo_candidates = logo_text.len(),
        apr_candidates = candidates.len(),
        "normalized document"
    );

    DealRecord {
        text: document.text.clone(),
        form_fields,
        logo_text,
        detected_apr,
    }
}

fn collect_logo_text(page: &Page, full_text: &str, out: &mut Vec<LogoText>) {
    for block in &page.blocks {
        let in_header = block
            .layout
            .bounding_poly
            .as_ref()
            .and_then(|poly| poly.mean_y())
            .is_some_and(|y| y < HEADER_Y_THRESHOLD);
        if !in_header {
            continue;
        }
        let text = block.layout.text_anchor.resolve(full_text);
        if !text.is_empty() {
            out.push(LogoText {
                text,
                confidence: block.layout.confidence,
            });
        }
    }
}

fn collect_form_fields(page: &Page, full_text: &str, out: &mut Vec<FormField>) {
    for field in &page.form_fields {
        let name = field.field_name.text_anchor.resolve(full_text);
        if name.is_empty() {
            continue;
        }
        let value = field.field_value.text_anchor.resolve(full_text);
        out.push(FormField {
            name,
            value: (!value.is_empty()).then_some(value),
            confidence: field.field_value.confidence,
        });
    }
}

/// Table cells often hold the APR and payment grid that never appears
/// in block text; append their text so the percent scan sees it.
fn collect_table_text(page: &Page, full_text: &str, scan_text: &mut String) {
    for table in &page.tables {
        let (headers, body) = table.resolve(full_text);
        for row in headers.iter().chain(body.iter()) {
            for cell in row {
                if !cell.text.is_empty() {
                    scan_text.push('\n');
                    scan_text.push_str(&cell.text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        Block, BoundingPoly, Layout, OcrFormField, Table, TableCell, TableRow, TextAnchor,
        TextSegment, Vertex,
    };

    fn anchor(start: usize, end: usize) -> TextAnchor {
        TextAnchor {
            text_segments: vec![TextSegment {
                start_index: start,
                end_index: end,
            }],
        }
    }

    fn block_at(start: usize, end: usize, y: f64, confidence: f64) -> Block {
        Block {
            layout: Layout {
                text_anchor: anchor(start, end),
                bounding_poly: Some(BoundingPoly {
                    normalized_vertices: vec![Vertex { x: 0.1, y }, Vertex { x: 0.9, y }],
                }),
                confidence: Some(confidence),
            },
        }
    }

    #[test]
    fn test_header_blocks_become_logo_text() {
        let text = "Shottenkirk Kia\nSelling Price: $28,500";
        let document = OcrDocument {
            text: text.to_string(),
            pages: vec![Page {
                page_number: 1,
                blocks: vec![block_at(0, 15, 0.04, 0.92), block_at(16, 38, 0.5, 0.99)],
                ..Default::default()
            }],
        };

        let record = normalize(&document);
        assert_eq!(record.logo_text.len(), 1);
        assert_eq!(record.logo_text[0].text, "Shottenkirk Kia");
        assert_eq!(record.logo_text[0].confidence, Some(0.92));
    }

    #[test]
    fn test_block_at_threshold_is_not_header() {
        let text = "Borderline";
        let document = OcrDocument {
            text: text.to_string(),
            pages: vec![Page {
                blocks: vec![block_at(0, 10, HEADER_Y_THRESHOLD, 0.9)],
                ..Default::default()
            }],
        };
        assert!(normalize(&document).logo_text.is_empty());
    }

    #[test]
    fn test_form_fields_resolve_labels_and_values() {
        let text = "Selling Price: $28,500";
        let document = OcrDocument {
            text: text.to_string(),
            pages: vec![Page {
                form_fields: vec![OcrFormField {
                    field_name: Layout {
                        text_anchor: anchor(0, 14),
                        ..Default::default()
                    },
                    field_value: Layout {
                        text_anchor: anchor(15, 22),
                        confidence: Some(0.88),
                        ..Default::default()
                    },
                }],
                ..Default::default()
            }],
        };

        let record = normalize(&document);
        assert_eq!(record.form_fields.len(), 1);
        assert_eq!(record.form_fields[0].name, "Selling Price:");
        assert_eq!(record.form_fields[0].value.as_deref(), Some("$28,500"));
        assert_eq!(record.form_fields[0].confidence, Some(0.88));
    }

    #[test]
    fn test_missing_value_stays_none() {
        let text = "MSRP:";
        let document = OcrDocument {
            text: text.to_string(),
            pages: vec![Page {
                form_fields: vec![OcrFormField {
                    field_name: Layout {
                        text_anchor: anchor(0, 5),
                        ..Default::default()
                    },
                    field_value: Layout::default(),
                }],
                ..Default::default()
            }],
        };

        let record = normalize(&document);
        assert_eq!(record.form_fields[0].value, None);
    }

    #[test]
    fn test_apr_detected_from_table_cells() {
        let text = "Finance Offer 6.49% APR";
        let document = OcrDocument {
            text: text.to_string(),
            pages: vec![Page {
                tables: vec![Table {
                    header_rows: vec![],
                    body_rows: vec![TableRow {
                        cells: vec![TableCell {
                            layout: Layout {
                                text_anchor: anchor(14, 23),
                                ..Default::default()
                            },
                            row_span: 1,
                            col_span: 1,
                        }],
                    }],
                }],
                ..Default::default()
            }],
        };

        assert_eq!(normalize(&document).detected_apr, Some(6.49));
    }

    #[test]
    fn test_empty_document_normalizes_cleanly() {
        let record = normalize(&OcrDocument::default());
        assert!(record.text.is_empty());
        assert!(record.form_fields.is_empty());
        assert!(record.logo_text.is_empty());
        assert!(record.detected_apr.is_none());
    }
}
