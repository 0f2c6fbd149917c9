//! Structured output of the document-understanding service.
//!
//! These types mirror the OCR service's response shape: a full document
//! text plus per-page blocks, form fields, and tables, all referencing
//! the text through anchors (character-range segments). The service
//! itself is an external collaborator; this crate only consumes its
//! output.

use serde::{Deserialize, Serialize};

/// A half-open character range into the document's full text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct TextSegment {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
}

/// Character-offset reference into the full document text.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TextAnchor {
    #[serde(default)]
    pub text_segments: Vec<TextSegment>,
}

impl TextAnchor {
    /// Concatenate the referenced character ranges of `full_text`,
    /// trimmed of surrounding whitespace.
    ///
    /// An anchor with no segments resolves to the empty string; this is
    /// a normal condition, not an error. Out-of-range segments are
    /// clamped to the text length.
    pub fn resolve(&self, full_text: &str) -> String {
        let mut fragments = String::new();
        for segment in &self.text_segments {
            let start = segment.start_index.min(full_text.len());
            let end = segment.end_index.clamp(start, full_text.len());
            // Ranges come from the OCR service in byte offsets; step back
            // to the nearest char boundary rather than panic on a slice.
            let start = floor_char_boundary(full_text, start);
            let end = floor_char_boundary(full_text, end);
            if start < end {
                fragments.push_str(&full_text[start..end]);
            }
        }
        fragments.trim().to_string()
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A point of a bounding polygon in page-normalized coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Bounding polygon of a layout element.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BoundingPoly {
    #[serde(default)]
    pub normalized_vertices: Vec<Vertex>,
}

impl BoundingPoly {
    /// Mean of the polygon's normalized Y coordinates, or `None` when
    /// the polygon has no vertices.
    pub fn mean_y(&self) -> Option<f64> {
        if self.normalized_vertices.is_empty() {
            return None;
        }
        let sum: f64 = self.normalized_vertices.iter().map(|v| v.y).sum();
        Some(sum / self.normalized_vertices.len() as f64)
    }
}

/// Layout of a detected element: its anchor, position, and confidence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Layout {
    #[serde(default)]
    pub text_anchor: TextAnchor,

    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,

    #[serde(default)]
    pub confidence: Option<f64>,
}

/// A text block on a page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Block {
    #[serde(default)]
    pub layout: Layout,
}

/// A detected form field: paired label and value regions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OcrFormField {
    #[serde(default)]
    pub field_name: Layout,

    #[serde(default)]
    pub field_value: Layout,
}

/// One table cell with its span information.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableCell {
    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub row_span: u32,

    #[serde(default)]
    pub col_span: u32,
}

/// A table row.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

/// A detected table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Table {
    #[serde(default)]
    pub header_rows: Vec<TableRow>,

    #[serde(default)]
    pub body_rows: Vec<TableRow>,
}

/// One page of the OCR output.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Page {
    #[serde(default)]
    pub page_number: u32,

    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default)]
    pub form_fields: Vec<OcrFormField>,

    #[serde(default)]
    pub tables: Vec<Table>,
}

/// The document-understanding service's full response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OcrDocument {
    /// Full concatenated document text.
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub pages: Vec<Page>,
}

/// A resolved table cell: text plus confidence and spans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedCell {
    pub text: String,
    pub confidence: Option<f64>,
    pub row_span: u32,
    pub col_span: u32,
}

impl Table {
    /// Resolve every cell of the table against the document text.
    pub fn resolve(&self, full_text: &str) -> (Vec<Vec<ResolvedCell>>, Vec<Vec<ResolvedCell>>) {
        let resolve_rows = |rows: &[TableRow]| {
            rows.iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(|cell| ResolvedCell {
                            text: cell.layout.text_anchor.resolve(full_text),
                            confidence: cell.layout.confidence,
                            row_span: cell.row_span,
                            col_span: cell.col_span,
                        })
                        .collect()
                })
                .collect()
        };
        (resolve_rows(&self.header_rows), resolve_rows(&self.body_rows))
    }
}
