//! # dealscope-runtime
//!
//! LLM enrichment and upstream plumbing for DealScope.
//!
//! The deterministic engine in `dealscope-core` never makes network
//! calls and is always authoritative for scores, flags, caps, and
//! deductions. This crate wraps it with the pieces that talk to the
//! outside world:
//!
//! - [`Auditor`]: the full pipeline. Deterministic audit first, then an
//!   LLM pass that fills identity fields and writes the narrative,
//!   validated against an embedded JSON Schema before anything is
//!   merged.
//! - [`GroqProvider`]: OpenAI-compatible chat completions at
//!   temperature 0 with a fixed seed, so replies are cacheable.
//! - [`VisionExtractor`]: logo text from document images. Degrades to
//!   an empty extraction on any failure.
//! - [`ReplyCache`]: TTL-bounded cache keyed by the canonical deal
//!   JSON.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dealscope_core::DealRecord;
//! use dealscope_runtime::{Auditor, GroqProvider, RuntimeConfig};
//!
//! let provider = Arc::new(GroqProvider::from_env()?);
//! let auditor = Auditor::new(provider, RuntimeConfig::from_env());
//!
//! let record = DealRecord::from_text(ocr_text);
//! let result = auditor.audit_or_fallback(&record).await?;
//! println!("{} ({:?})", result.score, result.badge);
//! ```

pub mod auditor;
pub mod cache;
pub mod config;
pub mod prompts;
pub mod providers;
pub mod reply;
pub mod vision;

pub use auditor::{AuditServiceError, Auditor};
pub use cache::ReplyCache;
pub use config::RuntimeConfig;
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, GroqProvider, LlmProvider,
    ProviderError, TokenUsage,
};
pub use reply::{ReplyError, ValidatedReply};
pub use vision::{DetectedLogo, LogoExtraction, VisionExtractor};
