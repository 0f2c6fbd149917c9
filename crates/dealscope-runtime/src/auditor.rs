//! Pipeline orchestration.
//!
//! The deterministic engine runs first and is authoritative for every
//! number. The provider call only fills identity fields and narrative
//! prose, and a validated reply is merged on top without ever touching
//! the score, flags, caps, or deductions. Dropping the returned future
//! cancels cleanly; no partial result is ever produced.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use dealscope_core::{AuditError, AuditResult, DealRecord, Region};

use crate::cache::{self, ReplyCache};
use crate::config::RuntimeConfig;
use crate::prompts;
use crate::providers::{ChatMessage, LlmProvider, ProviderError};
use crate::reply::{self, ReplyError, ValidatedReply};

/// Errors from the enriched audit pipeline.
#[derive(Error, Debug)]
pub enum AuditServiceError {
    #[error("deal record rejected: {0}")]
    InvalidRecord(#[from] AuditError),

    #[error("upstream provider unavailable: {source}")]
    UpstreamUnavailable {
        #[source]
        source: ProviderError,
    },

    #[error("upstream reply was not parseable JSON")]
    MalformedReply { raw: String },

    #[error("upstream reply broke the contract: {detail}")]
    ContractViolation { detail: String, raw: String },
}

impl From<ReplyError> for AuditServiceError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Malformed { raw } => AuditServiceError::MalformedReply { raw },
            ReplyError::ContractViolation { field, raw } => AuditServiceError::ContractViolation {
                detail: format!("missing required field '{field}'"),
                raw,
            },
            ReplyError::SchemaViolation { detail, raw } => {
                AuditServiceError::ContractViolation { detail, raw }
            }
        }
    }
}

impl AuditServiceError {
    /// Raw upstream text, when the failure produced any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AuditServiceError::MalformedReply { raw }
            | AuditServiceError::ContractViolation { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Orchestrates deterministic scoring plus optional LLM enrichment.
pub struct Auditor {
    provider: Arc<dyn LlmProvider>,
    config: RuntimeConfig,
    cache: ReplyCache,
}

impl Auditor {
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        let cache = ReplyCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            provider,
            config,
            cache,
        }
    }

    /// Full pipeline: deterministic audit, then enrichment.
    ///
    /// Fails if the provider is unreachable or its reply breaks the
    /// contract. Callers that prefer a degraded result over an error
    /// should use [`Auditor::audit_or_fallback`].
    pub async fn audit(&self, record: &DealRecord) -> Result<AuditResult, AuditServiceError> {
        let base = dealscope_core::audit(record)?;
        let reply = self.enrich(record, &base).await?;
        Ok(merge(base, reply))
    }

    /// Full pipeline, degrading to the pure deterministic result on
    /// any provider or contract failure.
    pub async fn audit_or_fallback(
        &self,
        record: &DealRecord,
    ) -> Result<AuditResult, AuditError> {
        let base = dealscope_core::audit(record)?;
        match self.enrich(record, &base).await {
            Ok(reply) => Ok(merge(base, reply)),
            Err(err) => {
                warn!(%err, "enrichment failed, returning deterministic result");
                Ok(base)
            }
        }
    }

    async fn enrich(
        &self,
        record: &DealRecord,
        base: &AuditResult,
    ) -> Result<ValidatedReply, AuditServiceError> {
        let canonical =
            prompts::canonical_deal_json(record).map_err(|err| AuditServiceError::MalformedReply {
                raw: err.to_string(),
            })?;
        let key = cache::deal_key(&canonical);
        if let Some(cached) = self.cache.get(key).await {
            debug!(key, "using cached reply");
            return Ok(cached);
        }

        let request =
            prompts::enrichment_request(record, base).map_err(|err| {
                AuditServiceError::MalformedReply {
                    raw: err.to_string(),
                }
            })?;
        let messages = vec![
            ChatMessage::system(prompts::ENRICHMENT_SYSTEM_PROMPT),
            ChatMessage::user(request),
        ];

        let response = self
            .provider
            .complete(messages, &self.config.completion_config())
            .await
            .map_err(|source| AuditServiceError::UpstreamUnavailable { source })?;

        info!(
            provider = self.provider.name(),
            tokens = response.usage.total(),
            "enrichment completed"
        );

        let validated = reply::validate(&response.content)?;
        self.cache.insert(key, validated.clone()).await;
        Ok(validated)
    }
}

/// Merge a validated reply into the engine's result.
///
/// Identity and prose come from the reply when present; the engine's
/// deterministic extraction backstops anything the model left null.
/// Numbers are never taken from the reply. The region is re-derived
/// from the merged state so the classifier stays the single source of
/// regional truth.
fn merge(mut base: AuditResult, reply: ValidatedReply) -> AuditResult {
    base.buyer_name = reply.buyer_name.or(base.buyer_name);
    base.dealer_name = reply.dealer_name.or(base.dealer_name);
    base.logo_text = reply.logo_text.or(base.logo_text);
    base.email = reply.email.or(base.email);
    base.phone_number = reply.phone_number.or(base.phone_number);
    base.address = reply.address.or(base.address);
    base.vin_number = reply.vin_number.or(base.vin_number);
    base.date = reply.date.or(base.date);
    base.state = reply.state.or(base.state);
    base.region = Region::from_state(base.state.as_deref());

    // Selling price is financial: the engine's extraction wins and the
    // reply only fills a hole.
    if base.selling_price.is_none() {
        base.selling_price = reply.selling_price;
    }

    if let Some(message) = reply.buyer_message {
        base.buyer_message = message;
    }
    base.narrative = reply.narrative;
    base
}
