//! Admission pipeline: the ordered gate sequence applied to every request.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audit::{AuditRecord, AuditSink};
use crate::config::FirewallConfig;
use crate::inspection::{Classification, GraphqlInspector, PayloadClassifier};
use crate::observability::metrics;
use crate::pipeline::{BlockReason, Decision, RequestDescriptor};
use crate::security::{AccessGate, SlidingWindowLimiter};
use crate::signatures::SignatureCatalog;

/// Counters kept by the pipeline since startup.
#[derive(Debug, Default)]
struct PipelineStats {
    evaluated: AtomicU64,
    allowed: AtomicU64,
    blocked: AtomicU64,
    by_reason: DashMap<&'static str, u64>,
}

impl PipelineStats {
    fn record(&self, decision: &Decision) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
        match decision.reason() {
            None => {
                self.allowed.fetch_add(1, Ordering::Relaxed);
            }
            Some(reason) => {
                self.blocked.fetch_add(1, Ordering::Relaxed);
                *self.by_reason.entry(reason.label()).or_insert(0) += 1;
            }
        }
    }
}

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub evaluated: u64,
    pub allowed: u64,
    pub blocked: u64,
    pub blocked_by_reason: BTreeMap<String, u64>,
    pub tracked_clients: usize,
}

/// Runs each request through the gates in order and emits one audit record.
///
/// Gate order: access, rate limit, body size, then content inspection for
/// non-empty bodies (GraphQL inspector on the GraphQL path, the payload
/// classifier elsewhere). The first gate that objects decides.
pub struct AdmissionPipeline {
    access: AccessGate,
    limiter: Arc<SlidingWindowLimiter>,
    classifier: PayloadClassifier,
    graphql: GraphqlInspector,
    audit: Option<Arc<dyn AuditSink>>,
    graphql_path: String,
    api_key_header: String,
    max_body_bytes: usize,
    stats: PipelineStats,
}

impl AdmissionPipeline {
    /// Assemble a pipeline. `audit` of `None` disables audit emission.
    pub fn new(
        config: &FirewallConfig,
        catalog: Arc<SignatureCatalog>,
        limiter: Arc<SlidingWindowLimiter>,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Self {
        let inspection = &config.inspection;
        Self {
            access: AccessGate::from_config(&config.access),
            limiter,
            classifier: PayloadClassifier::new(catalog, inspection.max_payload_chars),
            graphql: GraphqlInspector::new(inspection.max_graphql_depth, inspection.max_parse_nesting),
            audit,
            graphql_path: inspection.graphql_path.clone(),
            api_key_header: config.access.api_key_header.clone(),
            max_body_bytes: inspection.max_body_bytes,
            stats: PipelineStats::default(),
        }
    }

    /// Evaluate one request. Never fails: internal faults become a block.
    pub fn evaluate(&self, request: &RequestDescriptor) -> (Decision, AuditRecord) {
        let decision = fail_closed(|| self.decide(request));
        self.finish(request, decision)
    }

    /// Record a decision made outside the gates (e.g. an unreadable body).
    pub fn reject(&self, request: &RequestDescriptor, reason: BlockReason) -> (Decision, AuditRecord) {
        self.finish(request, Decision::Block(reason))
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            evaluated: self.stats.evaluated.load(Ordering::Relaxed),
            allowed: self.stats.allowed.load(Ordering::Relaxed),
            blocked: self.stats.blocked.load(Ordering::Relaxed),
            blocked_by_reason: self
                .stats
                .by_reason
                .iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect(),
            tracked_clients: self.limiter.tracked_clients(),
        }
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Body limit enforced by the size gate, in bytes.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    fn decide(&self, request: &RequestDescriptor) -> Decision {
        if let Err(denial) = self.access.authorize(
            request.client(),
            request.method(),
            request.path(),
            request.header(&self.api_key_header),
            request.header("user-agent"),
        ) {
            return Decision::Block(BlockReason::Access(denial));
        }

        if !self.limiter.admit(request.client(), request.received_at()) {
            return Decision::Block(BlockReason::RateLimited);
        }

        if request.body_len() > self.max_body_bytes {
            return Decision::Block(BlockReason::RequestTooLarge);
        }
        let body = request.body_text();
        if body.is_empty() {
            return Decision::Allow;
        }

        match self.inspect_content(request.path(), body) {
            Some(reason) => Decision::Block(reason),
            None => Decision::Allow,
        }
    }

    fn inspect_content(&self, path: &str, body: &str) -> Option<BlockReason> {
        if path.contains(&self.graphql_path) {
            return self.graphql.inspect(body).err().map(BlockReason::Graphql);
        }

        match self.classifier.classify(body) {
            Classification::Clean => None,
            Classification::Threat(category) => Some(BlockReason::Threat(category)),
            Classification::Oversized => Some(BlockReason::PayloadTooLarge),
        }
    }

    fn finish(&self, request: &RequestDescriptor, decision: Decision) -> (Decision, AuditRecord) {
        let record = AuditRecord::new(request, &decision);

        match decision.reason() {
            None => tracing::debug!(
                client = %request.client(),
                method = %request.method(),
                path = %request.path(),
                "Request admitted"
            ),
            Some(reason) => tracing::warn!(
                client = %request.client(),
                method = %request.method(),
                path = %request.path(),
                status = decision.status().as_u16(),
                reason = %reason,
                "Request blocked"
            ),
        }

        if let Some(sink) = &self.audit {
            if let Err(e) = sink.append(&record) {
                metrics::record_audit_failure();
                tracing::warn!(error = %e, client = %record.client_ip, "Audit record not written");
            }
        }

        self.stats.record(&decision);
        metrics::record_decision(&decision);
        (decision, record)
    }
}

/// Run `decide`, converting a panic into an internal-fault block.
pub(crate) fn fail_closed(decide: impl FnOnce() -> Decision) -> Decision {
    match catch_unwind(AssertUnwindSafe(decide)) {
        Ok(decision) => decision,
        Err(_) => {
            tracing::error!("Inspection faulted; blocking request");
            Decision::Block(BlockReason::Internal)
        }
    }
}
