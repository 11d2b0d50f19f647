//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the gate.
//!
//! # Metrics
//!
//! - `gate_transfers_allowed_total` - Transfers that passed every check
//! - `gate_transfers_rejected_total{reason}` - Rejected transfers by error reason
//! - `gate_quota_gated_transfers_total` - Transfers charged against quota
//! - `gate_snapshots_recorded_total` - Initial balances captured
//! - `gate_admin_operations_total{operation}` - Applied administrative operations

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Counters live in a private registry, so several gates can coexist in one
/// process.
#[derive(Clone)]
pub struct GateMetrics {
    /// Allowed transfers
    pub transfers_allowed: IntCounter,

    /// Rejected transfers, labelled by reason
    pub transfers_rejected: IntCounterVec,

    /// Transfers charged against quota
    pub quota_gated: IntCounter,

    /// Initial balances recorded
    pub snapshots_recorded: IntCounter,

    /// Administrative operations, labelled by operation
    pub admin_operations: IntCounterVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl GateMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transfers_allowed = IntCounter::new(
            "gate_transfers_allowed_total",
            "Transfers that passed every check",
        )?;
        registry.register(Box::new(transfers_allowed.clone()))?;

        let transfers_rejected = IntCounterVec::new(
            Opts::new(
                "gate_transfers_rejected_total",
                "Rejected transfers by error reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(transfers_rejected.clone()))?;

        let quota_gated = IntCounter::new(
            "gate_quota_gated_transfers_total",
            "Transfers charged against quota",
        )?;
        registry.register(Box::new(quota_gated.clone()))?;

        let snapshots_recorded = IntCounter::new(
            "gate_snapshots_recorded_total",
            "Initial balances captured",
        )?;
        registry.register(Box::new(snapshots_recorded.clone()))?;

        let admin_operations = IntCounterVec::new(
            Opts::new(
                "gate_admin_operations_total",
                "Applied administrative operations",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(admin_operations.clone()))?;

        Ok(Self {
            transfers_allowed,
            transfers_rejected,
            quota_gated,
            snapshots_recorded,
            admin_operations,
            registry,
        })
    }

    /// Record an allowed transfer
    pub fn record_allowed(&self, quota_gated: bool) {
        self.transfers_allowed.inc();
        if quota_gated {
            self.quota_gated.inc();
        }
    }

    /// Record a rejected transfer
    pub fn record_rejected(&self, reason: &str) {
        self.transfers_rejected.with_label_values(&[reason]).inc();
    }

    /// Record newly captured snapshots
    pub fn record_snapshots(&self, count: usize) {
        self.snapshots_recorded.inc_by(count as u64);
    }

    /// Record an administrative operation
    pub fn record_admin(&self, operation: &str) {
        self.admin_operations.with_label_values(&[operation]).inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for GateMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateMetrics")
            .field("transfers_allowed", &self.transfers_allowed.get())
            .field("quota_gated", &self.quota_gated.get())
            .field("snapshots_recorded", &self.snapshots_recorded.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = GateMetrics::new().unwrap();
        assert_eq!(metrics.transfers_allowed.get(), 0);
        assert_eq!(metrics.quota_gated.get(), 0);
    }

    #[test]
    fn test_two_collectors_coexist() {
        let first = GateMetrics::new().unwrap();
        let second = GateMetrics::new().unwrap();
        first.record_allowed(false);
        assert_eq!(first.transfers_allowed.get(), 1);
        assert_eq!(second.transfers_allowed.get(), 0);
    }

    #[test]
    fn test_record_rejected_by_reason() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_rejected("quota_exceeded");
        metrics.record_rejected("quota_exceeded");
        metrics.record_rejected("account_locked");

        assert_eq!(
            metrics
                .transfers_rejected
                .with_label_values(&["quota_exceeded"])
                .get(),
            2
        );
        assert_eq!(
            metrics
                .transfers_rejected
                .with_label_values(&["account_locked"])
                .get(),
            1
        );
    }

    #[test]
    fn test_record_allowed_quota_gated() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_allowed(true);
        metrics.record_allowed(false);
        assert_eq!(metrics.transfers_allowed.get(), 2);
        assert_eq!(metrics.quota_gated.get(), 1);
    }

    #[test]
    fn test_registry_gathers_families() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_snapshots(3);
        metrics.record_admin("set_global_lock");
        let families = metrics.registry().gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "gate_snapshots_recorded_total"));
    }
}
