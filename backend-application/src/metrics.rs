use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    redemption_requests: AtomicU64,
    adults_redeemed: AtomicU64,
    gate_rejections: AtomicU64,
    transaction_conflicts: AtomicU64,
    transaction_failures: AtomicU64,
    side_effect_failures: AtomicU64,
}

impl Metrics {
    pub fn record_redemption(&self, applied: u32) {
        self.redemption_requests.fetch_add(1, Ordering::Relaxed);
        self.adults_redeemed
            .fetch_add(u64::from(applied), Ordering::Relaxed);
    }

    pub fn record_gate_rejection(&self) {
        self.gate_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transaction_conflict(&self) {
        self.transaction_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transaction_failure(&self) {
        self.transaction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_side_effect_failure(&self) {
        self.side_effect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn side_effect_failures(&self) -> u64 {
        self.side_effect_failures.load(Ordering::Relaxed)
    }

    pub fn gate_rejections(&self) -> u64 {
        self.gate_rejections.load(Ordering::Relaxed)
    }

    pub fn transaction_conflicts(&self) -> u64 {
        self.transaction_conflicts.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let requests = self.redemption_requests.load(Ordering::Relaxed);
        let adults = self.adults_redeemed.load(Ordering::Relaxed);
        let rejections = self.gate_rejections.load(Ordering::Relaxed);
        let conflicts = self.transaction_conflicts.load(Ordering::Relaxed);
        let failures = self.transaction_failures.load(Ordering::Relaxed);
        let side_effects = self.side_effect_failures.load(Ordering::Relaxed);

        format!(
            "# TYPE voucher_redemption_requests_total counter\n\
voucher_redemption_requests_total {}\n\
# TYPE voucher_adults_redeemed_total counter\n\
voucher_adults_redeemed_total {}\n\
# TYPE voucher_gate_rejections_total counter\n\
voucher_gate_rejections_total {}\n\
# TYPE voucher_transaction_conflicts_total counter\n\
voucher_transaction_conflicts_total {}\n\
# TYPE voucher_transaction_failures_total counter\n\
voucher_transaction_failures_total {}\n\
# TYPE voucher_side_effect_failures_total counter\n\
voucher_side_effect_failures_total {}\n",
            requests, adults, rejections, conflicts, failures, side_effects
        )
    }
}
