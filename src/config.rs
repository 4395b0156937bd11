use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tunables for the lifecycle services.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfig {
    /// Share of base salary an applicant may commit to monthly debt.
    pub debt_capacity_ratio: Decimal,
    /// Maximum identity lookups in flight while enriching a listing page.
    pub enrichment_concurrency: usize,
    /// Key of the counter incremented when a request is approved.
    pub counter_key: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            debt_capacity_ratio: dec!(0.35),
            enrichment_concurrency: 8,
            counter_key: "approvedLoans".to_string(),
        }
    }
}
