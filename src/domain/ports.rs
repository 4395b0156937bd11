use super::events::{CounterUpdate, DebtCapacityEvent, StatusChangeEvent};
use super::listing::{AdminListRow, Page};
use super::loan::{LoanRequest, LoanType, LoanTypeId, RequestId};
use super::profile::UserProfile;
use super::status::Status;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;

#[async_trait]
pub trait LoanTypeStore: Send + Sync {
    async fn find_by_id(&self, id: LoanTypeId) -> Result<Option<LoanType>>;
}

/// Projection of an approved request used to build debt maps. Either field
/// may be missing on partially-populated records.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedDebt {
    pub id: Option<RequestId>,
    pub monthly_debt: Option<Decimal>,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persists the request in one write, assigning an id on first insert.
    async fn save(&self, request: LoanRequest) -> Result<LoanRequest>;
    async fn find_by_id(&self, id: RequestId) -> Result<Option<LoanRequest>>;
    /// Sum of the stored monthly debt of every request for `email`; zero if none.
    async fn sum_monthly_debt_by_email(&self, email: &str) -> Result<Decimal>;
    /// An empty `statuses` set matches every status.
    async fn find_page(
        &self,
        statuses: &BTreeSet<Status>,
        page: usize,
        size: usize,
    ) -> Result<Page<AdminListRow>>;
    async fn find_approved_by_email(&self, email: &str) -> Result<Vec<ApprovedDebt>>;
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Whether `document_number` identifies the holder of `email`.
    async fn exists(&self, document_number: &str, email: &str) -> Result<bool>;
    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_status_change(&self, event: StatusChangeEvent) -> Result<()>;
    async fn publish_debt_capacity(&self, event: DebtCapacityEvent) -> Result<()>;
    async fn publish_counter_update(&self, update: CounterUpdate) -> Result<()>;
}

pub type LoanTypeStoreRef = Arc<dyn LoanTypeStore>;
pub type RequestStoreRef = Arc<dyn RequestStore>;
pub type IdentityDirectoryRef = Arc<dyn IdentityDirectory>;
pub type EventPublisherRef = Arc<dyn EventPublisher>;
