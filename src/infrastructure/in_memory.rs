use crate::domain::events::{CounterUpdate, DebtCapacityEvent, OutboundMessage, StatusChangeEvent};
use crate::domain::listing::{AdminListRow, Page};
use crate::domain::loan::{LoanRequest, LoanType, LoanTypeId, RequestId};
use crate::domain::ports::{
    ApprovedDebt, EventPublisher, IdentityDirectory, LoanTypeStore, RequestStore,
};
use crate::domain::profile::UserProfile;
use crate::domain::status::Status;
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// A thread-safe in-memory catalog of loan types.
///
/// Clones share the same underlying map.
#[derive(Default, Clone)]
pub struct InMemoryLoanTypeStore {
    loan_types: Arc<RwLock<HashMap<LoanTypeId, LoanType>>>,
}

impl InMemoryLoanTypeStore {
    /// Creates a new, empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loan_types(loan_types: impl IntoIterator<Item = LoanType>) -> Self {
        let map = loan_types.into_iter().map(|lt| (lt.id, lt)).collect();
        Self {
            loan_types: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, loan_type: LoanType) {
        self.loan_types.write().await.insert(loan_type.id, loan_type);
    }

    async fn interest_rates(&self) -> HashMap<LoanTypeId, Decimal> {
        self.loan_types
            .read()
            .await
            .values()
            .map(|lt| (lt.id, lt.interest_rate))
            .collect()
    }
}

#[async_trait]
impl LoanTypeStore for InMemoryLoanTypeStore {
    async fn find_by_id(&self, id: LoanTypeId) -> Result<Option<LoanType>> {
        Ok(self.loan_types.read().await.get(&id).cloned())
    }
}

/// A thread-safe in-memory request store that keeps insertion order.
///
/// Listing rows are joined with the interest rate of the shared
/// [`InMemoryLoanTypeStore`].
#[derive(Clone)]
pub struct InMemoryRequestStore {
    requests: Arc<RwLock<Vec<LoanRequest>>>,
    loan_types: InMemoryLoanTypeStore,
}

impl InMemoryRequestStore {
    pub fn new(loan_types: InMemoryLoanTypeStore) -> Self {
        Self {
            requests: Arc::default(),
            loan_types,
        }
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn save(&self, mut request: LoanRequest) -> Result<LoanRequest> {
        let mut requests = self.requests.write().await;
        match request.id {
            Some(id) => match requests.iter_mut().find(|r| r.id == Some(id)) {
                Some(slot) => *slot = request.clone(),
                None => requests.push(request.clone()),
            },
            None => {
                request.id = Some(Uuid::new_v4());
                requests.push(request.clone());
            }
        }
        Ok(request)
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<LoanRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == Some(id)).cloned())
    }

    async fn sum_monthly_debt_by_email(&self, email: &str) -> Result<Decimal> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .filter(|r| r.email == email)
            .filter_map(|r| r.monthly_debt)
            .sum())
    }

    async fn find_page(
        &self,
        statuses: &BTreeSet<Status>,
        page: usize,
        size: usize,
    ) -> Result<Page<AdminListRow>> {
        let size = size.max(1);
        let (matching, total) = {
            let requests = self.requests.read().await;
            let matching: Vec<LoanRequest> = requests
                .iter()
                .filter(|r| statuses.is_empty() || statuses.contains(&r.status))
                .cloned()
                .collect();
            let total = matching.len() as u64;
            (matching, total)
        };
        let rates = self.loan_types.interest_rates().await;

        let rows = matching
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .map(|r| to_row(r, &rates))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(rows, page, size, total))
    }

    async fn find_approved_by_email(&self, email: &str) -> Result<Vec<ApprovedDebt>> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .filter(|r| r.email == email && r.status == Status::Approved)
            .map(|r| ApprovedDebt {
                id: r.id,
                monthly_debt: r.monthly_debt,
            })
            .collect())
    }
}

pub(crate) fn to_row(
    request: LoanRequest,
    rates: &HashMap<LoanTypeId, Decimal>,
) -> Result<AdminListRow> {
    let id = request
        .id
        .ok_or_else(|| LoanError::upstream("stored request without an id"))?;
    Ok(AdminListRow {
        id,
        amount: request.amount,
        term_months: request.term_months,
        interest_rate: rates.get(&request.loan_type_id).copied(),
        email: request.email,
        status: request.status,
        loan_type_id: request.loan_type_id,
        client_name: None,
        base_salary: None,
        monthly_debt: request.monthly_debt,
    })
}

/// In-memory identity directory keyed by email.
#[derive(Default, Clone)]
pub struct InMemoryIdentityDirectory {
    profiles: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|p| (normalize(&p.email), p))
            .collect();
        Self {
            profiles: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.profiles
            .write()
            .await
            .insert(normalize(&profile.email), profile);
    }
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    /// A document number registered to a different email is refused outright.
    async fn exists(&self, document_number: &str, email: &str) -> Result<bool> {
        let profiles = self.profiles.read().await;
        let document = normalize(document_number);
        let Some(holder) = profiles
            .values()
            .find(|p| normalize(&p.document_number) == document)
        else {
            return Ok(false);
        };
        if normalize(&holder.email) == normalize(email) {
            Ok(true)
        } else {
            Err(LoanError::Forbidden(format!(
                "document {document_number} does not belong to {email}"
            )))
        }
    }

    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&normalize(email)).cloned())
    }
}

/// Publisher that records every message in publish order.
#[derive(Default, Clone)]
pub struct InMemoryEventPublisher {
    messages: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish_status_change(&self, event: StatusChangeEvent) -> Result<()> {
        self.messages
            .lock()
            .await
            .push(OutboundMessage::StatusChange(event));
        Ok(())
    }

    async fn publish_debt_capacity(&self, event: DebtCapacityEvent) -> Result<()> {
        self.messages
            .lock()
            .await
            .push(OutboundMessage::DebtCapacity(event));
        Ok(())
    }

    async fn publish_counter_update(&self, update: CounterUpdate) -> Result<()> {
        self.messages
            .lock()
            .await
            .push(OutboundMessage::CounterUpdate(update));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(email: &str, status: Status, monthly_debt: Option<Decimal>) -> LoanRequest {
        LoanRequest {
            id: None,
            amount: dec!(1000),
            term_months: 12,
            email: email.to_string(),
            status,
            loan_type_id: 1,
            monthly_debt,
        }
    }

    fn store() -> InMemoryRequestStore {
        InMemoryRequestStore::new(InMemoryLoanTypeStore::with_loan_types([LoanType {
            id: 1,
            name: "Personal".to_string(),
            minimum_amount: None,
            maximum_amount: None,
            interest_rate: dec!(0.12),
            automatic_validation: false,
        }]))
    }

    #[tokio::test]
    async fn test_save_assigns_id_once() {
        let store = store();
        let saved = store
            .save(request("a@x.io", Status::Pending, None))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        let mut updated = saved.clone();
        updated.status = Status::Rejected;
        let resaved = store.save(updated).await.unwrap();

        assert_eq!(resaved.id, Some(id));
        let page = store.find_page(&BTreeSet::new(), 0, 10).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].status, Status::Rejected);
    }

    #[tokio::test]
    async fn test_sum_monthly_debt_by_email() {
        let store = store();
        store
            .save(request("a@x.io", Status::Approved, Some(dec!(100.50))))
            .await
            .unwrap();
        store
            .save(request("a@x.io", Status::Approved, Some(dec!(49.50))))
            .await
            .unwrap();
        store
            .save(request("a@x.io", Status::Pending, None))
            .await
            .unwrap();
        store
            .save(request("b@x.io", Status::Approved, Some(dec!(999))))
            .await
            .unwrap();

        assert_eq!(store.sum_monthly_debt_by_email("a@x.io").await.unwrap(), dec!(150.00));
        assert_eq!(
            store.sum_monthly_debt_by_email("nobody@x.io").await.unwrap(),
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_find_page_filters_and_paginates() {
        let store = store();
        for i in 0..5 {
            let status = if i % 2 == 0 {
                Status::Pending
            } else {
                Status::Rejected
            };
            store.save(request("a@x.io", status, None)).await.unwrap();
        }

        let pending = BTreeSet::from([Status::Pending]);
        let first = store.find_page(&pending, 0, 2).await.unwrap();
        assert_eq!(first.content.len(), 2);
        assert_eq!(first.total_elements, 3);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.content[0].interest_rate, Some(dec!(0.12)));

        let second = store.find_page(&pending, 1, 2).await.unwrap();
        assert_eq!(second.content.len(), 1);

        let beyond = store.find_page(&pending, 9, 2).await.unwrap();
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 3);

        let clamped = store.find_page(&BTreeSet::new(), 0, 0).await.unwrap();
        assert_eq!(clamped.size, 1);
        assert_eq!(clamped.total_pages, 5);
    }

    #[tokio::test]
    async fn test_find_approved_by_email() {
        let store = store();
        let approved = store
            .save(request("a@x.io", Status::Approved, Some(dec!(10))))
            .await
            .unwrap();
        store
            .save(request("a@x.io", Status::Rejected, None))
            .await
            .unwrap();

        let found = store.find_approved_by_email("a@x.io").await.unwrap();
        assert_eq!(
            found,
            vec![ApprovedDebt {
                id: approved.id,
                monthly_debt: Some(dec!(10)),
            }]
        );
    }

    #[tokio::test]
    async fn test_identity_directory_checks_document_holder() {
        let directory = InMemoryIdentityDirectory::with_profiles([UserProfile {
            name: Some("Ana".to_string()),
            surname: Some("Ruiz".to_string()),
            base_salary: dec!(4000),
            document_number: "123 456".to_string(),
            email: "Ana@Example.com".to_string(),
        }]);

        assert!(directory.exists("123456", "ana@example.com").await.unwrap());
        assert!(!directory.exists("999", "ana@example.com").await.unwrap());
        assert!(matches!(
            directory.exists("123456", "eve@example.com").await,
            Err(LoanError::Forbidden(_))
        ));
        assert!(directory
            .get_profile("ana@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(directory.get_profile("eve@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publisher_records_in_order() {
        let publisher = InMemoryEventPublisher::new();
        publisher
            .publish_counter_update(CounterUpdate::new("approvedLoans", dec!(1)))
            .await
            .unwrap();
        publisher
            .publish_counter_update(CounterUpdate::new("approvedLoans", dec!(2)))
            .await
            .unwrap();

        let amounts: Vec<String> = publisher
            .messages()
            .await
            .into_iter()
            .filter_map(|m| match m {
                OutboundMessage::CounterUpdate(update) => Some(update.amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec!["1", "2"]);
    }
}
