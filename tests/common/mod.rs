#![allow(dead_code)]

use async_trait::async_trait;
use loanflow::domain::events::{CounterUpdate, DebtCapacityEvent, StatusChangeEvent};
use loanflow::domain::listing::{AdminListRow, Page};
use loanflow::domain::loan::{LoanApplication, LoanRequest, LoanType, RequestId};
use loanflow::domain::ports::{
    ApprovedDebt, EventPublisher, IdentityDirectory, RequestStore,
};
use loanflow::domain::profile::UserProfile;
use loanflow::domain::status::Status;
use loanflow::error::{LoanError, Result};
use loanflow::infrastructure::in_memory::{
    InMemoryEventPublisher, InMemoryIdentityDirectory, InMemoryRequestStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeSet, HashMap};
use std::io::Error;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn personal_loan(automatic_validation: bool) -> LoanType {
    LoanType {
        id: 1,
        name: "Personal".to_string(),
        minimum_amount: Some(dec!(500)),
        maximum_amount: Some(dec!(50000)),
        interest_rate: dec!(0.12),
        automatic_validation,
    }
}

pub fn profile(index: usize) -> UserProfile {
    UserProfile {
        name: Some(format!("Client{index}")),
        surname: Some("Test".to_string()),
        base_salary: dec!(3000) + Decimal::from(index),
        document_number: format!("DOC{index}"),
        email: email(index),
    }
}

pub fn email(index: usize) -> String {
    format!("client{index}@example.com")
}

pub fn application(index: usize, amount: Decimal) -> LoanApplication {
    LoanApplication {
        document_number: format!("DOC{index}"),
        email: email(index),
        amount,
        term_months: 12,
        loan_type_id: 1,
    }
}

/// Publisher whose every call fails.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish_status_change(&self, _event: StatusChangeEvent) -> Result<()> {
        Err(LoanError::upstream("status queue unavailable"))
    }

    async fn publish_debt_capacity(&self, _event: DebtCapacityEvent) -> Result<()> {
        Err(LoanError::upstream("debt capacity queue unavailable"))
    }

    async fn publish_counter_update(&self, _update: CounterUpdate) -> Result<()> {
        Err(LoanError::upstream("counter queue unavailable"))
    }
}

/// Records like [`InMemoryEventPublisher`] but refuses counter updates.
#[derive(Clone, Default)]
pub struct CounterFailingPublisher {
    pub recorded: InMemoryEventPublisher,
}

#[async_trait]
impl EventPublisher for CounterFailingPublisher {
    async fn publish_status_change(&self, event: StatusChangeEvent) -> Result<()> {
        self.recorded.publish_status_change(event).await
    }

    async fn publish_debt_capacity(&self, event: DebtCapacityEvent) -> Result<()> {
        self.recorded.publish_debt_capacity(event).await
    }

    async fn publish_counter_update(&self, _update: CounterUpdate) -> Result<()> {
        Err(LoanError::upstream("counter queue unavailable"))
    }
}

/// Identity directory that sleeps on every profile lookup and tracks how
/// many lookups run at once.
#[derive(Default)]
pub struct SlowIdentityDirectory {
    inner: InMemoryIdentityDirectory,
    failing_emails: BTreeSet<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<HashMap<String, usize>>,
}

impl SlowIdentityDirectory {
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            inner: InMemoryIdentityDirectory::with_profiles(profiles),
            ..Self::default()
        }
    }

    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing_emails.insert(email.to_string());
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityDirectory for SlowIdentityDirectory {
    async fn exists(&self, document_number: &str, email: &str) -> Result<bool> {
        self.inner.exists(document_number, email).await
    }

    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_default() += 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing_emails.contains(email) {
            return Err(LoanError::upstream("directory timeout"));
        }
        self.inner.get_profile(email).await
    }
}

/// Request store whose approved-sibling query returns a fixed answer.
#[derive(Clone)]
pub struct FixedApprovedStore {
    pub inner: InMemoryRequestStore,
    pub approved: Arc<Vec<ApprovedDebt>>,
}

#[async_trait]
impl RequestStore for FixedApprovedStore {
    async fn save(&self, request: LoanRequest) -> Result<LoanRequest> {
        self.inner.save(request).await
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<LoanRequest>> {
        self.inner.find_by_id(id).await
    }

    async fn sum_monthly_debt_by_email(&self, email: &str) -> Result<Decimal> {
        self.inner.sum_monthly_debt_by_email(email).await
    }

    async fn find_page(
        &self,
        statuses: &BTreeSet<Status>,
        page: usize,
        size: usize,
    ) -> Result<Page<AdminListRow>> {
        self.inner.find_page(statuses, page, size).await
    }

    async fn find_approved_by_email(&self, _email: &str) -> Result<Vec<ApprovedDebt>> {
        Ok(self.approved.as_ref().clone())
    }
}

pub fn write_loan_types_csv(path: &Path, loan_types: &[LoanType]) -> std::result::Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record([
        "id",
        "name",
        "minimum_amount",
        "maximum_amount",
        "interest_rate",
        "automatic_validation",
    ])?;
    for lt in loan_types {
        let bound = |value: Option<Decimal>| value.map(|v| v.to_string()).unwrap_or_default();
        wtr.write_record([
            lt.id.to_string(),
            lt.name.clone(),
            bound(lt.minimum_amount),
            bound(lt.maximum_amount),
            lt.interest_rate.to_string(),
            lt.automatic_validation.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_profiles_csv(path: &Path, profiles: &[UserProfile]) -> std::result::Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["name", "surname", "base_salary", "document_number", "email"])?;
    for p in profiles {
        wtr.write_record([
            p.name.clone().unwrap_or_default(),
            p.surname.clone().unwrap_or_default(),
            p.base_salary.to_string(),
            p.document_number.clone(),
            p.email.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
