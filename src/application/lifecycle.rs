use crate::config::LifecycleConfig;
use crate::domain::events::{DebtCapacityEvent, DebtMap, StatusChangeEvent};
use crate::domain::finance;
use crate::domain::listing::{AdminListRow, Page};
use crate::domain::loan::{LoanApplication, LoanRequest, LoanType, LoanTypeId, RequestId};
use crate::domain::ports::{
    EventPublisherRef, IdentityDirectoryRef, LoanTypeStoreRef, RequestStoreRef,
};
use crate::domain::profile::UserProfile;
use crate::domain::status::Status;
use crate::error::{LoanError, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{info, warn};

/// Whether a status transition publishes its own `StatusChangeEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDispatch {
    /// Publish right after the write; a publish failure fails the call.
    Inline,
    /// Leave publishing to the caller.
    Caller,
}

/// Creation, status transition and administrative listing of loan requests.
///
/// Every operation is a sequential pipeline over the collaborator ports; the
/// service keeps no mutable state of its own.
pub struct RequestLifecycleService {
    loan_types: LoanTypeStoreRef,
    requests: RequestStoreRef,
    identity: IdentityDirectoryRef,
    publisher: EventPublisherRef,
    config: LifecycleConfig,
}

impl RequestLifecycleService {
    pub fn new(
        loan_types: LoanTypeStoreRef,
        requests: RequestStoreRef,
        identity: IdentityDirectoryRef,
        publisher: EventPublisherRef,
    ) -> Self {
        Self::with_config(
            loan_types,
            requests,
            identity,
            publisher,
            LifecycleConfig::default(),
        )
    }

    pub fn with_config(
        loan_types: LoanTypeStoreRef,
        requests: RequestStoreRef,
        identity: IdentityDirectoryRef,
        publisher: EventPublisherRef,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            loan_types,
            requests,
            identity,
            publisher,
            config,
        }
    }

    /// Validates and persists a new `Pending` request.
    ///
    /// For loan types with automatic validation a `DebtCapacityEvent` is
    /// published afterwards. That evaluation never fails the call: its errors
    /// are logged and the persisted request is returned regardless.
    pub async fn create_request(&self, application: LoanApplication) -> Result<LoanRequest> {
        let loan_type = self.loan_type(application.loan_type_id).await?;
        loan_type.check_amount(application.amount)?;

        if !self
            .identity
            .exists(&application.document_number, &application.email)
            .await?
        {
            return Err(LoanError::IdentityNotFound {
                document_number: application.document_number,
                email: application.email,
            });
        }

        let saved = self
            .requests
            .save(LoanRequest::pending(&application))
            .await?;
        info!(request_id = ?saved.id, email = %saved.email, amount = %saved.amount, "loan request created");

        if loan_type.automatic_validation
            && let Err(err) = self.publish_debt_capacity(&loan_type, &saved).await
        {
            warn!(
                request_id = ?saved.id,
                email = %saved.email,
                error = %err,
                "debt capacity evaluation failed; request kept"
            );
        }

        Ok(saved)
    }

    async fn publish_debt_capacity(&self, loan_type: &LoanType, request: &LoanRequest) -> Result<()> {
        let request_id = persisted_id(request)?;
        let profile = self
            .identity
            .get_profile(&request.email)
            .await?
            .ok_or_else(|| LoanError::ProfileNotFound(request.email.clone()))?;
        let current_debt = self
            .requests
            .sum_monthly_debt_by_email(&request.email)
            .await?;

        let rate = finance::annual_to_periodic(loan_type.interest_rate, true)?;
        let prospective = finance::monthly_payment(request.amount, Some(rate), request.term_months)?;
        let capacity = finance::available_capacity(
            profile.base_salary,
            self.config.debt_capacity_ratio,
            current_debt,
        );

        let event = DebtCapacityEvent {
            request_id,
            applicant_email: request.email.clone(),
            timestamp: Utc::now(),
            principal: request.amount,
            base_salary: profile.base_salary,
            prospective_monthly_payment: prospective,
            available_capacity: capacity,
        };
        self.publisher.publish_debt_capacity(event).await?;
        info!(%request_id, %prospective, %capacity, "debt capacity published");
        Ok(())
    }

    /// Moves a `Pending` request to `Approved` or `Rejected`.
    ///
    /// Approval stamps the monthly debt before the single write. With
    /// [`EventDispatch::Inline`] a status-change event follows the write and
    /// its failure is returned to the caller; the write is not undone.
    pub async fn update_status(
        &self,
        request_id: RequestId,
        target: Status,
        dispatch: EventDispatch,
    ) -> Result<LoanRequest> {
        target.ensure_target()?;

        let mut request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(LoanError::RequestNotFound(request_id))?;
        let previous = request.status;
        request.status = previous.transition_to(target)?;

        if request.status == Status::Approved {
            let loan_type = self.loan_type(request.loan_type_id).await?;
            let rate = finance::annual_to_periodic(loan_type.interest_rate, true)?;
            request.monthly_debt = Some(finance::monthly_payment(
                request.amount,
                Some(rate),
                request.term_months,
            )?);
        }

        let saved = self.requests.save(request).await?;
        info!(%request_id, from = ?previous, to = ?saved.status, "loan request status changed");

        if dispatch == EventDispatch::Inline {
            let debt_map = match (saved.status, saved.monthly_debt) {
                (Status::Approved, Some(debt)) => Some(DebtMap::from([(request_id, debt)])),
                _ => None,
            };
            let event = StatusChangeEvent::new(request_id, previous, saved.status, &saved.email)
                .with_debt_map(debt_map);
            self.publisher.publish_status_change(event).await?;
        }

        Ok(saved)
    }

    /// Returns one page of requests in `statuses`, enriched with applicant
    /// names and salaries.
    ///
    /// Each distinct email is looked up once, with at most
    /// `enrichment_concurrency` lookups in flight. A failed lookup leaves the
    /// affected rows unenriched.
    pub async fn get_list_by_status(
        &self,
        statuses: &BTreeSet<Status>,
        page: usize,
        size: usize,
    ) -> Result<Page<AdminListRow>> {
        let mut page = self.requests.find_page(statuses, page, size).await?;
        let profiles = self.profiles_by_email(&page.content).await;

        for row in &mut page.content {
            let Some(profile) = profiles.get(&row.email) else {
                continue;
            };
            row.apply_profile(profile);
            if row.status == Status::Approved && row.monthly_debt.is_none() {
                let rate = row
                    .interest_rate
                    .map(|annual| finance::annual_to_periodic(annual, true))
                    .transpose()?;
                row.monthly_debt = Some(finance::monthly_payment(row.amount, rate, row.term_months)?);
            }
        }

        Ok(page)
    }

    async fn profiles_by_email(&self, rows: &[AdminListRow]) -> HashMap<String, UserProfile> {
        let mut seen = HashSet::new();
        let emails: Vec<&str> = rows
            .iter()
            .map(|row| row.email.as_str())
            .filter(|email| seen.insert(*email))
            .collect();

        stream::iter(emails)
            .map(|email| async move {
                match self.identity.get_profile(email).await {
                    Ok(profile) => profile.map(|p| (email.to_string(), p)),
                    Err(err) => {
                        warn!(%email, error = %err, "profile lookup failed; rows left unenriched");
                        None
                    }
                }
            })
            .buffer_unordered(self.config.enrichment_concurrency.max(1))
            .filter_map(|entry| async move { entry })
            .collect()
            .await
    }

    async fn loan_type(&self, id: LoanTypeId) -> Result<LoanType> {
        self.loan_types
            .find_by_id(id)
            .await?
            .ok_or(LoanError::LoanTypeNotFound(id))
    }
}

pub(crate) fn persisted_id(request: &LoanRequest) -> Result<RequestId> {
    request
        .id
        .ok_or_else(|| LoanError::upstream("request store returned a request without an id"))
}
