use super::lifecycle::{EventDispatch, RequestLifecycleService, persisted_id};
use crate::config::LifecycleConfig;
use crate::domain::events::{CounterUpdate, DebtMap, StatusChangeEvent, StatusChangeNotification};
use crate::domain::ports::{EventPublisherRef, RequestStoreRef};
use crate::domain::status::Status;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Applies status changes reported by external systems and republishes them
/// enriched with the applicant's approved-debt snapshot.
pub struct RequestEventService {
    lifecycle: Arc<RequestLifecycleService>,
    requests: RequestStoreRef,
    publisher: EventPublisherRef,
    counter_key: String,
}

impl RequestEventService {
    pub fn new(
        lifecycle: Arc<RequestLifecycleService>,
        requests: RequestStoreRef,
        publisher: EventPublisherRef,
    ) -> Self {
        Self::with_config(lifecycle, requests, publisher, &LifecycleConfig::default())
    }

    pub fn with_config(
        lifecycle: Arc<RequestLifecycleService>,
        requests: RequestStoreRef,
        publisher: EventPublisherRef,
        config: &LifecycleConfig,
    ) -> Self {
        Self {
            lifecycle,
            requests,
            publisher,
            counter_key: config.counter_key.clone(),
        }
    }

    /// Transitions the request, then publishes the status change and, for
    /// approvals, the counter update, strictly in that order.
    ///
    /// Nothing is published when the transition fails. Publish failures are
    /// returned; the transition is already persisted at that point.
    pub async fn on_status_change(&self, notification: StatusChangeNotification) -> Result<()> {
        let target: Status = notification.new_status.parse()?;
        let saved = self
            .lifecycle
            .update_status(notification.request_id, target, EventDispatch::Caller)
            .await?;
        let request_id = persisted_id(&saved)?;

        let debt_map = match saved.status {
            Status::Approved => Some(self.approved_debt_map(&saved.email).await?),
            _ => None,
        };

        // a successful transition always leaves Pending
        let event = StatusChangeEvent::new(request_id, Status::Pending, saved.status, &saved.email)
            .with_debt_map(debt_map)
            .with_reason(notification.reason);
        self.publisher.publish_status_change(event).await?;

        if saved.status == Status::Approved {
            self.publisher
                .publish_counter_update(CounterUpdate::new(&self.counter_key, saved.amount))
                .await?;
        }

        info!(%request_id, status = ?saved.status, "external status change applied");
        Ok(())
    }

    /// Every approved request of `email` that has both an id and a monthly debt.
    async fn approved_debt_map(&self, email: &str) -> Result<DebtMap> {
        let approved = self.requests.find_approved_by_email(email).await?;
        Ok(approved
            .into_iter()
            .filter_map(|entry| Some((entry.id?, entry.monthly_debt?)))
            .collect())
    }
}
