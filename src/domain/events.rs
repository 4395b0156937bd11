//! Outbound message payloads and the inbound status-change notification.

use super::loan::RequestId;
use super::status::Status;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Approved request id to its monthly installment.
pub type DebtMap = BTreeMap<RequestId, Decimal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    pub request_id: RequestId,
    pub previous_status: String,
    pub new_status: String,
    pub applicant_email: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_map: Option<DebtMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusChangeEvent {
    pub fn new(
        request_id: RequestId,
        previous: Status,
        current: Status,
        applicant_email: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            previous_status: previous.description().to_string(),
            new_status: current.description().to_string(),
            applicant_email: applicant_email.into(),
            timestamp: Utc::now(),
            debt_map: None,
            reason: None,
        }
    }

    pub fn with_debt_map(mut self, debt_map: Option<DebtMap>) -> Self {
        self.debt_map = debt_map;
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtCapacityEvent {
    pub request_id: RequestId,
    pub applicant_email: String,
    pub timestamp: DateTime<Utc>,
    pub principal: Decimal,
    pub base_salary: Decimal,
    pub prospective_monthly_payment: Decimal,
    pub available_capacity: Decimal,
}

/// Increment for an aggregate counter kept by a downstream consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdate {
    #[serde(rename = "pk")]
    pub key: String,
    /// Decimal amount rendered as text, scale preserved.
    #[serde(rename = "totalAmountLoans")]
    pub amount: String,
}

impl CounterUpdate {
    pub fn new(key: impl Into<String>, amount: Decimal) -> Self {
        Self {
            key: key.into(),
            amount: amount.to_string(),
        }
    }
}

/// Any message the lifecycle emits, tagged with the queue it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "queue", content = "payload", rename_all = "camelCase")]
pub enum OutboundMessage {
    StatusChange(StatusChangeEvent),
    DebtCapacity(DebtCapacityEvent),
    CounterUpdate(CounterUpdate),
}

/// Status change reported from outside the service boundary.
///
/// Statuses travel as their numeric id text (`"1"`, `"2"`, `"3"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeNotification {
    pub request_id: RequestId,
    #[serde(default)]
    pub previous_status: Option<String>,
    pub new_status: String,
    #[serde(default)]
    pub applicant_email: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_counter_update_wire_shape() {
        let update = CounterUpdate::new("approvedLoans", dec!(10000.00));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pk": "approvedLoans", "totalAmountLoans": "10000.00"})
        );
    }

    #[test]
    fn test_status_change_omits_absent_debt_map() {
        let event = StatusChangeEvent::new(
            Uuid::new_v4(),
            Status::Pending,
            Status::Rejected,
            "ana@example.com",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["previousStatus"], "Pending review");
        assert_eq!(json["newStatus"], "Rejected");
        assert!(json.get("debtMap").is_none());
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_outbound_message_is_tagged_by_queue() {
        let message = OutboundMessage::CounterUpdate(CounterUpdate::new("approvedLoans", dec!(5)));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["queue"], "counterUpdate");
        assert_eq!(json["payload"]["pk"], "approvedLoans");
    }

    #[test]
    fn test_notification_parses_minimal_message() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"requestId":"{id}","newStatus":"2","reason":"ok"}}"#);
        let notification: StatusChangeNotification = serde_json::from_str(&raw).unwrap();
        assert_eq!(notification.request_id, id);
        assert_eq!(notification.new_status, "2");
        assert_eq!(notification.previous_status, None);
        assert_eq!(notification.reason.as_deref(), Some("ok"));
    }
}
