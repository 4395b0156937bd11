use crate::domain::events::{CounterUpdate, DebtCapacityEvent, OutboundMessage, StatusChangeEvent};
use crate::domain::ports::EventPublisher;
use crate::error::Result;
use async_trait::async_trait;
use std::io::Write;
use tokio::sync::Mutex;
use tracing::debug;

/// Publishes each outbound message as one JSON line:
/// `{"queue":"statusChange","payload":{...}}`.
pub struct JsonLinesPublisher<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn publish(&self, message: OutboundMessage) -> Result<()> {
        let mut writer = self.writer.lock().await;
        serde_json::to_writer(&mut *writer, &message)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        debug!(queue = queue_name(&message), "message published");
        Ok(())
    }
}

fn queue_name(message: &OutboundMessage) -> &'static str {
    match message {
        OutboundMessage::StatusChange(_) => "statusChange",
        OutboundMessage::DebtCapacity(_) => "debtCapacity",
        OutboundMessage::CounterUpdate(_) => "counterUpdate",
    }
}

#[async_trait]
impl<W: Write + Send> EventPublisher for JsonLinesPublisher<W> {
    async fn publish_status_change(&self, event: StatusChangeEvent) -> Result<()> {
        self.publish(OutboundMessage::StatusChange(event)).await
    }

    async fn publish_debt_capacity(&self, event: DebtCapacityEvent) -> Result<()> {
        self.publish(OutboundMessage::DebtCapacity(event)).await
    }

    async fn publish_counter_update(&self, update: CounterUpdate) -> Result<()> {
        self.publish(OutboundMessage::CounterUpdate(update)).await
    }
}
