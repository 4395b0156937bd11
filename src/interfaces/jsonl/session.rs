use super::command_reader::{Command, status_set};
use crate::application::events::RequestEventService;
use crate::application::lifecycle::{EventDispatch, RequestLifecycleService};
use crate::domain::events::StatusChangeNotification;
use crate::domain::listing::{AdminListRow, Page};
use crate::domain::loan::{LoanRequest, RequestId};
use crate::domain::status::Status;
use crate::error::{LoanError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Result of one executed command, written to stdout as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CommandOutcome {
    Created {
        #[serde(skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        request: LoanRequest,
    },
    StatusUpdated {
        request: LoanRequest,
    },
    Page {
        page: Page<AdminListRow>,
    },
    StatusChangeApplied {
        request_id: RequestId,
    },
}

/// Runs commands against the lifecycle services and remembers the aliases
/// given at creation.
pub struct CommandSession {
    lifecycle: Arc<RequestLifecycleService>,
    events: RequestEventService,
    aliases: HashMap<String, RequestId>,
}

impl CommandSession {
    pub fn new(lifecycle: Arc<RequestLifecycleService>, events: RequestEventService) -> Self {
        Self {
            lifecycle,
            events,
            aliases: HashMap::new(),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::Create { alias, application } => {
                let request = self.lifecycle.create_request(application).await?;
                if let (Some(alias), Some(id)) = (&alias, request.id) {
                    self.aliases.insert(alias.clone(), id);
                }
                Ok(CommandOutcome::Created { alias, request })
            }
            Command::UpdateStatus { request, status_id } => {
                let id = self.resolve(&request)?;
                let target = Status::from_id(status_id).ok_or_else(|| {
                    LoanError::InvalidStatus(format!("unknown status id {status_id}"))
                })?;
                let request = self
                    .lifecycle
                    .update_status(id, target, EventDispatch::Inline)
                    .await?;
                Ok(CommandOutcome::StatusUpdated { request })
            }
            Command::List {
                statuses,
                page,
                size,
            } => {
                let statuses = status_set(&statuses)?;
                let page = self.lifecycle.get_list_by_status(&statuses, page, size).await?;
                Ok(CommandOutcome::Page { page })
            }
            Command::StatusChanged {
                request,
                new_status,
                previous_status,
                reason,
            } => {
                let request_id = self.resolve(&request)?;
                self.events
                    .on_status_change(StatusChangeNotification {
                        request_id,
                        previous_status,
                        new_status,
                        applicant_email: None,
                        timestamp: None,
                        reason,
                    })
                    .await?;
                Ok(CommandOutcome::StatusChangeApplied { request_id })
            }
        }
    }

    /// An alias takes precedence over UUID text.
    fn resolve(&self, reference: &str) -> Result<RequestId> {
        if let Some(id) = self.aliases.get(reference) {
            return Ok(*id);
        }
        Uuid::parse_str(reference).map_err(|_| LoanError::UnknownReference(reference.to_string()))
    }
}
