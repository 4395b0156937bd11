use crate::domain::loan::LoanApplication;
use crate::domain::status::Status;
use crate::error::{LoanError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::BufRead;

fn default_page_size() -> usize {
    20
}

/// One line of the commands file.
///
/// Requests are referenced either by the alias given at creation or by
/// their UUID.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Create {
        #[serde(default)]
        alias: Option<String>,
        #[serde(flatten)]
        application: LoanApplication,
    },
    UpdateStatus {
        request: String,
        /// Status id: `2` approves, `3` rejects.
        status_id: u8,
    },
    List {
        /// Status ids to include; empty lists every status.
        #[serde(default)]
        statuses: Vec<u8>,
        #[serde(default)]
        page: usize,
        #[serde(default = "default_page_size")]
        size: usize,
    },
    /// A status change reported by an external reviewer, with statuses as id text.
    StatusChanged {
        request: String,
        new_status: String,
        #[serde(default)]
        previous_status: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Maps numeric status ids onto a status set.
pub fn status_set(ids: &[u8]) -> Result<BTreeSet<Status>> {
    ids.iter()
        .map(|&id| {
            Status::from_id(id).ok_or_else(|| LoanError::InvalidStatus(format!("unknown status id {id}")))
        })
        .collect()
}

/// Reads commands from a JSON-lines source, one command per non-blank line.
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Lazily parses commands. A malformed line yields an error and reading
    /// continues with the next one.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.source.lines().filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(serde_json::from_str(&line).map_err(LoanError::from)),
            Err(err) => Some(Err(LoanError::from(err))),
        })
    }
}
