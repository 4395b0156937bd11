use crate::domain::loan::{LoanTypeId, RequestId};
use crate::domain::status::Status;
use rust_decimal::Decimal;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("loan type {0} not found")]
    LoanTypeNotFound(LoanTypeId),
    #[error("loan request {0} not found")]
    RequestNotFound(RequestId),
    #[error("no identity record for document {document_number} ({email})")]
    IdentityNotFound {
        document_number: String,
        email: String,
    },
    #[error("no profile found for {0}")]
    ProfileNotFound(String),
    #[error("unknown request reference '{0}'")]
    UnknownReference(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("amount {amount} exceeds maximum allowed {maximum}")]
    AmountAboveMaximum { amount: Decimal, maximum: Decimal },
    #[error("amount {amount} below minimum allowed {minimum}")]
    AmountBelowMinimum { amount: Decimal, minimum: Decimal },
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("invalid status change: {from:?} -> {to:?}")]
    InvalidTransition { from: Status, to: Status },
    #[error("invalid financial input: {0}")]
    InvalidFinancialInput(String),
    #[error("division by zero: {0}")]
    DivisionByZero(&'static str),
    #[error("upstream error: {0}")]
    UpstreamError(#[source] BoxError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse classification of a [`LoanError`], used by callers that only care
/// whether a failure is the caller's fault or a collaborator's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    Upstream,
}

impl LoanError {
    pub fn upstream<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::UpstreamError(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LoanTypeNotFound(_)
            | Self::RequestNotFound(_)
            | Self::IdentityNotFound { .. }
            | Self::ProfileNotFound(_)
            | Self::UnknownReference(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::AmountAboveMaximum { .. }
            | Self::AmountBelowMinimum { .. }
            | Self::InvalidStatus(_)
            | Self::InvalidTransition { .. }
            | Self::InvalidFinancialInput(_)
            | Self::DivisionByZero(_) => ErrorKind::Validation,
            Self::UpstreamError(_) | Self::CsvError(_) | Self::IoError(_) | Self::JsonError(_) => {
                ErrorKind::Upstream
            }
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LoanError {
    fn from(err: rocksdb::Error) -> Self {
        Self::upstream(err)
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
