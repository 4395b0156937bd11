//! Application layer containing the loan request orchestration.
//!
//! `RequestLifecycleService` owns creation, the status state machine and the
//! administrative listing. `RequestEventService` wraps the state machine for
//! status changes that originate outside the service and performs its own,
//! enriched publishing.

pub mod events;
pub mod lifecycle;
