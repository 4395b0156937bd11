//! Domain layer: entities, value objects, financial math and the ports the
//! application layer depends on.

pub mod events;
pub mod finance;
pub mod listing;
pub mod loan;
pub mod ports;
pub mod profile;
pub mod status;
