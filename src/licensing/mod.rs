//! License lifecycle: creation, activation, validity checks, renewal and
//! device release, with tickets for every outcome and an append-only history.

mod binding;
pub mod dates;
mod engine;
mod history;
mod ticket;

pub use binding::{ALREADY_ACTIVATED, NO_SLOTS_REMAINING};
pub use engine::{DEFAULT_DESCRIPTION, LicenseEngine, Renewal, generate_activation_code};
pub use history::record_change;
pub use ticket::Ticket;
