//! Activity catalog and roster operations.
//!
//! Invariants held for every activity at all times:
//!
//! - the roster never holds more than `max_participants` emails
//! - an email appears at most once per roster (it may appear in several)
//! - roster order is signup order
//!
//! All roster mutations go through [`RosterService`], which applies them
//! under the catalog's write lock.

mod catalog;
mod service;

pub use catalog::{Activity, ActivityCatalog, ActivityList};
pub use service::{RosterError, RosterService, SignupPolicy};
