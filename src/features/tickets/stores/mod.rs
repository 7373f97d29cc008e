//! Persistence boundary for the ticket registry.
//!
//! The store owns the uniqueness guarantees: QR values are unique across all
//! tickets and `(email, phone)` is unique across all buyers. Violations are
//! reported as [`StoreError::TicketConflict`] / [`StoreError::BuyerConflict`]
//! so the service can treat a lost race as an expected outcome.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::features::tickets::models::{Buyer, Ticket, TicketHolder};

#[cfg(test)]
pub use memory::InMemoryTicketStore;
pub use postgres::PgTicketStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A ticket with this QR value already exists")]
    TicketConflict,

    #[error("A buyer with this email and phone already exists")]
    BuyerConflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Buyer to attach a new ticket to
#[derive(Debug, Clone)]
pub enum BuyerRef {
    Existing(i64),
    New(NewBuyer),
}

#[derive(Debug, Clone)]
pub struct NewBuyer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Everything written by a single successful registration
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub buyer: BuyerRef,
    pub qr_value: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    Missing,
    AlreadyCheckedIn(TicketHolder),
    CheckedIn(TicketHolder),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Find a ticket by its normalized QR value
    async fn find_ticket(&self, qr_value: &str) -> Result<Option<Ticket>, StoreError>;

    /// Find a buyer by the exact contact pair
    async fn find_buyer(&self, email: &str, phone: &str) -> Result<Option<Buyer>, StoreError>;

    /// Write the (optionally new) buyer and the ticket in one transaction.
    ///
    /// Either both rows are written or neither is.
    async fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> Result<Ticket, StoreError>;

    /// Mark the ticket as checked in if it is not already.
    ///
    /// The transition must be a single conditional write so that concurrent
    /// scans of the same QR admit at most one holder.
    async fn check_in(
        &self,
        qr_value: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckInOutcome, StoreError>;
}
