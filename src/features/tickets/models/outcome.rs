//! Results of the registry operations.
//!
//! Duplicates, unknown tickets and reused tickets are expected outcomes of a
//! fraud check, so they are modelled as variants here rather than as errors.

use chrono::{DateTime, Utc};

use crate::features::tickets::models::Buyer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The QR value is now bound to the buyer
    Registered { buyer_id: i64, qr_value: String },
    /// The QR value was already claimed at `registered_at`
    Duplicate { registered_at: DateTime<Utc> },
}

/// Resale check: is this QR already claimed by someone?
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Clean,
    AlreadyRegistered { registered_at: DateTime<Utc> },
}

/// Admission gate decision for a presented QR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Unknown QR, treated as a fake ticket
    NotRegistered,
    /// The ticket was already scanned at the gate
    AlreadyUsed {
        checked_in_at: Option<DateTime<Utc>>,
        buyer: Buyer,
    },
    /// First scan; the ticket is now checked in
    Granted {
        registered_at: DateTime<Utc>,
        buyer: Buyer,
    },
}
