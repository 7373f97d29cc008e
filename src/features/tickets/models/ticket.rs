use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::tickets::models::Buyer;

/// Database model for a registered ticket
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub qr_value: String,
    pub buyer_id: i64,
    pub registered_at: DateTime<Utc>,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// A ticket together with the buyer that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketHolder {
    pub ticket: Ticket,
    pub buyer: Buyer,
}

/// Normalize a decoded QR payload so that incidental casing and surrounding
/// whitespace never produce two distinct tickets.
pub fn normalize_qr_value(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_qr_value_trims_and_lowercases() {
        assert_eq!(normalize_qr_value("ABC123"), "abc123");
        assert_eq!(normalize_qr_value("  AbC123\n"), "abc123");
        assert_eq!(normalize_qr_value("\tevent:2026/SEAT-12 "), "event:2026/seat-12");
    }

    #[test]
    fn test_normalize_qr_value_keeps_inner_whitespace() {
        assert_eq!(normalize_qr_value(" Row A Seat 4 "), "row a seat 4");
    }

    #[test]
    fn test_normalize_qr_value_blank_becomes_empty() {
        assert_eq!(normalize_qr_value("   "), "");
    }
}
