use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a ticket buyer, unique by (email, phone)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}
