use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::features::tickets::models::{Buyer, Ticket, TicketHolder};
use crate::features::tickets::stores::{
    BuyerRef, CheckInOutcome, NewRegistration, StoreError, TicketStore,
};

/// Constraint names as created by the migrations
const TICKET_QR_CONSTRAINT: &str = "tickets_qr_value_key";
const BUYER_CONTACT_CONSTRAINT: &str = "buyers_email_phone_key";

/// Map unique violations on the registry constraints to conflict signals
fn classify_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        // PostgreSQL unique_violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            match db_err.constraint() {
                Some(TICKET_QR_CONSTRAINT) => return StoreError::TicketConflict,
                Some(BUYER_CONTACT_CONSTRAINT) => return StoreError::BuyerConflict,
                _ => {}
            }
        }
    }

    StoreError::Database(e)
}

/// Joined ticket + buyer row
#[derive(Debug, FromRow)]
struct TicketHolderRow {
    id: i64,
    qr_value: String,
    buyer_id: i64,
    registered_at: DateTime<Utc>,
    checked_in: bool,
    checked_in_at: Option<DateTime<Utc>>,
    buyer_name: String,
    buyer_email: String,
    buyer_phone: String,
    buyer_created_at: DateTime<Utc>,
}

impl From<TicketHolderRow> for TicketHolder {
    fn from(row: TicketHolderRow) -> Self {
        Self {
            ticket: Ticket {
                id: row.id,
                qr_value: row.qr_value,
                buyer_id: row.buyer_id,
                registered_at: row.registered_at,
                checked_in: row.checked_in,
                checked_in_at: row.checked_in_at,
            },
            buyer: Buyer {
                id: row.buyer_id,
                name: row.buyer_name,
                email: row.buyer_email,
                phone: row.buyer_phone,
                created_at: row.buyer_created_at,
            },
        }
    }
}

/// Postgres-backed ticket store
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgTicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTicketStore")
            .field("pool", &"<PgPool>")
            .finish()
    }
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn find_ticket(&self, qr_value: &str) -> Result<Option<Ticket>, StoreError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, qr_value, buyer_id, registered_at, checked_in, checked_in_at
            FROM tickets
            WHERE qr_value = $1
            "#,
        )
        .bind(qr_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get ticket by QR value: {:?}", e);
            StoreError::Database(e)
        })?;

        Ok(ticket)
    }

    async fn find_buyer(&self, email: &str, phone: &str) -> Result<Option<Buyer>, StoreError> {
        let buyer = sqlx::query_as::<_, Buyer>(
            r#"
            SELECT id, name, email, phone, created_at
            FROM buyers
            WHERE email = $1 AND phone = $2
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get buyer by contact: {:?}", e);
            StoreError::Database(e)
        })?;

        Ok(buyer)
    }

    async fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> Result<Ticket, StoreError> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let buyer_id = match registration.buyer {
            BuyerRef::Existing(id) => id,
            BuyerRef::New(buyer) => {
                let id = sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO buyers (name, email, phone)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    "#,
                )
                .bind(&buyer.name)
                .bind(&buyer.email)
                .bind(&buyer.phone)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify_db_error)?;

                tracing::debug!("Buyer created: id={}", id);
                id
            }
        };

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (qr_value, buyer_id, registered_at)
            VALUES ($1, $2, $3)
            RETURNING id, qr_value, buyer_id, registered_at, checked_in, checked_in_at
            "#,
        )
        .bind(&registration.qr_value)
        .bind(buyer_id)
        .bind(registration.registered_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify_db_error)?;

        tx.commit().await?;

        Ok(ticket)
    }

    async fn check_in(
        &self,
        qr_value: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckInOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // A concurrent scan blocks on the row lock and then sees checked_in = TRUE
        let admitted = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE tickets
            SET checked_in = TRUE, checked_in_at = $2
            WHERE qr_value = $1 AND checked_in = FALSE
            RETURNING id
            "#,
        )
        .bind(qr_value)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        let holder = sqlx::query_as::<_, TicketHolderRow>(
            r#"
            SELECT
                t.id, t.qr_value, t.buyer_id, t.registered_at, t.checked_in, t.checked_in_at,
                b.name AS buyer_name, b.email AS buyer_email, b.phone AS buyer_phone,
                b.created_at AS buyer_created_at
            FROM tickets t
            JOIN buyers b ON b.id = t.buyer_id
            WHERE t.qr_value = $1
            "#,
        )
        .bind(qr_value)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(match (admitted, holder) {
            (_, None) => CheckInOutcome::Missing,
            (Some(_), Some(row)) => CheckInOutcome::CheckedIn(row.into()),
            (None, Some(row)) => CheckInOutcome::AlreadyCheckedIn(row.into()),
        })
    }
}
