use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::error::AppError;
use crate::features::tickets::models::{
    normalize_qr_value, AdmitOutcome, RegisterOutcome, VerifyOutcome,
};
use crate::features::tickets::services::{DecodeError, QrDecoder};
use crate::features::tickets::stores::{
    BuyerRef, CheckInOutcome, NewBuyer, NewRegistration, StoreError, TicketStore,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lost a concurrent registration race for the same QR value
    #[error("QR value was registered concurrently")]
    Conflict {
        registered_at: Option<DateTime<Utc>>,
    },

    #[error("Invalid or unreadable QR image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(msg) => AppError::Validation(msg),
            RegistryError::Conflict { registered_at } => AppError::Conflict(match registered_at {
                Some(at) => format!("QR value already registered at {}", at.to_rfc3339()),
                None => "QR value already registered".to_string(),
            }),
            RegistryError::Decode(e) => {
                tracing::debug!("QR decoding failed: {}", e);
                AppError::BadRequest("Invalid or unreadable QR image".to_string())
            }
            RegistryError::Store(StoreError::Database(e)) => AppError::Database(e),
            RegistryError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Normalize a QR value and reject payloads that are blank after trimming
fn require_qr_value(raw: &str) -> Result<String> {
    let qr_value = normalize_qr_value(raw);
    if qr_value.is_empty() {
        return Err(RegistryError::Validation(
            "QR value must not be empty".to_string(),
        ));
    }
    Ok(qr_value)
}

fn require_field(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

/// Ticket registry: binds QR values to buyers and answers fraud checks.
///
/// Holds no state of its own; the injected store is the only source of truth
/// and its uniqueness constraints decide every race.
pub struct TicketService {
    store: Arc<dyn TicketStore>,
    decoder: Arc<dyn QrDecoder>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>, decoder: Arc<dyn QrDecoder>) -> Self {
        Self { store, decoder }
    }

    /// Register a QR value to the buyer identified by (email, phone)
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        qr_value: &str,
    ) -> Result<RegisterOutcome> {
        require_field("name", name)?;
        require_field("email", email)?;
        require_field("phone", phone)?;
        let qr_value = require_qr_value(qr_value)?;

        if let Some(existing) = self.store.find_ticket(&qr_value).await? {
            tracing::warn!(
                "Duplicate registration attempt: qr={}, registered_at={}",
                qr_value,
                existing.registered_at
            );
            return Ok(RegisterOutcome::Duplicate {
                registered_at: existing.registered_at,
            });
        }

        let buyer = match self.store.find_buyer(email, phone).await? {
            Some(buyer) => BuyerRef::Existing(buyer.id),
            None => BuyerRef::New(NewBuyer {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
            }),
        };

        let registered_at = Utc::now();
        let attempt = self
            .store
            .insert_registration(NewRegistration {
                buyer,
                qr_value: qr_value.clone(),
                registered_at,
            })
            .await;

        let attempt = match attempt {
            Err(StoreError::BuyerConflict) => {
                // Another request created this buyer between lookup and insert
                tracing::debug!("Buyer created concurrently, retrying with existing buyer");
                let buyer = self
                    .store
                    .find_buyer(email, phone)
                    .await?
                    .ok_or(StoreError::BuyerConflict)?;
                self.store
                    .insert_registration(NewRegistration {
                        buyer: BuyerRef::Existing(buyer.id),
                        qr_value: qr_value.clone(),
                        registered_at,
                    })
                    .await
            }
            other => other,
        };

        let ticket = match attempt {
            Ok(ticket) => ticket,
            Err(StoreError::TicketConflict) => return Err(self.lost_race(&qr_value).await),
            Err(e) => {
                tracing::error!("Failed to register ticket: {:?}", e);
                return Err(e.into());
            }
        };

        tracing::info!(
            "Ticket registered: id={}, qr={}, buyer={}",
            ticket.id,
            ticket.qr_value,
            ticket.buyer_id
        );

        Ok(RegisterOutcome::Registered {
            buyer_id: ticket.buyer_id,
            qr_value: ticket.qr_value,
        })
    }

    /// Decode a QR image and register its payload
    pub async fn register_image(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        image: Vec<u8>,
    ) -> Result<RegisterOutcome> {
        let qr_value = self.decode_image(image).await?;
        self.register(name, email, phone, &qr_value).await
    }

    /// Resale check. Pure read: repeated calls return the same answer.
    pub async fn verify(&self, qr_value: &str) -> Result<VerifyOutcome> {
        let qr_value = require_qr_value(qr_value)?;

        Ok(match self.store.find_ticket(&qr_value).await? {
            None => VerifyOutcome::Clean,
            Some(ticket) => VerifyOutcome::AlreadyRegistered {
                registered_at: ticket.registered_at,
            },
        })
    }

    /// Decode a QR image and run the resale check on its payload
    pub async fn verify_image(&self, image: Vec<u8>) -> Result<VerifyOutcome> {
        let qr_value = self.decode_image(image).await?;
        self.verify(&qr_value).await
    }

    /// Admission gate: checks the ticket in on its first scan
    pub async fn admit(&self, qr_value: &str) -> Result<AdmitOutcome> {
        let qr_value = require_qr_value(qr_value)?;

        let outcome = match self.store.check_in(&qr_value, Utc::now()).await? {
            CheckInOutcome::Missing => {
                tracing::warn!("Admission refused, unknown QR: qr={}", qr_value);
                AdmitOutcome::NotRegistered
            }
            CheckInOutcome::AlreadyCheckedIn(holder) => {
                tracing::warn!(
                    "Admission refused, ticket already used: qr={}, checked_in_at={:?}",
                    qr_value,
                    holder.ticket.checked_in_at
                );
                AdmitOutcome::AlreadyUsed {
                    checked_in_at: holder.ticket.checked_in_at,
                    buyer: holder.buyer,
                }
            }
            CheckInOutcome::CheckedIn(holder) => {
                debug_assert!(holder.ticket.checked_in);
                tracing::info!(
                    "Admission granted: qr={}, buyer={}",
                    qr_value,
                    holder.buyer.id
                );
                AdmitOutcome::Granted {
                    registered_at: holder.ticket.registered_at,
                    buyer: holder.buyer,
                }
            }
        };

        Ok(outcome)
    }

    /// Run the CPU-bound decoder off the async workers
    async fn decode_image(&self, image: Vec<u8>) -> Result<String> {
        let decoder = Arc::clone(&self.decoder);
        let qr_value = tokio::task::spawn_blocking(move || decoder.decode(&image))
            .await
            .map_err(|e| DecodeError::Aborted(e.to_string()))??;

        Ok(qr_value)
    }

    /// Build the conflict error for a registration that lost the insert race
    async fn lost_race(&self, qr_value: &str) -> RegistryError {
        let registered_at = match self.store.find_ticket(qr_value).await {
            Ok(ticket) => ticket.map(|t| t.registered_at),
            Err(e) => {
                tracing::error!("Failed to read winning registration: {:?}", e);
                None
            }
        };

        tracing::warn!(
            "Concurrent registration conflict: qr={}, registered_at={:?}",
            qr_value,
            registered_at
        );

        RegistryError::Conflict { registered_at }
    }
}
