use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::tickets::models::{AdmitOutcome, Buyer, RegisterOutcome, VerifyOutcome};
use crate::shared::validation::PHONE_REGEX;

/// Maximum QR image upload size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Image types the decoder can read
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

pub fn is_image_type_allowed(content_type: &str) -> bool {
    let content_type = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase();
    ALLOWED_IMAGE_TYPES.contains(&content_type.as_str())
}

/// Request DTO for registering a decoded QR value
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterTicketDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    #[schema(example = "Alice")]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    #[schema(example = "555-0100")]
    pub phone: String,

    #[validate(length(min = 1, max = 2048, message = "QR value must be 1-2048 characters"))]
    #[schema(example = "ABC123")]
    pub qr_value: String,
}

/// Request DTO for checks that only need the QR value
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QrValueDto {
    #[validate(length(min = 1, max = 2048, message = "QR value must be 1-2048 characters"))]
    #[schema(example = "ABC123")]
    pub qr_value: String,
}

/// Buyer fields of the register-by-image form.
///
/// Carries the same rules as [`RegisterTicketDto`] so both registration
/// paths accept the same buyers.
#[derive(Debug, Clone, Validate)]
pub struct BuyerContactDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: String,
}

/// Register-by-image form for OpenAPI documentation.
/// The handler reads the multipart body directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct RegisterTicketImageDto {
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "555-0100")]
    pub phone: String,
    /// PNG or JPEG photo of the ticket QR code
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Verify-by-image form for OpenAPI documentation
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct VerifyTicketImageDto {
    /// PNG or JPEG photo of the ticket QR code
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Buyer shown to the gate staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BuyerDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<Buyer> for BuyerDto {
    fn from(b: Buyer) -> Self {
        Self {
            id: b.id,
            name: b.name,
            email: b.email,
            phone: b.phone,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegisterResponseDto {
    Registered { buyer_id: i64, qr_value: String },
    Duplicate { registered_at: DateTime<Utc> },
}

impl From<RegisterOutcome> for RegisterResponseDto {
    fn from(outcome: RegisterOutcome) -> Self {
        match outcome {
            RegisterOutcome::Registered { buyer_id, qr_value } => {
                Self::Registered { buyer_id, qr_value }
            }
            RegisterOutcome::Duplicate { registered_at } => Self::Duplicate { registered_at },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyResponseDto {
    Clean,
    AlreadyRegistered { registered_at: DateTime<Utc> },
}

impl From<VerifyOutcome> for VerifyResponseDto {
    fn from(outcome: VerifyOutcome) -> Self {
        match outcome {
            VerifyOutcome::Clean => Self::Clean,
            VerifyOutcome::AlreadyRegistered { registered_at } => {
                Self::AlreadyRegistered { registered_at }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdmitResponseDto {
    Granted {
        registered_at: DateTime<Utc>,
        buyer: BuyerDto,
    },
    NotRegistered,
    AlreadyUsed {
        checked_in_at: Option<DateTime<Utc>>,
        buyer: BuyerDto,
    },
}

impl From<AdmitOutcome> for AdmitResponseDto {
    fn from(outcome: AdmitOutcome) -> Self {
        match outcome {
            AdmitOutcome::Granted {
                registered_at,
                buyer,
            } => Self::Granted {
                registered_at,
                buyer: buyer.into(),
            },
            AdmitOutcome::NotRegistered => Self::NotRegistered,
            AdmitOutcome::AlreadyUsed {
                checked_in_at,
                buyer,
            } => Self::AlreadyUsed {
                checked_in_at,
                buyer: buyer.into(),
            },
        }
    }
}
