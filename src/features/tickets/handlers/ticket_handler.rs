use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ValidatedJson;
use crate::features::tickets::dtos::{
    is_image_type_allowed, AdmitResponseDto, BuyerContactDto, QrValueDto, RegisterResponseDto,
    RegisterTicketDto, RegisterTicketImageDto, VerifyResponseDto, VerifyTicketImageDto,
    ALLOWED_IMAGE_TYPES, MAX_IMAGE_SIZE,
};
use crate::features::tickets::models::{AdmitOutcome, RegisterOutcome, VerifyOutcome};
use crate::features::tickets::services::{RegistryError, TicketService};
use crate::shared::types::ApiResponse;

type TicketResponse<T> = Result<(StatusCode, Json<ApiResponse<T>>)>;

/// Text fields and the uploaded image of a QR form
struct ImageForm {
    fields: HashMap<String, String>,
    image: Vec<u8>,
}

impl ImageForm {
    fn required(&self, name: &str) -> Result<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Field '{}' is required", name)))
    }
}

/// Read a multipart body with a `file` image part and plain text fields
async fn read_image_form(mut multipart: Multipart) -> Result<ImageForm> {
    let mut fields = HashMap::new();
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            if !is_image_type_allowed(&content_type) {
                return Err(AppError::BadRequest(format!(
                    "File type '{}' is not allowed. Allowed types: {}",
                    content_type,
                    ALLOWED_IMAGE_TYPES.join(", ")
                )));
            }

            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read file bytes: {}", e);
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            })?;
            image = Some(data.to_vec());
        } else if !field_name.is_empty() {
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read {} field: {}", field_name, e))
            })?;
            fields.insert(field_name, text);
        }
    }

    let image = image.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    if image.len() > MAX_IMAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {} bytes ({} MB)",
            MAX_IMAGE_SIZE,
            MAX_IMAGE_SIZE / 1024 / 1024
        )));
    }

    Ok(ImageForm { fields, image })
}

/// Turn a registration result into 201 / 409.
///
/// A lost insert race is reported exactly like a sequential duplicate.
fn register_response(
    result: std::result::Result<RegisterOutcome, RegistryError>,
) -> TicketResponse<RegisterResponseDto> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(RegistryError::Conflict {
            registered_at: Some(registered_at),
        }) => RegisterOutcome::Duplicate { registered_at },
        Err(e) => return Err(e.into()),
    };

    Ok(match outcome {
        RegisterOutcome::Registered { .. } => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                Some(outcome.into()),
                Some("Ticket registered".to_string()),
            )),
        ),
        RegisterOutcome::Duplicate { .. } => (
            StatusCode::CONFLICT,
            Json(ApiResponse::rejected(
                outcome.into(),
                "This QR has already been registered".to_string(),
            )),
        ),
    })
}

fn verify_response(outcome: VerifyOutcome) -> (StatusCode, Json<ApiResponse<VerifyResponseDto>>) {
    match outcome {
        VerifyOutcome::Clean => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(outcome.into()),
                Some("This QR is not registered yet".to_string()),
            )),
        ),
        VerifyOutcome::AlreadyRegistered { .. } => (
            StatusCode::CONFLICT,
            Json(ApiResponse::rejected(
                outcome.into(),
                "This QR has already been registered. The seller may be reselling it.".to_string(),
            )),
        ),
    }
}

/// Register a decoded QR value to a buyer
#[utoipa::path(
    post,
    path = "/api/tickets/register",
    request_body = RegisterTicketDto,
    responses(
        (status = 201, description = "Ticket registered", body = ApiResponse<RegisterResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "QR already registered", body = ApiResponse<RegisterResponseDto>)
    ),
    tag = "tickets"
)]
pub async fn register_ticket(
    State(service): State<Arc<TicketService>>,
    ValidatedJson(dto): ValidatedJson<RegisterTicketDto>,
) -> TicketResponse<RegisterResponseDto> {
    let result = service
        .register(&dto.name, &dto.email, &dto.phone, &dto.qr_value)
        .await;
    register_response(result)
}

/// Register a ticket from a photo of its QR code
///
/// Accepts multipart/form-data with `name`, `email`, `phone` and `file`.
#[utoipa::path(
    post,
    path = "/api/tickets/register-image",
    request_body(
        content = RegisterTicketImageDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Ticket registered", body = ApiResponse<RegisterResponseDto>),
        (status = 400, description = "Invalid or unreadable QR image"),
        (status = 409, description = "QR already registered", body = ApiResponse<RegisterResponseDto>)
    ),
    tag = "tickets"
)]
pub async fn register_ticket_image(
    State(service): State<Arc<TicketService>>,
    multipart: Multipart,
) -> TicketResponse<RegisterResponseDto> {
    let form = read_image_form(multipart).await?;
    let buyer = BuyerContactDto {
        name: form.required("name")?.to_string(),
        email: form.required("email")?.to_string(),
        phone: form.required("phone")?.to_string(),
    };
    buyer
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service
        .register_image(&buyer.name, &buyer.email, &buyer.phone, form.image)
        .await;
    register_response(result)
}

/// Check whether a QR has already been claimed before buying it
#[utoipa::path(
    post,
    path = "/api/tickets/verify",
    request_body = QrValueDto,
    responses(
        (status = 200, description = "QR is not registered", body = ApiResponse<VerifyResponseDto>),
        (status = 409, description = "QR already registered", body = ApiResponse<VerifyResponseDto>)
    ),
    tag = "tickets"
)]
pub async fn verify_ticket(
    State(service): State<Arc<TicketService>>,
    ValidatedJson(dto): ValidatedJson<QrValueDto>,
) -> TicketResponse<VerifyResponseDto> {
    let outcome = service.verify(&dto.qr_value).await?;
    Ok(verify_response(outcome))
}

/// Check a QR photo before buying the ticket
#[utoipa::path(
    post,
    path = "/api/tickets/verify-image",
    request_body(
        content = VerifyTicketImageDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "QR is not registered", body = ApiResponse<VerifyResponseDto>),
        (status = 400, description = "Invalid or unreadable QR image"),
        (status = 409, description = "QR already registered", body = ApiResponse<VerifyResponseDto>)
    ),
    tag = "tickets"
)]
pub async fn verify_ticket_image(
    State(service): State<Arc<TicketService>>,
    multipart: Multipart,
) -> TicketResponse<VerifyResponseDto> {
    let form = read_image_form(multipart).await?;

    let outcome = service.verify_image(form.image).await?;
    Ok(verify_response(outcome))
}

/// Scan a ticket at the gate
#[utoipa::path(
    post,
    path = "/api/tickets/admit",
    request_body = QrValueDto,
    responses(
        (status = 200, description = "Entry granted", body = ApiResponse<AdmitResponseDto>),
        (status = 404, description = "Unknown or fake ticket", body = ApiResponse<AdmitResponseDto>),
        (status = 409, description = "Ticket already used", body = ApiResponse<AdmitResponseDto>)
    ),
    tag = "tickets"
)]
pub async fn admit_ticket(
    State(service): State<Arc<TicketService>>,
    ValidatedJson(dto): ValidatedJson<QrValueDto>,
) -> TicketResponse<AdmitResponseDto> {
    let outcome = service.admit(&dto.qr_value).await?;

    Ok(match outcome {
        AdmitOutcome::Granted { .. } => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(outcome.into()),
                Some("Entry granted.".to_string()),
            )),
        ),
        AdmitOutcome::NotRegistered => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::rejected(
                outcome.into(),
                "This QR is not in our system. Unknown or fake ticket.".to_string(),
            )),
        ),
        AdmitOutcome::AlreadyUsed { .. } => (
            StatusCode::CONFLICT,
            Json(ApiResponse::rejected(
                outcome.into(),
                "This QR has already been scanned. Possible fraud.".to_string(),
            )),
        ),
    })
}
