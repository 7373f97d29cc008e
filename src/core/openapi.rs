use utoipa::{Modify, OpenApi};

use crate::features::tickets::{dtos as tickets_dtos, handlers as tickets_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        tickets_handlers::register_ticket,
        tickets_handlers::register_ticket_image,
        tickets_handlers::verify_ticket,
        tickets_handlers::verify_ticket_image,
        tickets_handlers::admit_ticket,
    ),
    components(
        schemas(
            tickets_dtos::RegisterTicketDto,
            tickets_dtos::RegisterTicketImageDto,
            tickets_dtos::QrValueDto,
            tickets_dtos::VerifyTicketImageDto,
            tickets_dtos::BuyerDto,
            tickets_dtos::RegisterResponseDto,
            tickets_dtos::VerifyResponseDto,
            tickets_dtos::AdmitResponseDto,
            ApiResponse<tickets_dtos::RegisterResponseDto>,
            ApiResponse<tickets_dtos::VerifyResponseDto>,
            ApiResponse<tickets_dtos::AdmitResponseDto>,
        )
    ),
    tags(
        (name = "tickets", description = "QR ticket registration, resale checks and gate admission"),
    ),
    info(
        title = "Ticket Guard API",
        version = "0.1.0",
        description = "API documentation for Ticket Guard",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
