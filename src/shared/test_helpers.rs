use std::sync::Arc;

use axum::Router;

use crate::features::tickets::services::{DecodeError, QrDecoder, TicketService};
use crate::features::tickets::stores::InMemoryTicketStore;
use crate::features::tickets::{models::normalize_qr_value, routes};

/// Decoder that reads the "image" bytes as the QR text itself
#[derive(Debug, Clone, Copy, Default)]
pub struct TextQrDecoder;

impl QrDecoder for TextQrDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::Qr(e.to_string()))?;
        let value = normalize_qr_value(text);
        if value.is_empty() {
            return Err(DecodeError::NotFound);
        }
        Ok(value)
    }
}

/// Ticket routes over a fresh in-memory store
pub fn ticket_router() -> (Router, Arc<InMemoryTicketStore>) {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = Arc::new(TicketService::new(store.clone(), Arc::new(TextQrDecoder)));
    (routes::routes(service), store)
}
