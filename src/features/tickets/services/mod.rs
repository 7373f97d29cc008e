mod qr_decoder;
mod ticket_service;

pub use qr_decoder::{DecodeError, ImageQrDecoder, QrDecoder};
pub use ticket_service::{RegistryError, TicketService};
