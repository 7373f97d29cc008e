//! Ticket registry: binds scanned QR codes to buyers and detects resale fraud.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/tickets/register` | No | Register a decoded QR value to a buyer |
//! | POST | `/api/tickets/register-image` | No | Register from a QR photo (multipart) |
//! | POST | `/api/tickets/verify` | No | Resale check: has this QR been claimed? |
//! | POST | `/api/tickets/verify-image` | No | Resale check from a QR photo |
//! | POST | `/api/tickets/admit` | No | Gate scan: grant entry once per ticket |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod stores;

pub use services::{ImageQrDecoder, TicketService};
pub use stores::PgTicketStore;
