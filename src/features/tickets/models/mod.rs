mod buyer;
mod outcome;
mod ticket;

pub use buyer::Buyer;
pub use outcome::{AdmitOutcome, RegisterOutcome, VerifyOutcome};
pub use ticket::{normalize_qr_value, Ticket, TicketHolder};
