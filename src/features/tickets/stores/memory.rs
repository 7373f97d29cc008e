//! In-memory store used by the service and handler tests.
//!
//! Every operation yields to the scheduler before touching state, so futures
//! driven together with `join_all` interleave the way concurrent requests
//! against a database would.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::features::tickets::models::{Buyer, Ticket, TicketHolder};
use crate::features::tickets::stores::{
    BuyerRef, CheckInOutcome, NewRegistration, StoreError, TicketStore,
};

#[derive(Debug, Default)]
struct MemoryState {
    buyers: Vec<Buyer>,
    tickets: Vec<Ticket>,
}

impl MemoryState {
    fn holder(&self, ticket: &Ticket) -> Option<TicketHolder> {
        self.buyers
            .iter()
            .find(|b| b.id == ticket.buyer_id)
            .map(|buyer| TicketHolder {
                ticket: ticket.clone(),
                buyer: buyer.clone(),
            })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    state: Mutex<MemoryState>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn buyer_count(&self) -> usize {
        self.state().buyers.len()
    }

    pub fn ticket_count(&self) -> usize {
        self.state().tickets.len()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state().tickets.clone()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn find_ticket(&self, qr_value: &str) -> Result<Option<Ticket>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .state()
            .tickets
            .iter()
            .find(|t| t.qr_value == qr_value)
            .cloned())
    }

    async fn find_buyer(&self, email: &str, phone: &str) -> Result<Option<Buyer>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .state()
            .buyers
            .iter()
            .find(|b| b.email == email && b.phone == phone)
            .cloned())
    }

    async fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> Result<Ticket, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state();

        // Same order as the SQL store: buyer insert first, then ticket insert
        let (buyer_id, new_buyer) = match registration.buyer {
            BuyerRef::Existing(id) => (id, None),
            BuyerRef::New(buyer) => {
                if state
                    .buyers
                    .iter()
                    .any(|b| b.email == buyer.email && b.phone == buyer.phone)
                {
                    return Err(StoreError::BuyerConflict);
                }
                let id = state.buyers.len() as i64 + 1;
                let buyer = Buyer {
                    id,
                    name: buyer.name,
                    email: buyer.email,
                    phone: buyer.phone,
                    created_at: registration.registered_at,
                };
                (id, Some(buyer))
            }
        };

        if state
            .tickets
            .iter()
            .any(|t| t.qr_value == registration.qr_value)
        {
            return Err(StoreError::TicketConflict);
        }

        let ticket = Ticket {
            id: state.tickets.len() as i64 + 1,
            qr_value: registration.qr_value,
            buyer_id,
            registered_at: registration.registered_at,
            checked_in: false,
            checked_in_at: None,
        };

        if let Some(buyer) = new_buyer {
            state.buyers.push(buyer);
        }
        state.tickets.push(ticket.clone());

        Ok(ticket)
    }

    async fn check_in(
        &self,
        qr_value: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckInOutcome, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state();

        let Some(index) = state.tickets.iter().position(|t| t.qr_value == qr_value) else {
            return Ok(CheckInOutcome::Missing);
        };

        let admitted = !state.tickets[index].checked_in;
        if admitted {
            state.tickets[index].checked_in = true;
            state.tickets[index].checked_in_at = Some(at);
        }

        let ticket = state.tickets[index].clone();
        let holder = state
            .holder(&ticket)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

        Ok(if admitted {
            CheckInOutcome::CheckedIn(holder)
        } else {
            CheckInOutcome::AlreadyCheckedIn(holder)
        })
    }
}
