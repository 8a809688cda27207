//! Async driver that performs a session's fetch tickets.
//!
//! Each ticket becomes a tokio task calling the [`ReferenceSource`]; answers
//! come back over a channel and are applied one at a time, in arrival order,
//! on the caller's task. A driver serves exactly one session.

use std::sync::Arc;

use fieldmeta_schema::RefItem;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{EditorWarning, ServiceError};
use crate::resolver::FetchTicket;
use crate::services::{fetch_list, ReferenceSource};
use crate::session::{EditSession, FetchDisposition};

#[derive(Debug)]
struct Completion {
    ticket: FetchTicket,
    result: Result<Vec<RefItem>, ServiceError>,
}

pub struct EditorDriver {
    source: Arc<dyn ReferenceSource>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl EditorDriver {
    pub fn new(source: Arc<dyn ReferenceSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Number of fetches started whose answers have not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start a task for every ticket the session has queued.
    pub fn dispatch(&mut self, session: &mut EditSession) -> usize {
        let tickets = session.take_tickets();
        let started = tickets.len();
        for ticket in tickets {
            trace!(key = %ticket.key, epoch = ticket.epoch, "dispatching fetch");
            let source = Arc::clone(&self.source);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = fetch_list(source.as_ref(), &ticket.key).await;
                // The driver may be gone; its session no longer wants the answer.
                let _ = tx.send(Completion { ticket, result });
            });
        }
        self.in_flight += started;
        started
    }

    /// Wait for the next answer, apply it, and dispatch whatever it unlocked.
    /// Returns `None` once nothing is in flight.
    pub async fn next(&mut self, session: &mut EditSession) -> Option<FetchDisposition> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        self.in_flight -= 1;
        let disposition = session.apply_fetch(&completion.ticket, completion.result);
        debug!(
            key = %completion.ticket.key,
            ?disposition,
            in_flight = self.in_flight,
            "fetch answer handled"
        );
        self.dispatch(session);
        Some(disposition)
    }

    /// Run until every fetch the session needs has been answered, and return
    /// the warnings collected on the way.
    pub async fn settle(&mut self, session: &mut EditSession) -> Vec<EditorWarning> {
        self.dispatch(session);
        while self.next(session).await.is_some() {}
        session.take_warnings()
    }
}

impl std::fmt::Debug for EditorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorDriver")
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
