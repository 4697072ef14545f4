use tracing::trace;

use crate::data::query::{Query, QueryError, QueryResult};

/// Backend capable of answering aggregation queries.
///
/// The backend is an external collaborator; this crate only consumes the
/// contract. Responses are positionally matched to the request array.
pub trait DataBackend {
    fn run_queries(&mut self, queries: &[Query]) -> Result<Vec<QueryResult>, QueryError>;
}

/// Proof that a fetch generation was started; settle it to apply its result.
#[must_use = "a ticket that is never settled silently drops its fetch result"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    seq: u64,
}

/// Issues versioned queries and applies only the latest generation's result.
///
/// Each `begin` supersedes every outstanding ticket. Settling a superseded
/// ticket yields `None` — "ignore, do nothing" — never an error or an empty
/// result, so callers need no locking of their own.
#[derive(Debug, Default)]
pub struct DataFetchSession {
    latest_seq: u64,
}

impl DataFetchSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new fetch generation, superseding all earlier tickets.
    pub fn begin(&mut self) -> QueryTicket {
        self.latest_seq += 1;
        QueryTicket {
            seq: self.latest_seq,
        }
    }

    #[must_use]
    pub fn is_latest(&self, ticket: QueryTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    /// Applies `outcome` if `ticket` is still the latest generation.
    ///
    /// Returns `None` for a stale ticket; the outcome is discarded silently.
    pub fn settle<T>(&mut self, ticket: QueryTicket, outcome: T) -> Option<T> {
        if self.is_latest(ticket) {
            Some(outcome)
        } else {
            trace!(
                stale_seq = ticket.seq,
                latest_seq = self.latest_seq,
                "discarding stale fetch result"
            );
            None
        }
    }

    /// Runs the queries against a synchronous backend, returning `None` when
    /// the result arrives stale.
    ///
    /// Hosts with real asynchronous transports use `begin`/`settle` directly
    /// around their own suspension point.
    pub fn fetch_latest(
        &mut self,
        backend: &mut dyn DataBackend,
        queries: &[Query],
    ) -> Result<Option<Vec<QueryResult>>, QueryError> {
        let ticket = self.begin();
        let results = backend.run_queries(queries)?;
        Ok(self.settle(ticket, results))
    }
}
