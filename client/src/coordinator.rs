use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;

use trajview_shared::{SimplifyRequest, SimplifyResponse, TimeWindow};

use crate::error::RequestError;
use crate::selection::Selection;

/// Capability that executes one simplification request.
///
/// The returned future must not borrow the backend so it can be spawned onto the
/// host's executor.
pub trait TrajectoryBackend {
    fn simplify(
        &self,
        request: SimplifyRequest,
    ) -> impl Future<Output = Result<SimplifyResponse, RequestError>> + 'static;
}

/// State snapshot a request is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub selection: Selection,
    pub window: TimeWindow,
}

impl Submission {
    pub fn to_request(&self) -> SimplifyRequest {
        SimplifyRequest::new(
            self.selection.algorithms.clone(),
            self.selection.params.clone(),
            &self.window,
        )
    }
}

type PendingResponse = Pin<Box<dyn Future<Output = Result<SimplifyResponse, RequestError>>>>;

/// An issued request waiting on the backend.
pub struct Ticket {
    pub seq: u64,
    pub submission: Submission,
    pending: PendingResponse,
}

impl Ticket {
    /// Wait for the backend. Does not touch the coordinator.
    pub async fn resolve(self) -> Resolved {
        let result = self.pending.await;
        Resolved {
            seq: self.seq,
            submission: self.submission,
            result,
        }
    }
}

/// Backend outcome of a ticket, before the staleness check.
pub struct Resolved {
    pub seq: u64,
    pub submission: Submission,
    pub result: Result<SimplifyResponse, RequestError>,
}

/// A fresh result together with the selection it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub seq: u64,
    pub selection: Selection,
    pub window: TimeWindow,
    pub response: SimplifyResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Render(RenderJob),
    /// A newer request was issued (or the pipeline was invalidated) meanwhile.
    Superseded { seq: u64, latest: u64 },
}

/// Turns submissions into backend calls and lets only the newest one render.
///
/// Overlapping submissions are all sent; every request gets a sequence number when it
/// is issued and a response renders only if its number is still the latest issued.
/// Responses that arrive out of order therefore cannot overwrite newer state.
pub struct RequestCoordinator<B> {
    backend: B,
    latest_seq: Cell<u64>,
    in_flight: Cell<usize>,
}

impl<B: TrajectoryBackend> RequestCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            latest_seq: Cell::new(0),
            in_flight: Cell::new(0),
        }
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq.get()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.latest_seq.get()
    }

    /// Mark every outstanding request stale.
    pub fn invalidate(&self) {
        self.latest_seq.set(self.latest_seq.get().wrapping_add(1));
    }

    /// Start a backend call for `submission`. The sequence number is taken here,
    /// so ordering follows submission order rather than arrival order.
    pub fn issue(&self, submission: Submission) -> Result<Ticket, RequestError> {
        if submission.selection.is_empty() {
            return Err(RequestError::EmptySelection);
        }
        let seq = self.latest_seq.get().wrapping_add(1);
        self.latest_seq.set(seq);
        self.in_flight.set(self.in_flight.get() + 1);

        let request = submission.to_request();
        tracing::debug!(
            seq,
            algorithms = request.algorithms.len(),
            end_time = %request.end_time,
            "issuing simplify request"
        );
        let pending: PendingResponse = Box::pin(self.backend.simplify(request));
        Ok(Ticket {
            seq,
            submission,
            pending,
        })
    }

    /// Decide what a resolved ticket is worth. Stale outcomes, including stale
    /// failures, become `Superseded`.
    pub fn settle(&self, resolved: Resolved) -> Result<Delivery, RequestError> {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        let Resolved {
            seq,
            submission,
            result,
        } = resolved;
        let latest = self.latest_seq.get();

        if seq != latest {
            match &result {
                Ok(_) => tracing::debug!(seq, latest, "dropping superseded response"),
                Err(e) => tracing::debug!(seq, latest, error = %e, "dropping superseded failure"),
            }
            return Ok(Delivery::Superseded { seq, latest });
        }

        match result {
            Ok(response) => Ok(Delivery::Render(RenderJob {
                seq,
                selection: submission.selection,
                window: submission.window,
                response,
            })),
            Err(e) => {
                tracing::warn!(seq, error = %e, "simplify request failed");
                Err(e)
            }
        }
    }

    /// Issue, wait, settle.
    pub async fn submit(&self, submission: Submission) -> Result<Delivery, RequestError> {
        let ticket = self.issue(submission)?;
        let resolved = ticket.resolve().await;
        self.settle(resolved)
    }
}
