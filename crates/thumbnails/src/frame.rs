//! Frame-staggered request queue with cooperative cancellation.
//!
//! Thumbnail generation is deliberately spread across animation frames:
//! callers enqueue page requests as they are needed and the host drains
//! one per frame. Each request carries a [`CancellationToken`] so that
//! requests scheduled before `destroy` can never execute afterwards and
//! touch torn-down state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

/// Identifier of a scheduled generation request.
pub type RequestId = u64;

/// Cooperative cancellation flag shared between the queue and whoever
/// scheduled the request.
///
/// All clones observe a cancellation; cancelling twice is a no-op.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether `cancel` has been called on this token or any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct PendingRequest {
    id: RequestId,
    page_index: usize,
    token: CancellationToken,
}

/// FIFO queue of pending generation requests.
///
/// One request is handed out per [`pop_next`](FrameQueue::pop_next)
/// call; cancelled requests are skipped and dropped on the way.
#[derive(Default)]
pub struct FrameQueue {
    pending: VecDeque<PendingRequest>,
    next_id: RequestId,
}

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a generation request for `page_index` and return its id.
    pub fn schedule(&mut self, page_index: usize) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push_back(PendingRequest {
            id,
            page_index,
            token: CancellationToken::new(),
        });
        trace!(id, page_index, "scheduled thumbnail request");
        id
    }

    /// Cancel the request with the given id.
    ///
    /// Returns the request's page index when it was still pending, so
    /// callers can clean up per-page state without tracking the id to
    /// page mapping themselves.
    pub fn cancel(&mut self, id: RequestId) -> Option<usize> {
        match self.pending.iter().find(|request| request.id == id) {
            Some(request) if !request.token.is_cancelled() => {
                request.token.cancel();
                Some(request.page_index)
            }
            _ => None,
        }
    }

    /// Cancel every pending request. Returns the number cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for request in &self.pending {
            if !request.token.is_cancelled() {
                request.token.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Take the oldest non-cancelled request off the queue.
    ///
    /// Cancelled requests encountered on the way are discarded.
    pub fn pop_next(&mut self) -> Option<(RequestId, usize)> {
        while let Some(request) = self.pending.pop_front() {
            if request.token.is_cancelled() {
                trace!(id = request.id, "dropping cancelled thumbnail request");
                continue;
            }
            return Some((request.id, request.page_index));
        }
        None
    }

    /// Number of pending, non-cancelled requests.
    pub fn len(&self) -> usize {
        self.pending
            .iter()
            .filter(|request| !request.token.is_cancelled())
            .count()
    }

    /// Whether no non-cancelled request is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending request without running it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
