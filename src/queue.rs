//! Sequential request queue
//!
//! Processes a list of items one at a time: an item's external request is
//! started, and the next item is not started until that request completes.
//! All state lives in the queue object; whoever drives it owns it.
//!
//! Two ways to drive a queue:
//! - `advance` - one poll step, for callers that own their own update loop
//! - `drain` - async, awaits each request in turn

use crate::log_queue;
use std::collections::VecDeque;
use std::fmt::{Debug, Display};
use std::future::Future;
use tracing::Level;

/// Queue lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    /// Nothing started yet
    Idle,
    /// One item's request is outstanding
    InFlight,
    /// Every item completed
    Done,
}

/// Result of one `advance` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<I> {
    /// This item is now in flight; start its request
    Started(I),
    /// The in-flight request has not completed yet
    Waiting,
    /// No items remain
    Finished,
}

/// Outcome of `drain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSummary<I> {
    /// Items whose request succeeded, in order
    pub succeeded: Vec<I>,
    /// Items whose request failed, with the error message
    pub failed: Vec<(I, String)>,
}

impl<I> Default for DrainSummary<I> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// One-in-flight queue state: pending items plus the current request
#[derive(Debug, Clone)]
pub struct RequestQueue<I> {
    pending: VecDeque<I>,
    in_flight: Option<I>,
    completed: usize,
    phase: QueuePhase,
}

impl<I: Clone + Debug> RequestQueue<I> {
    pub fn new(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            pending: items.into_iter().collect(),
            in_flight: None,
            completed: 0,
            phase: QueuePhase::Idle,
        }
    }

    pub fn phase(&self) -> QueuePhase {
        self.phase
    }

    pub fn in_flight(&self) -> Option<&I> {
        self.in_flight.as_ref()
    }

    /// Items not yet started
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Items whose request has completed
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.phase == QueuePhase::Done
    }

    /// Poll step
    ///
    /// `in_flight_done` reports whether the outstanding request (if any)
    /// has completed. It is ignored when nothing is in flight.
    pub fn advance(&mut self, in_flight_done: bool) -> Step<I> {
        match self.phase {
            QueuePhase::Done => return Step::Finished,
            QueuePhase::InFlight if !in_flight_done => return Step::Waiting,
            _ => {}
        }

        if let Some(item) = self.in_flight.take() {
            self.completed += 1;
            log_queue!(Level::DEBUG, item = ?item, completed = self.completed, "request completed");
        }

        match self.pending.pop_front() {
            Some(item) => {
                log_queue!(Level::INFO, item = ?item, remaining = self.pending.len(), "starting request");
                self.in_flight = Some(item.clone());
                self.phase = QueuePhase::InFlight;
                Step::Started(item)
            }
            None => {
                log_queue!(Level::INFO, completed = self.completed, "all requests completed");
                self.phase = QueuePhase::Done;
                Step::Finished
            }
        }
    }

    /// Run every item through `start`, awaiting each before the next
    ///
    /// A failed request is logged and recorded; processing continues.
    pub async fn drain<F, Fut, E>(mut self, mut start: F) -> DrainSummary<I>
    where
        F: FnMut(I) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut summary = DrainSummary::default();

        while let Step::Started(item) = self.advance(true) {
            match start(item.clone()).await {
                Ok(()) => summary.succeeded.push(item),
                Err(e) => {
                    log_queue!(Level::WARN, item = ?item, error = %e, "request failed");
                    summary.failed.push((item, e.to_string()));
                }
            }
        }

        summary
    }
}
