//! Datagram transport.
//!
//! A [`UdpDispatcher`] owns one UDP socket and runs a cooperative,
//! callback-driven receive loop. Protocol logic lives in a
//! [`DatagramHandler`]: it is handed every datagram that arrives and queues
//! replies on the [`DispatchContext`], which the dispatcher flushes once the
//! callback returns. The handler never awaits, so all state changes happen
//! synchronously between two receives.
//!
//! The loop ends when the handler breaks, when every job the handler
//! started has finished, when the run's deadline passes, or when the
//! dispatcher's cancellation token fires.

mod udp;

pub use udp::*;

use bytes::Bytes;
use std::net::SocketAddr;
use std::ops::ControlFlow;

/// Receiver side of a dispatcher run.
pub trait DatagramHandler {
    /// Called once when the run begins, before any datagram is received.
    ///
    /// Handlers queue their initial requests here and register the jobs
    /// they start.
    fn on_start(&mut self, ctx: &mut DispatchContext);

    /// Called for every datagram received during the run.
    ///
    /// Returning [`ControlFlow::Break`] ends the run immediately.
    fn on_datagram(
        &mut self,
        data: Bytes,
        source: SocketAddr,
        ctx: &mut DispatchContext,
    ) -> ControlFlow<()>;
}

/// Counts jobs started and finished during one run.
///
/// Created when a run begins and dropped when it ends, so counts never leak
/// between runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JobTracker {
    started: usize,
    finished: usize,
}

impl JobTracker {
    /// Record a job as started.
    pub fn job_started(&mut self) {
        self.started += 1;
    }

    /// Record a job as finished. Extra calls are ignored.
    pub fn job_finished(&mut self) {
        if self.finished < self.started {
            self.finished += 1;
        }
    }

    /// Jobs started but not yet finished.
    pub fn pending(&self) -> usize {
        self.started - self.finished
    }

    /// Number of jobs started so far.
    pub fn started(&self) -> usize {
        self.started
    }

    /// Whether every started job has finished.
    pub fn all_finished(&self) -> bool {
        self.pending() == 0
    }
}

/// Per-run state handed to a [`DatagramHandler`].
#[derive(Debug, Default)]
pub struct DispatchContext {
    outbox: Vec<(Bytes, SocketAddr)>,
    jobs: JobTracker,
}

impl DispatchContext {
    /// Queue a datagram; it is sent as soon as the current callback returns.
    pub fn send(&mut self, data: Bytes, dest: SocketAddr) {
        self.outbox.push((data, dest));
    }

    /// Record a job as started.
    pub fn job_started(&mut self) {
        self.jobs.job_started();
    }

    /// Record a job as finished.
    pub fn job_finished(&mut self) {
        self.jobs.job_finished();
    }

    /// Job counts for this run.
    pub fn jobs(&self) -> &JobTracker {
        &self.jobs
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<(Bytes, SocketAddr)> {
        std::mem::take(&mut self.outbox)
    }
}

/// Why a dispatcher run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every started job finished, or the handler broke out of the loop.
    Completed,
    /// The run's maximum duration elapsed first.
    DeadlineElapsed,
    /// The cancellation token fired.
    Cancelled,
}
