//! Routes decoded responses to the walk jobs sharing one dispatcher run.

use std::net::SocketAddr;
use std::ops::ControlFlow;

use bytes::Bytes;

use super::job::{Step, WalkJob, WalkStatus};
use crate::message::Message;
use crate::transport::{DatagramHandler, DispatchContext, RunOutcome};

/// Drives a set of [`WalkJob`]s from dispatcher callbacks.
///
/// Every message in a datagram is decoded and handed to the job whose
/// outstanding request id it carries. A decode error abandons the rest of
/// that datagram but leaves every job waiting; the run deadline settles
/// jobs whose answers never arrive intact.
///
/// The controller borrows its jobs for one run; once the run is over the
/// caller reads the outcome straight from them.
#[derive(Debug)]
pub struct WalkController<'a> {
    jobs: &'a mut [WalkJob],
}

impl<'a> WalkController<'a> {
    pub fn new(jobs: &'a mut [WalkJob]) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[WalkJob] {
        self.jobs
    }

    /// Settle jobs still waiting after a run, based on why it ended.
    pub fn finish(&mut self, outcome: RunOutcome) {
        let status = match outcome {
            RunOutcome::DeadlineElapsed => WalkStatus::TimedOut,
            RunOutcome::Cancelled => WalkStatus::Cancelled,
            RunOutcome::Completed => return,
        };
        for job in self.jobs.iter_mut() {
            job.interrupt(status.clone());
        }
    }

    fn dispatch(&mut self, message: &Message, source: SocketAddr, ctx: &mut DispatchContext) {
        let request_id = message.pdu.request_id;
        let Some(job) = self
            .jobs
            .iter_mut()
            .find(|job| job.is_running() && job.request_id() == request_id)
        else {
            tracing::debug!(
                snmp.source = %source,
                snmp.request_id = request_id,
                "no walk waiting for this request id"
            );
            return;
        };

        if source != job.target() {
            tracing::debug!(
                snmp.target = %job.target(),
                snmp.source = %source,
                snmp.request_id = request_id,
                "response source address mismatch"
            );
        }

        match job.handle_response(message) {
            Step::Send(data) => ctx.send(data, job.target()),
            Step::Finished => ctx.job_finished(),
            Step::Ignored => {}
        }
    }
}

impl DatagramHandler for WalkController<'_> {
    fn on_start(&mut self, ctx: &mut DispatchContext) {
        for job in self.jobs.iter_mut() {
            if let Some(data) = job.start() {
                ctx.send(data, job.target());
                ctx.job_started();
            }
        }
    }

    fn on_datagram(
        &mut self,
        data: Bytes,
        source: SocketAddr,
        ctx: &mut DispatchContext,
    ) -> ControlFlow<()> {
        for decoded in Message::iter(data) {
            match decoded {
                Ok(message) => self.dispatch(&message, source, ctx),
                Err(e) => {
                    tracing::debug!(
                        snmp.source = %source,
                        error = %e,
                        "abandoning undecodable datagram remainder"
                    );
                    break;
                }
            }
        }
        ControlFlow::Continue(())
    }
}
