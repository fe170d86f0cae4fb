//! State of a single GET-NEXT walk.

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;

use super::request_id::next_request_id;
use crate::error::ErrorStatus;
use crate::message::Message;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::varbind::VarBind;

/// Lifecycle of a walk.
///
/// `Idle` is the only initial state. `Running` means a request is
/// outstanding. Every other state is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStatus {
    Idle,
    Running,
    /// The agent moved past the subtree or ran out of data.
    Done,
    /// The run's deadline passed while a request was outstanding.
    TimedOut,
    /// The run was cancelled while a request was outstanding.
    Cancelled,
    Failed(WalkFailure),
}

impl WalkStatus {
    /// Whether the walk has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WalkStatus::Idle | WalkStatus::Running)
    }

    /// Whether the walk ended in [`WalkStatus::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, WalkStatus::Failed(_))
    }
}

impl fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkStatus::Idle => f.write_str("idle"),
            WalkStatus::Running => f.write_str("running"),
            WalkStatus::Done => f.write_str("done"),
            WalkStatus::TimedOut => f.write_str("timed out"),
            WalkStatus::Cancelled => f.write_str("cancelled"),
            WalkStatus::Failed(failure) => write!(f, "failed: {}", failure),
        }
    }
}

/// Why a walk failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkFailure {
    /// The agent answered with a fatal error-status.
    Agent(ErrorStatus),
    /// The agent returned an OID that does not follow the one requested.
    /// Continuing would loop forever.
    NonIncreasingOid { previous: Oid, current: Oid },
}

impl fmt::Display for WalkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkFailure::Agent(status) => {
                write!(f, "agent returned {} ({})", status, status.as_i32())
            }
            WalkFailure::NonIncreasingOid { previous, current } => {
                write!(f, "non-increasing OID {} after {}", current, previous)
            }
        }
    }
}

/// One collected row: `(index, oid, value)`, all as strings.
///
/// `index` is the OID with the walk's root stripped, so the same row of
/// different columns of one table carries the same index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRow {
    pub index: String,
    pub oid: String,
    pub value: String,
}

impl WalkRow {
    fn new(root: &Oid, vb: &VarBind) -> Self {
        Self {
            index: vb.oid.index_suffix(root).unwrap_or_default(),
            oid: vb.oid.to_string(),
            value: vb.value.to_string(),
        }
    }
}

/// Result of one walk, returned to the caller whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkReport {
    pub target: SocketAddr,
    pub root: Oid,
    pub status: WalkStatus,
    /// Rows collected before the walk ended, in the order received.
    pub rows: Vec<WalkRow>,
}

/// What the caller should do after a job has seen a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Not for this job, or the job is not waiting for one.
    Ignored,
    /// Send this encoded request to the job's target.
    Send(Bytes),
    /// The job reached a terminal state.
    Finished,
}

/// A GET-NEXT walk over one subtree of one agent.
///
/// The job owns all walk state and never does I/O itself: [`WalkJob::start`]
/// and [`WalkJob::handle_response`] hand back the bytes to send.
#[derive(Debug, Clone)]
pub struct WalkJob {
    target: SocketAddr,
    community: Bytes,
    root: Oid,
    request_id: i32,
    last_sent: VarBind,
    rows: Vec<WalkRow>,
    status: WalkStatus,
}

impl WalkJob {
    /// Create an idle job.
    pub fn new(target: SocketAddr, community: impl Into<Bytes>, root: Oid) -> Self {
        Self {
            target,
            community: community.into(),
            last_sent: VarBind::null(root.clone()),
            root,
            request_id: 0,
            rows: Vec::new(),
            status: WalkStatus::Idle,
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn root(&self) -> &Oid {
        &self.root
    }

    /// Id of the outstanding request, zero before [`WalkJob::start`].
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// The varbind most recently sent.
    pub fn last_sent(&self) -> &VarBind {
        &self.last_sent
    }

    pub fn rows(&self) -> &[WalkRow] {
        &self.rows
    }

    pub fn status(&self) -> &WalkStatus {
        &self.status
    }

    /// Whether a request is outstanding.
    pub fn is_running(&self) -> bool {
        self.status == WalkStatus::Running
    }

    /// Build the first request, seeded with the root OID, and move to `Running`.
    ///
    /// Calling this on a job that is not idle restarts nothing and returns
    /// `None`.
    pub fn start(&mut self) -> Option<Bytes> {
        if self.status != WalkStatus::Idle {
            return None;
        }
        self.status = WalkStatus::Running;
        tracing::debug!(snmp.target = %self.target, snmp.root = %self.root, "walk started");
        Some(self.next_request(self.root.clone()))
    }

    fn next_request(&mut self, seed: Oid) -> Bytes {
        self.request_id = next_request_id();
        self.last_sent = VarBind::null(seed);
        let oids = std::slice::from_ref(&self.last_sent.oid);
        let pdu = Pdu::get_next_request(self.request_id, oids);
        tracing::trace!(
            snmp.target = %self.target,
            snmp.request_id = self.request_id,
            snmp.oid = %self.last_sent.oid,
            "GET-NEXT"
        );
        Message::new(self.community.clone(), pdu).encode()
    }

    fn finish(&mut self, status: WalkStatus) -> Step {
        tracing::debug!(
            snmp.target = %self.target,
            snmp.root = %self.root,
            snmp.rows = self.rows.len(),
            status = %status,
            "walk finished"
        );
        self.status = status;
        Step::Finished
    }

    /// Advance the walk with a decoded response.
    ///
    /// Checks run in this order: request-id correlation, fatal error-status,
    /// subtree membership, then OID ordering, after which the varbind is
    /// appended as a row. A NULL value on the last varbind ends the walk once
    /// its row is recorded.
    ///
    /// With `noSuchName`, the varbind named by the error-index (every varbind
    /// when it is zero) is the agent echoing the request. It carries no data,
    /// is not recorded, and ends the walk.
    pub fn handle_response(&mut self, message: &Message) -> Step {
        let pdu = &message.pdu;
        if !self.is_running()
            || pdu.pdu_type != PduType::Response
            || pdu.request_id != self.request_id
        {
            tracing::debug!(
                snmp.target = %self.target,
                snmp.request_id = pdu.request_id,
                snmp.expected_request_id = self.request_id,
                "ignoring uncorrelated response"
            );
            return Step::Ignored;
        }

        let error_status = pdu.error_status();
        if error_status.is_fatal_during_walk() {
            tracing::warn!(
                snmp.target = %self.target,
                snmp.root = %self.root,
                snmp.request_id = pdu.request_id,
                snmp.error_status = %error_status,
                snmp.error_index = pdu.error_index,
                "agent returned error, walk failed"
            );
            return self.finish(WalkStatus::Failed(WalkFailure::Agent(error_status)));
        }

        let no_such_name = error_status == ErrorStatus::NoSuchName;
        let echoed = |position: usize| {
            no_such_name
                && (pdu.error_index == 0 || usize::try_from(pdu.error_index) == Ok(position + 1))
        };

        for (position, vb) in pdu.varbinds.iter().enumerate() {
            if !vb.oid.starts_with(&self.root) {
                tracing::debug!(snmp.target = %self.target, snmp.oid = %vb.oid, "left subtree");
                return self.finish(WalkStatus::Done);
            }
            if echoed(position) {
                continue;
            }
            // a NULL row is never used as a seed, so it cannot make the walk loop
            if !vb.value.is_null() && vb.oid <= self.last_sent.oid {
                tracing::warn!(
                    snmp.target = %self.target,
                    snmp.previous = %self.last_sent.oid,
                    snmp.oid = %vb.oid,
                    "agent returned non-increasing OID"
                );
                let failure = WalkFailure::NonIncreasingOid {
                    previous: self.last_sent.oid.clone(),
                    current: vb.oid.clone(),
                };
                return self.finish(WalkStatus::Failed(failure));
            }
            self.rows.push(WalkRow::new(&self.root, vb));
        }

        let last = pdu.varbinds.len().checked_sub(1).map(|i| (i, &pdu.varbinds[i]));
        match last {
            Some((position, vb)) if !echoed(position) && !vb.value.is_null() => {
                let seed = vb.oid.clone();
                Step::Send(self.next_request(seed))
            }
            // an empty row carries nothing to continue from
            _ => self.finish(WalkStatus::Done),
        }
    }

    /// Record the end of the run for a job still waiting on a response.
    pub(crate) fn interrupt(&mut self, status: WalkStatus) {
        if self.is_running() {
            self.finish(status);
        }
    }

    /// Consume the job into its report.
    pub fn into_report(self) -> WalkReport {
        WalkReport {
            target: self.target,
            root: self.root,
            status: self.status,
            rows: self.rows,
        }
    }
}
