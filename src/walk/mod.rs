//! GET-NEXT subtree walking.
//!
//! A walk repeatedly asks an agent for the OID following the last one it
//! returned, collecting `(index, oid, value)` rows until the agent leaves the
//! requested subtree, signals the end of its data, reports an error, or the
//! run's time budget runs out. Timeouts and agent errors are outcomes, not
//! errors: the rows gathered so far are always returned.
//!
//! ```rust,no_run
//! use snmp_walker::{oid, walk};
//! use std::time::Duration;
//!
//! # async fn example() -> snmp_walker::Result<()> {
//! let if_descr = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
//! let report = walk(if_descr, "192.0.2.1", "public", Duration::from_secs(5)).await?;
//! for row in &report.rows {
//!     println!("{} {}", row.index, row.value);
//! }
//! println!("{}", report.status);
//! # Ok(())
//! # }
//! ```

mod controller;
mod job;
mod request_id;

pub use controller::WalkController;
pub use job::{Step, WalkFailure, WalkJob, WalkReport, WalkRow, WalkStatus};
pub use request_id::next_request_id;

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::oid::Oid;
use crate::transport::{DEFAULT_BIND, DEFAULT_MAX_MESSAGE_SIZE, UdpDispatcher};
use crate::util::resolve_target;

/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// Default time budget for a whole run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by every walk of one [`Walker`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
    /// Community string (default `public`).
    pub community: String,
    /// Time budget for the whole run, not per request (default 5s).
    pub timeout: Duration,
    /// Agent port when the target does not name one (default 161).
    pub port: u16,
    /// Local bind address (default `0.0.0.0:0`, or `[::]:0` for IPv6 targets).
    pub bind: String,
    /// Largest datagram sent or received (default 65535).
    pub max_message_size: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            community: "public".into(),
            timeout: DEFAULT_TIMEOUT,
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Walks one or more subtrees of one agent in a single dispatcher run.
///
/// ```rust,no_run
/// use snmp_walker::{Walker, oid};
/// use std::time::Duration;
///
/// # async fn example() -> snmp_walker::Result<()> {
/// let reports = Walker::builder("192.0.2.1")
///     .community("private")
///     .timeout(Duration::from_secs(2))
///     .root(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2))
///     .root(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 8))
///     .build()
///     .run()
///     .await?;
/// assert_eq!(reports.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Walker {
    target: String,
    config: WalkConfig,
    roots: Vec<Oid>,
    cancel: Option<CancellationToken>,
}

impl Walker {
    /// Start configuring a walker for `target` (`host`, `host:port` or an IP).
    pub fn builder(target: impl Into<String>) -> WalkerBuilder {
        WalkerBuilder {
            walker: Walker {
                target: target.into(),
                config: WalkConfig::default(),
                roots: Vec::new(),
                cancel: None,
            },
        }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub fn roots(&self) -> &[Oid] {
        &self.roots
    }

    /// Walk every root concurrently over one socket.
    ///
    /// Returns one report per root, in the order the roots were added. Only
    /// resolution, socket and send failures are errors.
    pub async fn run(&self) -> Result<Vec<WalkReport>> {
        let target = resolve_target(&self.target, self.config.port).await?;
        let mut jobs: Vec<WalkJob> = self
            .roots
            .iter()
            .map(|root| WalkJob::new(target, self.config.community.clone(), root.clone()))
            .collect();
        self.drive(target, &mut jobs).await?;
        Ok(jobs.into_iter().map(WalkJob::into_report).collect())
    }

    /// Run `jobs` to completion, or until the run's deadline or cancellation
    /// settles the ones still waiting.
    async fn drive(&self, target: SocketAddr, jobs: &mut [WalkJob]) -> Result<()> {
        let bind = if target.is_ipv6() && self.config.bind == DEFAULT_BIND {
            "[::]:0".to_string()
        } else {
            self.config.bind.clone()
        };
        let mut builder = UdpDispatcher::builder()
            .bind(bind)
            .max_message_size(self.config.max_message_size);
        if let Some(token) = &self.cancel {
            builder = builder.cancel(token.clone());
        }
        let dispatcher = builder.open().await?;

        tracing::debug!(
            snmp.target = %target,
            snmp.roots = jobs.len(),
            snmp.timeout_ms = self.config.timeout.as_millis() as u64,
            "walk run starting"
        );
        let mut controller = WalkController::new(jobs);
        let outcome = dispatcher.run(&mut controller, self.config.timeout).await?;
        controller.finish(outcome);
        dispatcher.close();
        Ok(())
    }
}

/// Builder for [`Walker`].
#[derive(Debug, Clone)]
pub struct WalkerBuilder {
    walker: Walker,
}

impl WalkerBuilder {
    /// Set the community string (default `public`).
    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.walker.config.community = community.into();
        self
    }

    /// Set the time budget for the whole run (default 5s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.walker.config.timeout = timeout;
        self
    }

    /// Set the agent port used when the target does not carry one (default 161).
    pub fn port(mut self, port: u16) -> Self {
        self.walker.config.port = port;
        self
    }

    /// Set the local bind address.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.walker.config.bind = addr.into();
        self
    }

    /// Set the largest datagram sent or received.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.walker.config.max_message_size = size;
        self
    }

    /// Attach a cancellation token. Cancelling ends the run, and walks still
    /// waiting end as [`WalkStatus::Cancelled`] with their rows so far.
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.walker.cancel = Some(token);
        self
    }

    /// Add a subtree to walk.
    pub fn root(mut self, root: impl Into<Oid>) -> Self {
        self.walker.roots.push(root.into());
        self
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: WalkConfig) -> Self {
        self.walker.config = config;
        self
    }

    pub fn build(self) -> Walker {
        self.walker
    }
}

/// Walk one subtree of one agent.
///
/// `timeout` bounds the whole walk. When it expires the report's status is
/// [`WalkStatus::TimedOut`] and its rows are whatever arrived in time.
pub async fn walk(
    root: impl Into<Oid>,
    host: &str,
    community: &str,
    timeout: Duration,
) -> Result<WalkReport> {
    let walker = Walker::builder(host)
        .community(community)
        .timeout(timeout)
        .build();
    let target = resolve_target(&walker.target, walker.config.port).await?;
    let mut job = WalkJob::new(target, community.to_owned(), root.into());
    walker.drive(target, std::slice::from_mut(&mut job)).await?;
    Ok(job.into_report())
}
