//! UDP dispatcher.

use super::{DatagramHandler, DispatchContext, RunOutcome};
use crate::error::{Error, Result};
use crate::util::bind_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default local bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:0";

/// Largest UDP payload, and the default datagram size limit.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;

/// Callback-driven UDP dispatcher.
///
/// The socket is unconnected, so one dispatcher can talk to many agents in a
/// single run. UDP semantics pass straight through: nothing is retransmitted,
/// reordered or deduplicated here.
///
/// ```rust,no_run
/// use snmp_walker::transport::UdpDispatcher;
///
/// # async fn example() -> snmp_walker::Result<()> {
/// let dispatcher = UdpDispatcher::builder()
///     .bind("0.0.0.0:0")
///     .max_message_size(8192)
///     .open()
///     .await?;
/// println!("bound to {}", dispatcher.local_addr());
/// # Ok(())
/// # }
/// ```
pub struct UdpDispatcher {
    socket: UdpSocket,
    local_addr: SocketAddr,
    max_message_size: usize,
    cancel: CancellationToken,
}

impl UdpDispatcher {
    /// Open a dispatcher with default settings.
    pub async fn open() -> Result<Self> {
        Self::builder().open().await
    }

    /// Create a builder for configuring the dispatcher.
    pub fn builder() -> UdpDispatcherBuilder {
        UdpDispatcherBuilder::new()
    }

    /// Local bind address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Token that cancels this dispatcher's runs.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Send one datagram.
    pub async fn send(&self, data: &[u8], dest: SocketAddr) -> Result<()> {
        if data.len() > self.max_message_size {
            return Err(Error::MessageTooLarge {
                size: data.len(),
                max: self.max_message_size,
            });
        }
        tracing::trace!(snmp.target = %dest, snmp.bytes = data.len(), "UDP send");
        self.socket
            .send_to(data, dest)
            .await
            .map_err(|e| Error::Io {
                target: Some(dest),
                source: e,
            })?;
        Ok(())
    }

    /// Drive `handler` until its jobs finish, it breaks, `max_duration`
    /// elapses, or the dispatcher is cancelled.
    ///
    /// The deadline is checked before every receive, so a zero
    /// `max_duration` sends the initial requests and returns
    /// [`RunOutcome::DeadlineElapsed`] without handling any reply.
    ///
    /// Only send failures are errors; a receive error is logged and the loop
    /// keeps going, since on some platforms an ICMP unreachable from one
    /// agent surfaces there.
    pub async fn run<H>(&self, handler: &mut H, max_duration: Duration) -> Result<RunOutcome>
    where
        H: DatagramHandler + ?Sized,
    {
        let deadline = Instant::now() + max_duration;
        let mut ctx = DispatchContext::default();

        handler.on_start(&mut ctx);
        self.flush(&mut ctx).await?;
        if ctx.jobs().all_finished() {
            return Ok(RunOutcome::Completed);
        }

        let mut buf = vec![0u8; self.max_message_size];
        loop {
            // the timer only fires on a driver tick, so an already-ready
            // socket could otherwise keep the run going past the deadline
            if Instant::now() >= deadline {
                tracing::debug!(
                    snmp.pending_jobs = ctx.jobs().pending(),
                    "dispatcher deadline elapsed"
                );
                return Ok(RunOutcome::DeadlineElapsed);
            }

            tokio::select! {
                biased;

                _ = tokio::time::sleep_until(deadline) => {
                    tracing::debug!(
                        snmp.pending_jobs = ctx.jobs().pending(),
                        "dispatcher deadline elapsed"
                    );
                    return Ok(RunOutcome::DeadlineElapsed);
                }
                _ = self.cancel.cancelled() => {
                    tracing::debug!(
                        snmp.pending_jobs = ctx.jobs().pending(),
                        "dispatcher cancelled"
                    );
                    return Ok(RunOutcome::Cancelled);
                }
                received = self.socket.recv_from(&mut buf) => {
                    let (len, source) = match received {
                        Ok(received) => received,
                        Err(e) => {
                            tracing::warn!(error = %e, "UDP recv error");
                            continue;
                        }
                    };
                    tracing::trace!(snmp.source = %source, snmp.bytes = len, "UDP recv");

                    let data = Bytes::copy_from_slice(&buf[..len]);
                    let flow = handler.on_datagram(data, source, &mut ctx);
                    self.flush(&mut ctx).await?;

                    if flow.is_break() || ctx.jobs().all_finished() {
                        return Ok(RunOutcome::Completed);
                    }
                }
            }
        }
    }

    async fn flush(&self, ctx: &mut DispatchContext) -> Result<()> {
        for (data, dest) in ctx.take_outbox() {
            self.send(&data, dest).await?;
        }
        Ok(())
    }

    /// Close the socket.
    ///
    /// Dropping the dispatcher has the same effect.
    pub fn close(self) {
        tracing::debug!(snmp.local_addr = %self.local_addr, "closing UDP dispatcher");
    }
}

/// Builder for [`UdpDispatcher`].
pub struct UdpDispatcherBuilder {
    bind_addr: String,
    max_message_size: usize,
    recv_buffer_size: Option<usize>,
    cancel: Option<CancellationToken>,
}

impl UdpDispatcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            recv_buffer_size: None,
            cancel: None,
        }
    }

    /// Set the local bind address (default `0.0.0.0:0`).
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the largest datagram sent or received (default 65535).
    ///
    /// Received datagrams longer than this are truncated by the kernel and
    /// will fail to decode.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size.min(DEFAULT_MAX_MESSAGE_SIZE);
        self
    }

    /// Request a kernel receive buffer size (`SO_RCVBUF`).
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    /// Attach a cancellation token; cancelling it ends any run in progress.
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind the socket.
    pub async fn open(self) -> Result<UdpDispatcher> {
        let bind_addr: SocketAddr = self.bind_addr.parse().map_err(|_| {
            Error::io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address: {}", self.bind_addr),
            ))
        })?;

        let socket = bind_udp_socket(bind_addr, self.recv_buffer_size)
            .await
            .map_err(|e| Error::Io {
                target: Some(bind_addr),
                source: e,
            })?;

        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;

        tracing::debug!(snmp.local_addr = %local_addr, "UDP dispatcher bound");

        Ok(UdpDispatcher {
            socket,
            local_addr,
            max_message_size: self.max_message_size,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

impl Default for UdpDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
