//! Internal utilities.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Create and bind a UDP socket with optional receive buffer size.
///
/// For IPv6 addresses, sets `IPV6_V6ONLY = false` so a `[::]` socket can
/// also reach IPv4 agents.
///
/// The kernel may cap `recv_buffer_size` at `net.core.rmem_max`.
pub(crate) async fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    if let Some(size) = recv_buffer_size {
        // best effort, the kernel clamps it anyway
        let _ = socket.set_recv_buffer_size(size);
    }

    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// Resolve `host` to a socket address, using `default_port` unless `host`
/// carries its own (`"10.0.0.1:1161"`, `"[::1]:161"`).
///
/// IPv4 results are preferred so the default `0.0.0.0` bind can reach them.
pub(crate) async fn resolve_target(host: &str, default_port: u16) -> Result<SocketAddr> {
    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    let host = host.trim_start_matches('[').trim_end_matches(']');
    let candidates: Vec<SocketAddr> = match tokio::net::lookup_host(host).await {
        Ok(addrs) => addrs.collect(),
        Err(_) => tokio::net::lookup_host((host, default_port))
            .await
            .map_err(Error::io)?
            .collect(),
    };

    candidates
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
        .ok_or_else(|| {
            Error::io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {host}"),
            ))
        })
}
