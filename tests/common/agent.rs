//! In-process SNMPv1 agent for integration tests.
//!
//! Answers GET-NEXT requests from a sorted MIB over an ephemeral localhost
//! UDP port, using the crate's own codec. The agent task stops when the
//! [`SimAgent`] is dropped.

use bytes::Bytes;
use snmp_walker::{ErrorStatus, Message, Oid, Pdu, PduType, Value, VarBind};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Misbehaviour to inject into the agent's answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Well-behaved SNMPv1 agent: `noSuchName` past the end of the MIB.
    None,
    /// Never answer.
    Silent,
    /// Answer every request with this error-status.
    Status(ErrorStatus),
    /// Past the end of the MIB, answer `noError` with a Null value instead
    /// of `noSuchName`.
    NullAtEnd,
    /// Prefix every answer, in the same datagram, with a copy carrying a
    /// stale request id and a bogus varbind.
    StaleFirst,
    /// Answer with the requested OID itself, with a non-Null value,
    /// instead of its successor.
    Repeat,
    /// Append undecodable bytes after the answer in the same datagram.
    TrailingGarbage,
}

/// Running simulated agent.
pub struct SimAgent {
    addr: SocketAddr,
    request_ids: Arc<Mutex<Vec<i32>>>,
    _guard: DropGuard,
}

impl SimAgent {
    /// Start a well-behaved agent serving `mib`.
    pub async fn start(mib: BTreeMap<Oid, Value>) -> Self {
        Self::with_fault(mib, Fault::None).await
    }

    /// Start an agent serving `mib` with the given fault.
    pub async fn with_fault(mib: BTreeMap<Oid, Value>, fault: Fault) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let token = CancellationToken::new();
        let request_ids = Arc::new(Mutex::new(Vec::new()));

        let cancel = token.clone();
        let seen = request_ids.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            loop {
                let (len, peer) = tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = socket.recv_from(&mut buf) => match received {
                        Ok(received) => received,
                        Err(_) => continue,
                    },
                };

                for request in Message::iter(Bytes::copy_from_slice(&buf[..len])) {
                    let Ok(request) = request else { break };
                    seen.lock().unwrap().push(request.pdu.request_id);
                    if let Some(reply) = answer(&mib, &fault, &request) {
                        let _ = socket.send_to(&reply, peer).await;
                    }
                }
            }
        });

        Self {
            addr,
            request_ids,
            _guard: token.drop_guard(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Target string for [`snmp_walker::Walker::builder`].
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Request ids received so far, in arrival order.
    pub fn request_ids(&self) -> Vec<i32> {
        self.request_ids.lock().unwrap().clone()
    }
}

fn answer(mib: &BTreeMap<Oid, Value>, fault: &Fault, request: &Message) -> Option<Bytes> {
    if request.pdu.pdu_type != PduType::GetNextRequest {
        return None;
    }
    let id = request.pdu.request_id;
    let reply = |pdu: Pdu| Message::new(request.community.clone(), pdu).encode();

    let pdu = match fault {
        Fault::Silent => return None,
        Fault::Status(status) => Pdu::response(id, *status, 1, request.pdu.varbinds.clone()),
        Fault::Repeat => {
            let echoed = request
                .pdu
                .varbinds
                .iter()
                .map(|vb| VarBind::new(vb.oid.clone(), Value::Integer(0)))
                .collect();
            Pdu::response(id, ErrorStatus::NoError, 0, echoed)
        }
        _ => next_rows(mib, fault, &request.pdu),
    };

    match fault {
        Fault::StaleFirst => {
            let bogus = VarBind::new(
                Oid::from_slice(&[1, 3, 6, 1, 2, 1, 99, 1]),
                Value::from("stale"),
            );
            let stale_id = id.wrapping_sub(1000);
            let stale = Pdu::response(stale_id, ErrorStatus::NoError, 0, vec![bogus]);
            let mut datagram = reply(stale).to_vec();
            datagram.extend_from_slice(&reply(pdu));
            Some(datagram.into())
        }
        Fault::TrailingGarbage => {
            let mut datagram = reply(pdu).to_vec();
            datagram.extend_from_slice(&[0x30, 0x82, 0xff]);
            Some(datagram.into())
        }
        _ => Some(reply(pdu)),
    }
}

/// GET-NEXT semantics: the successor of every requested OID.
fn next_rows(mib: &BTreeMap<Oid, Value>, fault: &Fault, request: &Pdu) -> Pdu {
    let mut varbinds = Vec::with_capacity(request.varbinds.len());
    for (i, vb) in request.varbinds.iter().enumerate() {
        let next = mib
            .range::<Oid, _>((Bound::Excluded(&vb.oid), Bound::Unbounded))
            .next();
        match (next, fault) {
            (Some((oid, value)), _) => varbinds.push(VarBind::new(oid.clone(), value.clone())),
            (None, Fault::NullAtEnd) => varbinds.push(VarBind::null(vb.oid.clone())),
            (None, _) => {
                return Pdu::response(
                    request.request_id,
                    ErrorStatus::NoSuchName,
                    i as i32 + 1,
                    request.varbinds.clone(),
                );
            }
        }
    }
    Pdu::response(request.request_id, ErrorStatus::NoError, 0, varbinds)
}
