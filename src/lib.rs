//! # snmp-walker
//!
//! SNMPv1 GET-NEXT table walking over UDP.
//!
//! The crate is built from small layers:
//!
//! - [`Oid`], [`Value`] and [`VarBind`] model the data an agent returns.
//! - [`ber`], [`Pdu`] and [`Message`] encode and decode SNMPv1 messages,
//!   including buffers holding several concatenated messages.
//! - [`transport::UdpDispatcher`] runs a callback-driven UDP receive loop
//!   bounded by a deadline.
//! - [`walk`] holds the walk state machine and the [`Walker`] front end.
//! - [`table`] joins several walks by row index.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_walker::{oid, walk, WalkStatus};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> snmp_walker::Result<()> {
//!     let report = walk(
//!         oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2),
//!         "192.168.1.1",
//!         "public",
//!         Duration::from_secs(5),
//!     )
//!     .await?;
//!
//!     for row in &report.rows {
//!         println!("{}\t{}", row.index, row.value);
//!     }
//!     if report.status != WalkStatus::Done {
//!         eprintln!("walk {}", report.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Codec
//!
//! ```rust
//! use snmp_walker::{Message, Pdu, oid};
//!
//! let request = Message::new("public", Pdu::get_next_request(7, &[oid!(1, 3, 6, 1)]));
//! let bytes = request.encode();
//! let (decoded, rest) = Message::decode(bytes).unwrap();
//! assert_eq!(decoded, request);
//! assert!(rest.is_empty());
//! ```
//!
//! ## Outcomes and errors
//!
//! A walk that times out, is cancelled, or is stopped by an agent error
//! still returns its rows; the reason is in [`WalkReport::status`]. Only
//! failures to resolve the target, bind the socket or send a request are
//! returned as [`Error`].
//!
//! ## Tracing
//!
//! Events are emitted through `tracing` with `snmp.*` fields
//! (`snmp.target`, `snmp.request_id`, `snmp.root`, ...). Datagram traffic is
//! logged at `trace`, ignored or undecodable responses and state changes at
//! `debug`, and agent errors at `warn`. BER decoding logs under the
//! `snmp_walker::ber` target.

pub mod ber;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod table;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod walk;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use message::{Message, Messages};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use table::{InterfaceRow, InterfaceTable, Table, TableRow, walk_interfaces};
pub use transport::{DatagramHandler, DispatchContext, RunOutcome, UdpDispatcher};
pub use value::Value;
pub use varbind::VarBind;
pub use walk::{
    WalkConfig, WalkController, WalkFailure, WalkJob, WalkReport, WalkRow, WalkStatus, Walker,
    WalkerBuilder, walk,
};
