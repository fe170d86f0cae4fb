//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use snmp_walker::prelude::*;
//! ```
//!
//! This imports:
//! - Walking: [`Walker`], [`walk`], [`WalkReport`], [`WalkStatus`]
//! - Core types: [`Oid`], [`Value`], [`VarBind`]
//! - Error handling: [`Error`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::walk::{WalkReport, WalkStatus, Walker, walk};

#[doc(no_inline)]
pub use crate::oid;
