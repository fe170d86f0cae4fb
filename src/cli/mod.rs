//! CLI utilities for snmp-walker.
//!
//! Argument parsing, output formatting, and OID name hints for the
//! `snmp-walk` tool.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod hints;
pub mod output;
