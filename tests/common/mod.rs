//! Shared test utilities for snmp-walker integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod agent;
mod fixtures;

pub use agent::{Fault, SimAgent};
pub use fixtures::*;
