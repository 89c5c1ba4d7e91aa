//! Shared test harness modules for the Vaycay CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod discover_unit;
mod helpers;
