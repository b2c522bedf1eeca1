//! The implemented checks.
//! See their module descriptions for detailed information about each check.
//!
//! Each check module exports a `CHECK_MODULE` describing the check
//! and a `check_cwe` function executing it.
//! The configuration of each check is read from the entry with the check name in *config.json*.

pub mod exp42;
pub mod exp51;
