// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph-observability
//!
//! Logging setup shared by every neurograph binary and test harness, with
//! per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known neurograph crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurograph",
    "neurograph-structures",
    "neurograph-bundle",
    "neurograph-engine",
    "neurograph-config",
    "neurograph-observability",
];
