// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout jsonwire.
//!
//! This module provides the foundational types for the library:
//! - [`TranscodeError`] - Comprehensive error handling
//! - [`Result`] - Crate-wide result alias

pub mod error;

pub use error::{Result, TranscodeError};
