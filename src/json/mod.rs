// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! JSON-side building blocks.
//!
//! This module provides the pieces of the JSON half of the pipeline:
//! - [`lexer`] - Streaming token iterator over borrowed bytes
//! - [`escape`] - String escape/unescape codecs
//! - [`builder`] - Output buffer for proto-to-JSON

pub mod builder;
pub mod escape;
pub mod lexer;

pub use builder::JsonBuilder;
pub use escape::{escape_json, unescape_json};
pub use lexer::{JsonLexer, Token};
