// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for jsonwire.
//!
//! Provides error types for both transcoding directions:
//! - JSON lexing and value parsing
//! - Protobuf wire-format reads
//! - Schema ingestion and validation

use std::fmt;

/// Errors that can occur while transcoding or loading schemas.
///
/// Any error aborts the current transcoding call immediately. The output
/// buffer may contain partial bytes at that point; callers must discard it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// JSON token incompatible with the current parse state
    UnexpectedToken,

    /// JSON value shape does not fit the schema field's kind
    TypeMismatch,

    /// Protobuf record wire type does not match the schema field
    InvalidWireType,

    /// Input ended in the middle of a structure
    UnexpectedEof,

    /// JSON string body contains an invalid escape sequence
    MalformedString,

    /// Numeric JSON literal failed to parse for the field's kind
    NumberParse {
        /// The literal as it appeared in the input
        literal: String,
    },

    /// Bytes field input is not valid standard-alphabet base64
    Base64 {
        /// Decoder error message
        message: String,
    },

    /// Protobuf varint or length-delimited record is truncated or malformed
    WireParse {
        /// What went wrong
        message: String,
    },

    /// Schema description is structurally invalid
    InvalidSchema {
        /// Validation error message
        reason: String,
    },
}

impl TranscodeError {
    /// Create a number parse error from the offending literal.
    pub fn number_parse(literal: impl Into<String>) -> Self {
        TranscodeError::NumberParse {
            literal: literal.into(),
        }
    }

    /// Create a base64 decode error.
    pub fn base64(message: impl Into<String>) -> Self {
        TranscodeError::Base64 {
            message: message.into(),
        }
    }

    /// Create a wire parse error.
    pub fn wire_parse(message: impl Into<String>) -> Self {
        TranscodeError::WireParse {
            message: message.into(),
        }
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(reason: impl Into<String>) -> Self {
        TranscodeError::InvalidSchema {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::UnexpectedToken => write!(f, "unexpected token"),
            TranscodeError::TypeMismatch => write!(f, "field type mismatch"),
            TranscodeError::InvalidWireType => write!(f, "invalid wire type"),
            TranscodeError::UnexpectedEof => write!(f, "unexpected end of input"),
            TranscodeError::MalformedString => write!(f, "malformed string escape"),
            TranscodeError::NumberParse { literal } => {
                write!(f, "invalid numeric literal '{literal}'")
            }
            TranscodeError::Base64 { message } => {
                write!(f, "base64 decode error: {message}")
            }
            TranscodeError::WireParse { message } => {
                write!(f, "wire parse error: {message}")
            }
            TranscodeError::InvalidSchema { reason } => {
                write!(f, "invalid schema: {reason}")
            }
        }
    }
}

impl std::error::Error for TranscodeError {}

/// Result type for jsonwire operations.
pub type Result<T> = std::result::Result<T, TranscodeError>;
