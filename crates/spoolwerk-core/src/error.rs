// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolwerk.

use thiserror::Error;

/// The spooler protocol stage at which a native submission failed.
///
/// Stages follow the strict session order: open, begin-document, begin-page,
/// write, then the unwind stages in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolStage {
    Open,
    BeginDocument,
    BeginPage,
    Write,
    EndPage,
    EndDocument,
    Close,
}

impl std::fmt::Display for SpoolStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::BeginDocument => "begin-document",
            Self::BeginPage => "begin-page",
            Self::Write => "write",
            Self::EndPage => "end-page",
            Self::EndDocument => "end-document",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all Spoolwerk operations.
#[derive(Debug, Error)]
pub enum SpoolwerkError {
    // -- Platform / enumeration errors --
    #[error("printing is not supported on this platform")]
    PlatformUnsupported,

    #[error("printer enumeration failed: {0}")]
    PlatformQuery(String),

    // -- Native spooler errors --
    #[error("printer '{0}' not found")]
    PrinterNotFound(String),

    #[error("access denied to printer '{0}'")]
    AccessDenied(String),

    #[error("spooler {stage} failed: {message}")]
    SpoolProtocol { stage: SpoolStage, message: String },

    #[error("partial write: spooler accepted {written} of {requested} bytes")]
    PartialWrite { written: usize, requested: usize },

    // -- Queue submission errors --
    #[error("queue submission failed: {0}")]
    QueueSubmission(String),

    // -- Job validation --
    #[error("print job has no printer name")]
    MissingPrinter,

    #[error("print job has no payload")]
    EmptyPayload,

    // -- Agent transport --
    #[error("agent server error: {0}")]
    Server(String),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpoolwerkError {
    /// Shorthand for a stage-tagged spool protocol failure.
    pub fn spool(stage: SpoolStage, message: impl Into<String>) -> Self {
        Self::SpoolProtocol {
            stage,
            message: message.into(),
        }
    }

    /// The protocol stage this error is tagged with, if any.
    pub fn stage(&self) -> Option<SpoolStage> {
        match self {
            Self::SpoolProtocol { stage, .. } => Some(*stage),
            Self::PartialWrite { .. } => Some(SpoolStage::Write),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spool_protocol_message_carries_stage_and_diagnostic() {
        let err = SpoolwerkError::spool(SpoolStage::BeginDocument, "queue is paused");
        assert_eq!(
            err.to_string(),
            "spooler begin-document failed: queue is paused"
        );
        assert_eq!(err.stage(), Some(SpoolStage::BeginDocument));
    }

    #[test]
    fn partial_write_is_tagged_as_write_stage() {
        let err = SpoolwerkError::PartialWrite {
            written: 3,
            requested: 8,
        };
        assert_eq!(err.stage(), Some(SpoolStage::Write));
        assert!(err.to_string().contains("3 of 8"));
    }
}
