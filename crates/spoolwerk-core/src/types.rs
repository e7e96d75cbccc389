// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolwerk print agent.

use serde::{Deserialize, Serialize};

/// Normalized status of an installed printer.
///
/// Only one platform (WMI) reports a status field at all; its coded values
/// are mapped here. Platforms whose enumeration query carries no status
/// report `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    Ready,
    Printing,
    Warmup,
    Unknown,
}

impl PrinterStatus {
    /// Map a WMI `Win32_Printer.Status` value to a normalized status.
    ///
    /// WMI reports either the string `"OK"` or a numeric code serialized as
    /// a string. Anything unrecognized is `Unknown`.
    pub fn from_wmi_code(code: &str) -> Self {
        match code {
            "3" | "OK" => Self::Ready,
            "4" => Self::Printing,
            "5" => Self::Warmup,
            _ => Self::Unknown,
        }
    }
}

/// One installed printer, as enumerated by the host platform.
///
/// A `Printer` is a point-in-time snapshot: the directory is re-queried on
/// every call and records are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    /// Queue name, unique within one enumeration snapshot.
    pub name: String,
    pub status: PrinterStatus,
    pub is_default: bool,
}

/// The payload of a print job, tagged with its submission kind.
///
/// On the wire this is `payloadKind` (`"text"` or `"raw"`) plus `payload`;
/// raw bytes are hex-encoded so they survive the JSON boundary intact. The
/// agent never interprets raw bytes; device control codes are entirely the
/// producer's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payloadKind", content = "payload", rename_all = "lowercase")]
pub enum JobPayload {
    Text(String),
    Raw(#[serde(with = "hex::serde")] Vec<u8>),
}

impl JobPayload {
    /// Whether the payload carries zero bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Raw(bytes) => bytes.is_empty(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Raw(bytes) => bytes.len(),
        }
    }
}

/// A print job as submitted by a caller.
///
/// `job_id` is an opaque correlation token supplied by the caller; no
/// uniqueness is enforced. `printer_name` is not validated against the
/// printer directory before submission, so a job aimed at an unknown printer
/// fails at the native/queue layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub printer_name: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(flatten)]
    pub payload: JobPayload,
}

impl PrintJob {
    /// Document label shown in OS queue UIs for this job.
    pub fn label(&self) -> String {
        if self.job_id.is_empty() {
            "spoolwerk job".into()
        } else {
            format!("spoolwerk job {}", self.job_id)
        }
    }
}
