// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Queued submission via the OS print queue command (`lp`).
//
// On platforms without a structured spooler handle API, both text and raw
// jobs go through the system print queue: spawn `lp -d <printer>`, stream
// the payload to its stdin, and let CUPS route it to the device.  Raw jobs
// add `-o raw` so the queue forwards the bytes unfiltered -- the whole point
// for device control-code streams.
//
// Submission is synchronous: the call blocks until `lp` exits.  Combined
// stdout/stderr is captured and carried verbatim in the error on non-zero
// exit, which is what makes malformed device interactions diagnosable.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use spoolwerk_core::error::{Result, SpoolwerkError};

use crate::dispatcher::SubmitStrategy;

/// Capability over one external queue submission.
///
/// `raw` flags the payload as unfiltered; the queue must not reformat it.
pub trait QueueBackend {
    fn submit(&self, printer_name: &str, raw: bool, payload: &[u8]) -> Result<()>;
}

/// Real queue backend: spawns `lp` once per job.
#[derive(Debug, Default)]
pub struct LpQueue;

impl QueueBackend for LpQueue {
    fn submit(&self, printer_name: &str, raw: bool, payload: &[u8]) -> Result<()> {
        let mut command = Command::new("lp");
        command.arg("-d").arg(printer_name);
        if raw {
            command.arg("-o").arg("raw");
        }

        debug!(printer = printer_name, raw, bytes = payload.len(), "spawning lp");

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SpoolwerkError::QueueSubmission("lp command not found".into())
                } else {
                    SpoolwerkError::Io(e)
                }
            })?;

        // stdin is dropped after the write so lp sees EOF and submits.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload)?;
        }

        let output = child.wait_with_output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(SpoolwerkError::QueueSubmission(format!(
                "lp exited with {}: {}",
                output.status,
                combined.trim()
            )));
        }

        info!(
            printer = printer_name,
            raw,
            output = combined.trim(),
            "queue submission accepted"
        );
        Ok(())
    }
}

/// Submission strategy over the OS print queue.
///
/// Text jobs take the normal filtering path; raw jobs take the identical
/// path with the no-filter flag set.
pub struct QueuedSubmission<Q: QueueBackend = LpQueue> {
    queue: Q,
}

impl<Q: QueueBackend> QueuedSubmission<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }
}

impl Default for QueuedSubmission<LpQueue> {
    fn default() -> Self {
        Self::new(LpQueue)
    }
}

impl<Q: QueueBackend> SubmitStrategy for QueuedSubmission<Q> {
    fn submit_text(&self, printer_name: &str, _label: &str, text: &str) -> Result<()> {
        self.queue.submit(printer_name, false, text.as_bytes())
    }

    fn submit_raw(&self, printer_name: &str, _label: &str, bytes: &[u8]) -> Result<()> {
        self.queue.submit(printer_name, true, bytes)
    }
}
