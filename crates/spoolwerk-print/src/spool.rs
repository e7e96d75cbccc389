// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native spool session -- the explicit spooler protocol state machine.
//
// Where the OS exposes a structured spooler handle API, raw byte delivery
// runs through a strict session:
//
//   Closed -> Opened -> DocumentStarted -> PageStarted -> Write*
//          -> PageEnded -> DocumentEnded -> Closed
//
// The backend calls are abstracted behind `SpoolBackend` so the state
// machine can be exercised against a fake without hardware or OS access.
// The real Windows implementation lives in `winspool.rs`.
//
// # Cleanup contract
//
// Once `open` succeeds, `close` runs exactly once on every exit path.  Once
// `begin_document` succeeds, `end_document` runs even if a later stage
// fails; likewise `end_page` once `begin_page` succeeds.  The unwind is the
// strict reverse of the begin/open order.  The session retains the FIRST
// failure it encounters; a failure during the mandatory unwind is logged at
// WARN and never overrides it.

use tracing::{debug, warn};

use spoolwerk_core::error::{Result, SpoolwerkError};

use crate::dispatcher::SubmitStrategy;

/// Spooler data type declared when a document is started.
///
/// `Raw` instructs the spooler to forward bytes to the device unmodified,
/// with no reformatting or filtering. `Text` lets the spooler render plain
/// text for the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolDataType {
    Raw,
    Text,
}

impl SpoolDataType {
    /// The datatype name the spooler expects in the document declaration.
    pub fn spooler_name(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::Text => "TEXT",
        }
    }
}

/// Capability over one native spooler session.
///
/// One `Handle` represents one exclusively-owned open printer connection; it
/// is never reused across jobs. Implementations map each operation onto the
/// OS spooler API and translate failures into stage-tagged errors.
pub trait SpoolBackend {
    type Handle;

    /// Acquire an exclusive handle to the named printer.
    fn open(&self, printer_name: &str) -> Result<Self::Handle>;

    /// Declare a document with the given label and data type.  Returns the
    /// spooler's informational job identifier.
    fn begin_document(
        &self,
        handle: &mut Self::Handle,
        label: &str,
        data_type: SpoolDataType,
    ) -> Result<u32>;

    /// Start a page.  Must follow a successful `begin_document`.
    fn begin_page(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Transmit the full buffer in one call.  Returns the count of bytes the
    /// spooler actually accepted, which the session checks against the
    /// buffer length.
    fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> Result<usize>;

    fn end_page(&self, handle: &mut Self::Handle) -> Result<()>;

    fn end_document(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Release the handle.  Consumes it -- a handle is closed exactly once.
    fn close(&self, handle: Self::Handle) -> Result<()>;
}

/// Submission strategy that drives a [`SpoolBackend`] through the full
/// session for every job.
pub struct NativeSpool<B: SpoolBackend> {
    backend: B,
}

impl<B: SpoolBackend> NativeSpool<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Run one complete spool session for a single payload.
    ///
    /// The payload is transmitted as one page of one document. See the
    /// module docs for the cleanup contract.
    pub fn submit(
        &self,
        printer_name: &str,
        label: &str,
        data_type: SpoolDataType,
        payload: &[u8],
    ) -> Result<()> {
        // Nothing to unwind if open itself fails.
        let mut handle = self.backend.open(printer_name)?;
        debug!(printer = printer_name, "spooler handle opened");

        let mut first: Option<SpoolwerkError> = None;
        let mut document_started = false;
        let mut page_started = false;

        match self.backend.begin_document(&mut handle, label, data_type) {
            Ok(spool_job_id) => {
                document_started = true;
                debug!(
                    spool_job_id,
                    label,
                    data_type = data_type.spooler_name(),
                    "spooler document started"
                );
            }
            Err(e) => first = Some(e),
        }

        if first.is_none() {
            match self.backend.begin_page(&mut handle) {
                Ok(()) => page_started = true,
                Err(e) => first = Some(e),
            }
        }

        if first.is_none() {
            match self.backend.write(&mut handle, payload) {
                // The underlying call can report success while accepting
                // fewer bytes than requested; that is still a failed job.
                Ok(written) if written == payload.len() => {
                    debug!(written, "payload accepted by spooler");
                }
                Ok(written) => {
                    first = Some(SpoolwerkError::PartialWrite {
                        written,
                        requested: payload.len(),
                    });
                }
                Err(e) => first = Some(e),
            }
        }

        // Mandatory unwind, strict reverse order, on every exit path.
        if page_started {
            if let Err(e) = self.backend.end_page(&mut handle) {
                retain_or_demote(&mut first, e);
            }
        }
        if document_started {
            if let Err(e) = self.backend.end_document(&mut handle) {
                retain_or_demote(&mut first, e);
            }
        }
        if let Err(e) = self.backend.close(handle) {
            retain_or_demote(&mut first, e);
        }

        match first {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

/// Keep the first failure; demote any later one to a warning so it cannot
/// mask the error that actually broke the session.
fn retain_or_demote(first: &mut Option<SpoolwerkError>, err: SpoolwerkError) {
    match first {
        None => *first = Some(err),
        Some(original) => warn!(
            error = %err,
            original = %original,
            "spool unwind failure suppressed in favor of the first error"
        ),
    }
}

impl<B: SpoolBackend> SubmitStrategy for NativeSpool<B> {
    fn submit_text(&self, printer_name: &str, label: &str, text: &str) -> Result<()> {
        self.submit(printer_name, label, SpoolDataType::Text, text.as_bytes())
    }

    fn submit_raw(&self, printer_name: &str, label: &str, bytes: &[u8]) -> Result<()> {
        self.submit(printer_name, label, SpoolDataType::Raw, bytes)
    }
}
