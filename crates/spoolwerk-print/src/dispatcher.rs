// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print dispatcher -- validates a job and routes it onto the submission
// strategy selected for the host platform.
//
// The strategy is chosen once at process startup by host identity, not by
// control flow scattered through call sites: Windows gets the native spool
// session, Unix gets queued submission through `lp`, anything else gets a
// stub that reports the platform as unsupported.
//
// Submission is at-most-once.  There is no retry anywhere in this crate;
// retry policy belongs to the caller.

use tracing::{error, info};

use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{JobPayload, PrintJob};

/// A platform submission strategy: one way of getting text and raw payloads
/// onto a named printer.
pub trait SubmitStrategy {
    fn submit_text(&self, printer_name: &str, label: &str, text: &str) -> Result<()>;

    fn submit_raw(&self, printer_name: &str, label: &str, bytes: &[u8]) -> Result<()>;
}

/// Strategy for platforms with no printing support at all.
///
/// Mirrors the desktop stub of the platform bridge: every operation reports
/// `PlatformUnsupported`.
pub struct UnsupportedStrategy;

impl SubmitStrategy for UnsupportedStrategy {
    fn submit_text(&self, _printer_name: &str, _label: &str, _text: &str) -> Result<()> {
        Err(SpoolwerkError::PlatformUnsupported)
    }

    fn submit_raw(&self, _printer_name: &str, _label: &str, _bytes: &[u8]) -> Result<()> {
        Err(SpoolwerkError::PlatformUnsupported)
    }
}

/// Routes validated jobs onto the platform's submission strategy.
pub struct PrintDispatcher<S: SubmitStrategy> {
    strategy: S,
}

impl<S: SubmitStrategy> PrintDispatcher<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Submit one job.
    ///
    /// Validation is structural only: the printer name and payload must be
    /// non-empty.  A printer name absent from the latest directory snapshot
    /// is deliberately NOT rejected here -- that failure surfaces from the
    /// native/queue layer with its own diagnostic.
    pub fn submit(&self, job: &PrintJob) -> Result<()> {
        if job.printer_name.is_empty() {
            return Err(SpoolwerkError::MissingPrinter);
        }
        if job.payload.is_empty() {
            return Err(SpoolwerkError::EmptyPayload);
        }

        let label = job.label();
        let result = match &job.payload {
            JobPayload::Text(text) => self.strategy.submit_text(&job.printer_name, &label, text),
            JobPayload::Raw(bytes) => self.strategy.submit_raw(&job.printer_name, &label, bytes),
        };

        match &result {
            Ok(()) => info!(
                printer = %job.printer_name,
                job_id = %job.job_id,
                bytes = job.payload.len(),
                "print job submitted"
            ),
            Err(e) => error!(
                printer = %job.printer_name,
                job_id = %job.job_id,
                error = %e,
                "print job failed"
            ),
        }
        result
    }
}

/// The submission strategy for this host.
#[cfg(windows)]
pub type PlatformStrategy = crate::spool::NativeSpool<crate::winspool::WinspoolBackend>;

#[cfg(unix)]
pub type PlatformStrategy = crate::queue::QueuedSubmission<crate::queue::LpQueue>;

#[cfg(not(any(unix, windows)))]
pub type PlatformStrategy = UnsupportedStrategy;

/// Build the dispatcher for the host platform.
///
/// Called once at process startup; every submission thereafter goes through
/// the same strategy.
pub fn platform_dispatcher() -> PrintDispatcher<PlatformStrategy> {
    #[cfg(windows)]
    {
        // Windows: structured spooler handle API, byte-exact delivery.
        PrintDispatcher::new(crate::spool::NativeSpool::new(
            crate::winspool::WinspoolBackend,
        ))
    }
    #[cfg(unix)]
    {
        // Unix: queued submission through the CUPS `lp` command.
        PrintDispatcher::new(crate::queue::QueuedSubmission::default())
    }
    #[cfg(not(any(unix, windows)))]
    {
        PrintDispatcher::new(UnsupportedStrategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use spoolwerk_core::error::SpoolStage;

    /// Records every routed submission: (kind, printer, label, payload).
    #[derive(Default)]
    struct RecordingStrategy {
        submissions: Mutex<Vec<(&'static str, String, String, Vec<u8>)>>,
        fail_with: Option<SpoolStage>,
    }

    impl RecordingStrategy {
        fn record(&self, kind: &'static str, printer: &str, label: &str, payload: &[u8]) -> Result<()> {
            self.submissions
                .lock()
                .expect("submission log lock poisoned")
                .push((kind, printer.into(), label.into(), payload.to_vec()));
            match self.fail_with {
                Some(stage) => Err(SpoolwerkError::spool(stage, "device offline")),
                None => Ok(()),
            }
        }
    }

    impl SubmitStrategy for RecordingStrategy {
        fn submit_text(&self, printer_name: &str, label: &str, text: &str) -> Result<()> {
            self.record("text", printer_name, label, text.as_bytes())
        }

        fn submit_raw(&self, printer_name: &str, label: &str, bytes: &[u8]) -> Result<()> {
            self.record("raw", printer_name, label, bytes)
        }
    }

    fn text_job(printer: &str, content: &str) -> PrintJob {
        PrintJob {
            printer_name: printer.into(),
            job_id: "j-1".into(),
            payload: JobPayload::Text(content.into()),
        }
    }

    #[test]
    fn text_job_routes_exactly_one_text_submission() {
        let dispatcher = PrintDispatcher::new(RecordingStrategy::default());
        dispatcher
            .submit(&text_job("HP LaserJet Pro", "Hello"))
            .expect("submit");

        let submissions = dispatcher.strategy.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let (kind, printer, _label, payload) = &submissions[0];
        assert_eq!(*kind, "text");
        assert_eq!(printer, "HP LaserJet Pro");
        assert_eq!(payload, b"Hello");
    }

    #[test]
    fn raw_job_routes_to_the_raw_path() {
        let dispatcher = PrintDispatcher::new(RecordingStrategy::default());
        dispatcher
            .submit(&PrintJob {
                printer_name: "Receipt Printer".into(),
                job_id: "j-2".into(),
                payload: JobPayload::Raw(vec![0x1B, 0x40]),
            })
            .expect("submit");

        let submissions = dispatcher.strategy.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let (kind, printer, _label, payload) = &submissions[0];
        assert_eq!(*kind, "raw");
        assert_eq!(printer, "Receipt Printer");
        assert_eq!(payload, &[0x1B, 0x40]);
    }

    #[test]
    fn empty_printer_name_is_rejected_before_submission() {
        let dispatcher = PrintDispatcher::new(RecordingStrategy::default());
        let err = dispatcher
            .submit(&text_job("", "Hello"))
            .expect_err("should reject");

        assert!(matches!(err, SpoolwerkError::MissingPrinter));
        assert!(dispatcher.strategy.submissions.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_payload_is_rejected_before_submission() {
        let dispatcher = PrintDispatcher::new(RecordingStrategy::default());
        let err = dispatcher
            .submit(&text_job("HP LaserJet Pro", ""))
            .expect_err("should reject");

        assert!(matches!(err, SpoolwerkError::EmptyPayload));
        assert!(dispatcher.strategy.submissions.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_printer_names_are_not_rejected_early() {
        // The dispatcher never consults the printer directory; a bad name
        // travels all the way to the backend and fails there.
        let dispatcher = PrintDispatcher::new(RecordingStrategy {
            fail_with: Some(SpoolStage::Open),
            ..RecordingStrategy::default()
        });
        let err = dispatcher
            .submit(&text_job("No Such Printer", "Hello"))
            .expect_err("backend should fail");

        assert_eq!(err.stage(), Some(SpoolStage::Open));
        assert_eq!(dispatcher.strategy.submissions.lock().unwrap().len(), 1);
    }

    #[test]
    fn backend_diagnostics_reach_the_caller_verbatim() {
        let dispatcher = PrintDispatcher::new(RecordingStrategy {
            fail_with: Some(SpoolStage::BeginDocument),
            ..RecordingStrategy::default()
        });
        let err = dispatcher
            .submit(&text_job("HP LaserJet Pro", "Hello"))
            .expect_err("backend should fail");

        assert_eq!(
            err.to_string(),
            "spooler begin-document failed: device offline"
        );
    }

    #[test]
    fn unsupported_platform_strategy_reports_both_paths() {
        let dispatcher = PrintDispatcher::new(UnsupportedStrategy);
        let err = dispatcher
            .submit(&text_job("HP LaserJet Pro", "Hello"))
            .expect_err("should be unsupported");
        assert!(matches!(err, SpoolwerkError::PlatformUnsupported));

        let err = dispatcher
            .submit(&PrintJob {
                printer_name: "Receipt Printer".into(),
                job_id: String::new(),
                payload: JobPayload::Raw(vec![0x1B]),
            })
            .expect_err("should be unsupported");
        assert!(matches!(err, SpoolwerkError::PlatformUnsupported));
    }
}
