// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Print — printer directory, job dispatcher, and the two spooler
// backends: the native handle-based spool session (Windows) and queued
// submission via the OS print queue command (everywhere else).  This crate
// bridges between the core domain types defined in `spoolwerk-core` and the
// host platform's printing infrastructure.

pub mod directory;
pub mod dispatcher;
pub mod queue;
pub mod spool;

#[cfg(windows)]
pub mod winspool;

pub use dispatcher::{platform_dispatcher, PrintDispatcher, SubmitStrategy};
pub use queue::{LpQueue, QueueBackend, QueuedSubmission};
pub use spool::{NativeSpool, SpoolBackend, SpoolDataType};
