// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows spooler backend over winspool.drv.
//
// Implements `SpoolBackend` with the Win32 print spooler API: OpenPrinterW,
// StartDocPrinterW (declaring the RAW or TEXT datatype), StartPagePrinter,
// WritePrinter, and the matching end/close calls.  Declaring RAW instructs
// the spooler to forward bytes to the device with no reinterpretation, which
// is the only correct transport for device control-code streams.  Both
// payload kinds run through this same handle session; there is no temp-file
// fallback path.

use std::ffi::OsStr;
use std::iter::once;
use std::os::windows::ffi::OsStrExt;

use windows_sys::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_INVALID_PRINTER_NAME, GetLastError, HANDLE,
};
use windows_sys::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, StartDocPrinterW,
    StartPagePrinter, WritePrinter,
};

use spoolwerk_core::error::{Result, SpoolStage, SpoolwerkError};

use crate::spool::{SpoolBackend, SpoolDataType};

/// One open winspool printer handle.
///
/// Ownership tracks the open/close contract: the handle is created by
/// `open` and consumed by `close`.
pub struct PrinterHandle {
    raw: HANDLE,
}

/// Spool backend over the Win32 print spooler.
#[derive(Debug, Default)]
pub struct WinspoolBackend;

/// NUL-terminated UTF-16 for Win32 wide-string parameters.
fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(once(0)).collect()
}

/// The last OS error as displayable text.
fn last_error_text() -> String {
    std::io::Error::last_os_error().to_string()
}

impl SpoolBackend for WinspoolBackend {
    type Handle = PrinterHandle;

    fn open(&self, printer_name: &str) -> Result<PrinterHandle> {
        let name = wide(printer_name);
        let mut raw: HANDLE = std::ptr::null_mut();

        // SAFETY: `name` is NUL-terminated and outlives the call; `raw` is a
        // valid out-pointer; a null PRINTER_DEFAULTSW requests default access.
        let ok = unsafe { OpenPrinterW(name.as_ptr(), &mut raw, std::ptr::null()) };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(match code {
                ERROR_INVALID_PRINTER_NAME => {
                    SpoolwerkError::PrinterNotFound(printer_name.to_string())
                }
                ERROR_ACCESS_DENIED => SpoolwerkError::AccessDenied(printer_name.to_string()),
                _ => SpoolwerkError::spool(SpoolStage::Open, last_error_text()),
            });
        }
        Ok(PrinterHandle { raw })
    }

    fn begin_document(
        &self,
        handle: &mut PrinterHandle,
        label: &str,
        data_type: SpoolDataType,
    ) -> Result<u32> {
        let mut doc_name = wide(label);
        let mut datatype = wide(data_type.spooler_name());
        let doc_info = DOC_INFO_1W {
            pDocName: doc_name.as_mut_ptr(),
            pOutputFile: std::ptr::null_mut(),
            pDatatype: datatype.as_mut_ptr(),
        };

        // SAFETY: the handle is open and the DOC_INFO_1W buffers outlive the
        // call.  A zero return is failure; otherwise it is the spool job id.
        let spool_job_id = unsafe { StartDocPrinterW(handle.raw, 1, &doc_info) };
        if spool_job_id == 0 {
            return Err(SpoolwerkError::spool(
                SpoolStage::BeginDocument,
                last_error_text(),
            ));
        }
        Ok(spool_job_id)
    }

    fn begin_page(&self, handle: &mut PrinterHandle) -> Result<()> {
        // SAFETY: the handle is open and a document has been started.
        let ok = unsafe { StartPagePrinter(handle.raw) };
        if ok == 0 {
            return Err(SpoolwerkError::spool(
                SpoolStage::BeginPage,
                last_error_text(),
            ));
        }
        Ok(())
    }

    fn write(&self, handle: &mut PrinterHandle, bytes: &[u8]) -> Result<usize> {
        let len = u32::try_from(bytes.len()).map_err(|_| {
            SpoolwerkError::spool(SpoolStage::Write, "payload exceeds 4 GiB".to_string())
        })?;
        let mut written: u32 = 0;

        // SAFETY: `bytes` is valid for `len` bytes and `written` is a valid
        // out-pointer.  The spooler copies the buffer before returning.
        let ok = unsafe {
            WritePrinter(
                handle.raw,
                bytes.as_ptr().cast(),
                len,
                &mut written,
            )
        };
        if ok == 0 {
            return Err(SpoolwerkError::spool(SpoolStage::Write, last_error_text()));
        }
        // The session layer compares this count against the buffer length
        // and raises PartialWrite on a shortfall.
        Ok(written as usize)
    }

    fn end_page(&self, handle: &mut PrinterHandle) -> Result<()> {
        // SAFETY: the handle is open and a page has been started.
        let ok = unsafe { EndPagePrinter(handle.raw) };
        if ok == 0 {
            return Err(SpoolwerkError::spool(SpoolStage::EndPage, last_error_text()));
        }
        Ok(())
    }

    fn end_document(&self, handle: &mut PrinterHandle) -> Result<()> {
        // SAFETY: the handle is open and a document has been started.
        let ok = unsafe { EndDocPrinter(handle.raw) };
        if ok == 0 {
            return Err(SpoolwerkError::spool(
                SpoolStage::EndDocument,
                last_error_text(),
            ));
        }
        Ok(())
    }

    fn close(&self, handle: PrinterHandle) -> Result<()> {
        // SAFETY: the handle was returned by OpenPrinterW and is consumed
        // here, so it cannot be closed twice.
        let ok = unsafe { ClosePrinter(handle.raw) };
        if ok == 0 {
            return Err(SpoolwerkError::spool(SpoolStage::Close, last_error_text()));
        }
        Ok(())
    }
}
