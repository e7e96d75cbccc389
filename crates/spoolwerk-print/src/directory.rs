// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer directory -- enumerates installed printers per host platform.
//
// Windows asks WMI through PowerShell and gets JSON back; Unix asks
// `lpstat`.  Each `detect()` call re-queries the live OS state: there is no
// cache and no invalidation to reason about.  Ordering reflects raw
// enumeration order and is not guaranteed stable across calls.
//
// The output parsers are pure functions compiled on every platform so the
// parsing behavior is unit-testable without the underlying OS tools.

use serde::Deserialize;
use tracing::debug;

use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{Printer, PrinterStatus};

/// Enumerate the printers installed on this host.
///
/// Returns records in raw enumeration order, or `PlatformUnsupported` when
/// no enumeration strategy exists for the host, or `PlatformQuery` when the
/// query itself fails (command missing, permission denied, bad output).
pub fn detect() -> Result<Vec<Printer>> {
    #[cfg(windows)]
    {
        detect_windows()
    }
    #[cfg(unix)]
    {
        detect_unix()
    }
    #[cfg(not(any(unix, windows)))]
    {
        Err(SpoolwerkError::PlatformUnsupported)
    }
}

// ---------------------------------------------------------------------------
// Windows: WMI via PowerShell
// ---------------------------------------------------------------------------

/// One printer record as PowerShell's `ConvertTo-Json` emits it.
#[derive(Debug, Deserialize)]
struct WmiPrinter {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Default", default)]
    default: bool,
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

impl From<WmiPrinter> for Printer {
    fn from(wmi: WmiPrinter) -> Self {
        Self {
            name: wmi.name,
            status: match wmi.status.as_deref() {
                Some(code) => PrinterStatus::from_wmi_code(code),
                None => PrinterStatus::Unknown,
            },
            is_default: wmi.default,
        }
    }
}

/// Parse PowerShell `ConvertTo-Json` output for `Win32_Printer`.
///
/// `ConvertTo-Json` emits an array for several printers but a bare object
/// when exactly one is installed, and nothing at all when none are.
pub fn parse_wmi_printers(output: &str) -> Result<Vec<Printer>> {
    let trimmed = output.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(list) = serde_json::from_str::<Vec<WmiPrinter>>(trimmed) {
        return Ok(list.into_iter().map(Printer::from).collect());
    }

    let single: WmiPrinter = serde_json::from_str(trimmed).map_err(|e| {
        SpoolwerkError::PlatformQuery(format!("unexpected PowerShell printer output: {e}"))
    })?;
    Ok(vec![single.into()])
}

#[cfg(windows)]
fn detect_windows() -> Result<Vec<Printer>> {
    let output = run_enumeration(
        "powershell",
        &[
            "-Command",
            "Get-WmiObject -Class Win32_Printer | Select-Object Name, Default, Status | ConvertTo-Json",
        ],
    )?;
    let printers = parse_wmi_printers(&output)?;
    debug!(count = printers.len(), "enumerated printers via WMI");
    Ok(printers)
}

// ---------------------------------------------------------------------------
// Unix: lpstat
// ---------------------------------------------------------------------------

/// Parse `lpstat -a` output: one destination per non-blank line, the queue
/// name is the first whitespace-delimited token.
///
/// This query carries no status field, so every record reports `Ready`.
pub fn parse_lpstat_printers(output: &str, default_name: Option<&str>) -> Vec<Printer> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(|name| Printer {
            name: name.to_string(),
            status: PrinterStatus::Ready,
            is_default: default_name == Some(name),
        })
        .collect()
}

/// Parse `lpstat -d` output into the default destination name, if one is
/// configured.
pub fn parse_lpstat_default(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("system default destination:")
            .map(|rest| rest.trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

#[cfg(unix)]
fn detect_unix() -> Result<Vec<Printer>> {
    let output = match run_enumeration("lpstat", &["-a"]) {
        Ok(output) => output,
        // CUPS exits non-zero when no destinations exist at all; that is an
        // empty directory, not an enumeration failure.
        Err(SpoolwerkError::PlatformQuery(message))
            if message.contains("No destinations added") =>
        {
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    // Default lookup is best-effort; a failure here must not fail detect().
    let default_name = run_enumeration("lpstat", &["-d"])
        .ok()
        .and_then(|out| parse_lpstat_default(&out));

    let printers = parse_lpstat_printers(&output, default_name.as_deref());
    debug!(count = printers.len(), "enumerated printers via lpstat");
    Ok(printers)
}

// ---------------------------------------------------------------------------
// Enumeration command runner
// ---------------------------------------------------------------------------

#[cfg(any(unix, windows))]
fn run_enumeration(program: &str, args: &[&str]) -> Result<String> {
    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpoolwerkError::PlatformQuery(format!("{program} not found"))
            } else {
                SpoolwerkError::PlatformQuery(format!("{program}: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SpoolwerkError::PlatformQuery(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wmi_array_output_parses_in_order() {
        let output = r#"[
            {"Name": "HP LaserJet Pro", "Default": true, "Status": "OK"},
            {"Name": "Receipt Printer", "Default": false, "Status": "4"},
            {"Name": "Old Dot Matrix", "Default": false, "Status": "12"}
        ]"#;

        let printers = parse_wmi_printers(output).expect("parse");
        assert_eq!(printers.len(), 3);
        assert_eq!(printers[0].name, "HP LaserJet Pro");
        assert_eq!(printers[0].status, PrinterStatus::Ready);
        assert!(printers[0].is_default);
        assert_eq!(printers[1].status, PrinterStatus::Printing);
        assert_eq!(printers[2].status, PrinterStatus::Unknown);
    }

    #[test]
    fn wmi_single_object_output_parses_as_one_record() {
        // ConvertTo-Json drops the array brackets for a single printer.
        let output = r#"{"Name": "Receipt Printer", "Default": false, "Status": "5"}"#;

        let printers = parse_wmi_printers(output).expect("parse");
        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].name, "Receipt Printer");
        assert_eq!(printers[0].status, PrinterStatus::Warmup);
    }

    #[test]
    fn wmi_empty_output_is_an_empty_directory() {
        assert!(parse_wmi_printers("").expect("parse").is_empty());
        assert!(parse_wmi_printers("  \n").expect("parse").is_empty());
    }

    #[test]
    fn wmi_null_status_is_unknown() {
        let output = r#"{"Name": "Receipt Printer", "Default": false, "Status": null}"#;
        let printers = parse_wmi_printers(output).expect("parse");
        assert_eq!(printers[0].status, PrinterStatus::Unknown);
    }

    #[test]
    fn wmi_garbage_output_is_a_query_failure() {
        let err = parse_wmi_printers("Get-WmiObject : Access denied").expect_err("should fail");
        assert!(matches!(err, SpoolwerkError::PlatformQuery(_)));
    }

    #[test]
    fn lpstat_lines_parse_to_ready_printers() {
        let output = "\
HP_LaserJet_Pro accepting requests since Tue 04 Aug 2026
Receipt_Printer accepting requests since Tue 04 Aug 2026

";
        let printers = parse_lpstat_printers(output, Some("Receipt_Printer"));
        assert_eq!(printers.len(), 2);
        assert_eq!(printers[0].name, "HP_LaserJet_Pro");
        assert_eq!(printers[0].status, PrinterStatus::Ready);
        assert!(!printers[0].is_default);
        assert!(printers[1].is_default);
    }

    #[test]
    fn lpstat_empty_output_is_an_empty_directory() {
        assert!(parse_lpstat_printers("", None).is_empty());
        assert!(parse_lpstat_printers("\n\n", None).is_empty());
    }

    #[test]
    fn lpstat_default_destination_parses() {
        assert_eq!(
            parse_lpstat_default("system default destination: Receipt_Printer\n"),
            Some("Receipt_Printer".into())
        );
        assert_eq!(parse_lpstat_default("no system default destination\n"), None);
        assert_eq!(parse_lpstat_default(""), None);
    }
}
