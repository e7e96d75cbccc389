// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Benchmarks for the printer enumeration parsers.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use spoolwerk_print::directory::{parse_lpstat_printers, parse_wmi_printers};

fn wmi_fixture(count: usize) -> String {
    let records: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"Name": "Printer {i}", "Default": {}, "Status": "{}"}}"#,
                i == 0,
                if i % 2 == 0 { "OK" } else { "4" }
            )
        })
        .collect();
    format!("[{}]", records.join(","))
}

fn lpstat_fixture(count: usize) -> String {
    (0..count)
        .map(|i| format!("Printer_{i} accepting requests since Tue 04 Aug 2026\n"))
        .collect()
}

fn bench_parsers(c: &mut Criterion) {
    let wmi = wmi_fixture(32);
    c.bench_function("parse_wmi_printers/32", |b| {
        b.iter(|| parse_wmi_printers(black_box(&wmi)).expect("parse"))
    });

    let lpstat = lpstat_fixture(32);
    c.bench_function("parse_lpstat_printers/32", |b| {
        b.iter(|| parse_lpstat_printers(black_box(&lpstat), Some("Printer_0")))
    });
}

criterion_group!(benches, bench_parsers);
criterion_main!(benches);
