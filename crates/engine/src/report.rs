// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Final run summary printed to stdout after the terminal is released.

use crate::scheduler::RunReport;
use herd_core::{format_count, TokenUsage};

const SEPARATOR_WIDTH: usize = 44;

/// Print the run summary: totals, failure details, and (for the structured
/// backend with any recorded usage) the aggregate token block.
pub fn print_summary(report: &RunReport) {
    if let Some(reason) = &report.nothing_to_do {
        println!("{reason}");
        return;
    }

    println!();
    println!(
        "Total: {}  Success: {}  Failed: {}",
        report.total,
        report.succeeded,
        report.failures.len()
    );

    if !report.failures.is_empty() {
        println!();
        println!("Failed jobs:");
        for failure in &report.failures {
            println!("  {} (exit {})", failure.code_file, failure.exit_code);
            println!("    {}", failure.error);
            println!("    out: {}", failure.out_log.display());
            println!("    err: {}", failure.err_log.display());
        }
    }

    if report.backend.has_structured_stream() && report.aggregate.total() > 0 {
        print_usage_block(&report.aggregate);
    }
}

fn print_usage_block(usage: &TokenUsage) {
    let sep = "─".repeat(SEPARATOR_WIDTH);
    println!();
    println!("{sep}");
    println!("Token usage");
    println!("{sep}");
    println!("  Input tokens:          {:>14}", format_count(usage.input_tokens));
    println!(
        "  Cache creation tokens: {:>14}",
        format_count(usage.cache_creation_tokens)
    );
    println!(
        "  Cache read tokens:     {:>14}",
        format_count(usage.cache_read_tokens)
    );
    println!(
        "  Output tokens:         {:>14}",
        format_count(usage.output_tokens)
    );
    if usage.ephemeral_5m_tokens > 0 || usage.ephemeral_1h_tokens > 0 {
        println!(
            "  Ephemeral (5m):        {:>14}",
            format_count(usage.ephemeral_5m_tokens)
        );
        println!(
            "  Ephemeral (1h):        {:>14}",
            format_count(usage.ephemeral_1h_tokens)
        );
    }
    println!("  Total tokens:          {:>14}", format_count(usage.total()));
    println!("{sep}");
}
