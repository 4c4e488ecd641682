//! Terminal output utilities: notes, table rendering, resolution summaries.

use opsforge_config::redact::redact_for;
use opsforge_config::value::render;
use opsforge_config::{EnvExports, PropertyResolver, ResolutionResult};
use opsforge_hooks::HookReport;

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm'
            for next in chars.by_ref() {
                if next == 'm' { break; }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

/// Print a formatted INFO note to stdout.
pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

/// Print a formatted WARNING note.
pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Render a left-aligned table with the given headers and rows.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let num_cols = headers.len();
    // Compute column widths.
    let mut widths: Vec<usize> = headers.iter().map(|h| strip_ansi(h).chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            widths[i] = widths[i].max(strip_ansi(cell).chars().count());
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad_cell(h, widths[i]))
        .collect();
    out.push_str(&format!("  {}\n", header_cells.join("  ").trim_end()));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| pad_cell(row.get(i).map(String::as_str).unwrap_or(""), widths[i]))
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ").trim_end()));
    }

    out
}

fn pad_cell(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(strip_ansi(s).chars().count());
    format!("{s}{}", " ".repeat(pad))
}

// ---------------------------------------------------------------------------
// Resolution summaries
// ---------------------------------------------------------------------------

fn property_rows(properties: &[PropertyResolver]) -> Vec<Vec<String>> {
    properties
        .iter()
        .map(|p| {
            let value = p.value.as_ref().map(render).unwrap_or_default();
            let names = [Some(p.name.as_str()), p.metadata.export_env.as_deref()];
            vec![
                p.name.clone(),
                p.metadata.type_tag.clone().unwrap_or_default(),
                redact_for(names.into_iter().flatten(), &value),
                p.metadata.parameter.clone().unwrap_or_default(),
                p.metadata.export_env.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

/// Human-readable report of one resolution pass.
pub fn render_resolution(result: &ResolutionResult) -> String {
    const HEADERS: [&str; 5] = ["NAME", "TYPE", "VALUE", "PARAMETER", "EXPORT"];
    let mut out = String::new();
    let sections = [
        ("CLI options", &result.cli_bound),
        ("Plugin options", &result.options_bound),
        ("Invalid config", &result.invalid),
    ];
    for (title, properties) in sections {
        if properties.is_empty() {
            continue;
        }
        out.push_str(&format!("{title} ({}):\n", properties.len()));
        out.push_str(&render_table(&HEADERS, &property_rows(properties)));
        out.push('\n');
    }
    if !result.env.is_empty() {
        out.push_str(&format!("Environment ({}):\n", result.env.len()));
        out.push_str(&render_env(&result.env));
    }
    out
}

/// `NAME=value` lines with secret-looking names masked.
pub fn render_env(env: &EnvExports) -> String {
    env.iter()
        .map(|(k, v)| format!("  {k}={}\n", redact_for([k], v)))
        .collect()
}

/// One line per hook outcome.
pub fn render_hook_report(report: &HookReport) -> String {
    if report.outcomes.is_empty() {
        return format!("No {} hooks to run\n", report.mode);
    }
    report
        .outcomes
        .iter()
        .map(|o| {
            let status = if o.succeeded() {
                "ok".to_string()
            } else {
                match o.exit_code {
                    Some(code) => format!("failed ({code})"),
                    None => "failed (not started)".to_string(),
                }
            };
            format!("  {} [{}] {} {}ms\n", report.mode, o.script, status, o.duration.as_millis())
        })
        .collect()
}
