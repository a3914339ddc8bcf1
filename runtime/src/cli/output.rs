//! Output helpers shared by all subcommands.
//!
//! Global flags are published through environment variables by `main` so
//! every command can check them without threading them through.

use crate::classifier::ComplianceStatus;
use serde::Serialize;

pub const JSON_ENV: &str = "SCREENER_OUTPUT_JSON";
pub const QUIET_ENV: &str = "SCREENER_OUTPUT_QUIET";

pub fn is_json() -> bool {
    flag(JSON_ENV)
}

pub fn is_quiet() -> bool {
    flag(QUIET_ENV)
}

fn flag(var: &str) -> bool {
    std::env::var(var).map(|v| v == "1").unwrap_or(false)
}

/// Pretty-print any serializable value to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to encode output: {e}"),
    }
}

/// Status line marker in the same `[OK]`/`[!!]` style as `doctor`.
pub fn badge(status: ComplianceStatus) -> &'static str {
    match status {
        ComplianceStatus::Halal => "[OK]",
        ComplianceStatus::NotHalal => "[!!]",
        ComplianceStatus::Doubtful | ComplianceStatus::Unknown => "[??]",
        ComplianceStatus::Error => "[ERR]",
    }
}

/// `$1234567.0` → `$1,234,567`.
pub fn money(value: f64) -> String {
    let whole = value.abs().round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}
