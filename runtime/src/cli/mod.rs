//! CLI subcommand implementations for the `screener` binary.

pub mod analyze_cmd;
pub mod classify_cmd;
pub mod doctor;
pub mod insider_cmd;
pub mod output;
pub mod serve;
pub mod status_cmd;
