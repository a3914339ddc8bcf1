// Copyright 2026 Screener Contributors
// SPDX-License-Identifier: Apache-2.0

//! Screener runtime library: headless compliance screening for stock tickers.
//!
//! A status request renders the screening page in an off-screen Chromium
//! tab, waits for it to settle, and classifies the snapshot; insider requests
//! summarize a rendered trade table; AI requests go to one of two providers
//! and come back in a single normalized shape.

pub mod ai;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod insider;
pub mod logging;
pub mod protocol;
pub mod renderer;
pub mod rest;
pub mod scrape;
pub mod service;

pub use error::{Result, ScreenError};
pub use service::Screener;
