//! Browser automation boundary for the probe harness.
//!
//! Exposes the [`BrowserActions`] session trait and the [`BrowserLauncher`]
//! factory trait the harness is written against, plus a Chrome DevTools
//! implementation ([`BrowserEngine`]) launched headless and container-safe.

pub mod actions;
pub mod engine;
pub mod error;
pub mod js;
pub mod launch;

pub use actions::{BrowserActions, BrowserLauncher, FrameRef, LoadState, WaitUntil};
pub use engine::{BrowserEngine, ChromiumLauncher};
pub use error::{BrowserError, Result};
pub use launch::LaunchOptions;
