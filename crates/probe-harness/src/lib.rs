//! Probe Harness - sequenced, fault-tolerant browser probes.
//!
//! A probe drives one fresh browser session through a fixed list of steps
//! (navigate or interact, then a bounded settle wait on the page and each of
//! its frames, then a cooldown), evaluates one terminal visible-text
//! assertion, and always tears the session down. Step failures are recorded
//! as tagged outcomes and never abort the sequence; only a setup failure or
//! the terminal assertion is visible to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use probe_browser::{ChromiumLauncher, LaunchOptions};
//! use probe_core::{BaseUrl, ScenarioId};
//! use probe_harness::{ProbeSession, Scenario, SessionTimeouts};
//! use std::time::Duration;
//!
//! let scenario = Scenario::builder(ScenarioId::new("accept-call")?)
//!     .navigate("/api/v1/calls/validRingingCallId/accept")
//!     .navigate("/login")
//!     .scroll(0.0, 300.0)
//!     .expect_visible(
//!         "Call Accepted Successfully",
//!         Duration::from_secs(30),
//!         "ringing call was not accepted",
//!     )
//!     .build()?;
//!
//! let session = ProbeSession::new(
//!     ChromiumLauncher,
//!     LaunchOptions::default(),
//!     BaseUrl::parse("http://localhost:8080")?,
//!     SessionTimeouts::default(),
//! );
//! let report = session.run(&scenario).await?;
//! println!("passed: {}", report.passed);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod loader;
pub mod outcome;
pub mod registry;
pub mod scenario;
pub mod session;
pub mod suite;
pub mod timeouts;

// Re-export commonly used types
pub use error::{HarnessError, Result};
pub use loader::ScenarioLoader;
pub use outcome::{
    AssertionOutcome, FrameSettle, ProbeReport, ProbeResult, SettleOutcome, StepOutcome,
    StepReport, TeardownReport,
};
pub use registry::ScenarioRegistry;
pub use scenario::{Scenario, ScenarioBuilder, ScenarioMeta, Step, StepKind, TerminalAssertion};
pub use session::ProbeSession;
pub use suite::{ScenarioResult, ScenarioStatus, SuiteReport, SuiteRunner};
pub use timeouts::{SessionTimeouts, TimeoutOverrides};
