//! Shared privileged shell-session core for the `sufm` file manager.
//!
//! The crate detects elevation and utility binaries on the host
//! ([`toolset`]), starts interactive interpreter sessions in the best
//! available mode ([`factory`]), frames commands and their results over a
//! session's byte streams ([`framing`], [`session`]), and shares exactly one
//! live session between concurrent operations ([`registry`]). Consumers
//! that find no usable interpreter degrade: every entry point reports
//! absence instead of failing.

/// Command requests and their structured results.
pub mod command;
/// Error taxonomy and result alias.
pub mod error;
/// Session creation strategy and verification.
pub mod factory;
/// Sentinel framing of commands over interpreter streams.
pub mod framing;
/// The single-session holder and operation leases.
pub mod registry;
/// Live interpreter session handle.
pub mod session;
/// Host binary discovery.
pub mod toolset;

pub use command::{CaptureMode, CommandRequest, CommandResult};
pub use error::{Result, ShellError};
pub use factory::{DEFAULT_HANDSHAKE_TIMEOUT, SessionFactory, SystemShellFactory};
pub use framing::{FrameParser, FramePhase};
pub use registry::{SessionLease, ShellRegistry};
pub use session::{SessionMode, ShellSession};
pub use toolset::{ToolsetAvailability, probe};
