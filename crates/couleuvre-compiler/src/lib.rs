//! Subprocess-backed compiler gateway.
//!
//! The language server never links the Vyper compiler: it runs small
//! generated Python scripts inside an environment that has the right
//! compiler installed, and reads JSON from stdout. Two operations exist:
//! - [`CompilerGateway::parse`]: source text → JSON AST (fast, feeds
//!   navigation)
//! - [`CompilerGateway::compile`]: source text → semantic diagnostics
//!   (slow, feeds the problems panel)
//!
//! Callers must tolerate multi-second latency and occasional failure
//! from this collaborator; the scheduler runs it off the protocol loop
//! and retains the previous good state on failure.

pub mod diagnostics;
pub mod env;
pub mod gateway;
pub mod version;

mod error;

pub use error::GatewayError;
pub use gateway::{CompilerGateway, ParseRequest, ParsedSource, SubprocessGateway};
