//! Couleuvre: a language server for Vyper smart contracts.
//!
//! This crate is the server shell around the analysis engine:
//! - [`cache`]: the explicitly owned URI → module map and the open
//!   document store
//! - [`scheduler`]: debounced, cancellable reparse and diagnostics
//!   pipelines with background import prefetch
//! - [`server`]: document lifecycle and the feature handlers, each a
//!   pure function of cached state and a position
//! - [`transport`]: a thin Content-Length-framed JSON-RPC loop over
//!   stdio
//!
//! The feature handlers never block on the compiler for the document
//! being edited: navigation uses the last successfully parsed module,
//! and diagnostics lag by the debounce window under rapid typing.

pub mod cache;
pub mod scheduler;
pub mod server;
pub mod transport;
