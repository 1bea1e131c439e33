//! Core infrastructure for couleuvre.
//!
//! This crate provides the language-agnostic plumbing the analysis engine
//! and server are built on:
//! - Editor-protocol value types (positions, ranges, locations, diagnostics)
//! - `file://` URI conversion helpers
//! - Text utilities for extracting dotted identifiers at a cursor
//! - Workspace source-file discovery with text prefiltering

pub mod protocol;
pub mod text;
pub mod uri;
pub mod workspace;
