//! Attach LLDB to Bazel-built apps.
//!
//! Bazel compiles inside a sandboxed execution root, so paths embedded in debug information do
//! not point at the files a developer edits. This crate loads the launch metadata of a running
//! app, configures LLDB's working directory and `target.source-map` to undo the relocation, then
//! selects the simulator or device and attaches to the process.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod log;
pub mod orchestrator;
pub mod sourcemap;
pub mod terminate;

pub use error::Error;
