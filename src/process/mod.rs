//! External command plumbing.
//!
//! Commands are built as structured argument vectors ([`CommandSpec`]) and handed
//! straight to the process spawn API; nothing on the host side goes through a
//! shell. Execution sits behind the [`CommandRunner`] trait so the task
//! dispatcher and the bootstrap sequencer can be driven by a scripted runner in
//! tests.

pub mod runner;
pub mod spec;

#[cfg(test)]
pub(crate) mod scripted;

pub use runner::{CommandOutput, CommandRunner, DryRunRunner, SystemRunner};
pub use spec::{CommandSpec, StdioMode};
