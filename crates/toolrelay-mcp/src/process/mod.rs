//! Tool server process management.
//!
//! # Structure
//!
//! - `ProcessSupervisor` - per-session creation, reuse and teardown of processes
//! - `ProcessHandle` - one spawned process: stdin, captured output, exit state
//! - `ProcessExit` - lifecycle state published by each process monitor
//! - `shutdown_child` - SIGTERM → SIGKILL stop with reaping

mod exit;
mod handle;
mod shutdown;
mod supervisor;

pub use exit::ProcessExit;
pub use handle::ProcessHandle;
pub use shutdown::shutdown_child;
pub use supervisor::{ProcessSupervisor, SupervisorConfig};
