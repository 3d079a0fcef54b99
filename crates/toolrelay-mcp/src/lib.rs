//! Tool server supervision and capability discovery.
//!
//! Tool servers are arbitrary child processes reached over stdio with no
//! guaranteed protocol. This crate starts and reaps them, captures their
//! output, probes them for capabilities, infers capabilities from whatever
//! they print, and correlates request/reply exchanges over stdin/stdout.
#![deny(unsafe_code)]

pub mod aggregate;
pub mod capture;
pub mod correlate;
pub mod extract;
pub mod probe;
pub mod process;
pub mod registry;

pub use aggregate::{DiscoveryOptions, NO_SERVERS_CONFIGURED, ToolAggregator};
pub use capture::{OutputBuffer, OutputCursor, StreamKind};
pub use correlate::correlate;
pub use extract::{PLACEHOLDER_DESCRIPTION, extract, is_placeholder};
pub use probe::{probe, probe_sequence};
pub use process::{
    ProcessExit, ProcessHandle, ProcessSupervisor, SupervisorConfig, shutdown_child,
};
pub use registry::SessionRegistry;
