//! # Execution
//!
//! A [`Vm`] runs one instance of a [`Program`](crate::bytecode::Program).
//! Programs that use `FORK` are driven by a [`Scheduler`], which owns every
//! instance of the run and steps them round-robin, one instruction at a time,
//! on the calling thread.

pub mod input;
pub mod runtime_error;
pub mod scheduler;
pub mod snapshot;
pub mod tape;
pub mod vm;

/// Identifier of a VM instance within one run. The first instance is 0.
pub type InstanceId = u32;

pub use input::{InputQueue, InputSplit};
pub use runtime_error::RuntimeError;
pub use scheduler::{RunError, Scheduler, SchedulerConfig};
pub use snapshot::{ForkRefusal, InstanceResult, InstanceSnapshot, RunReport};
pub use tape::{Tape, TapeOverflow};
pub use vm::{Step, Vm, VmConfig};
