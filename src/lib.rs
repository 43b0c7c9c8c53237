//! # bfork
//!
//! An interpreter for the eight-instruction tape language, extended with a
//! `FORK` instruction that clones the running instance.
//!
//! Source goes through the [`frontend`] (filtering to the instruction
//! alphabet), then [`bytecode`] (loop validation and the jump table), and is
//! executed by [`runtime`]: a single [`runtime::Vm`], or a
//! [`runtime::Scheduler`] interleaving every instance a program forks.

pub mod bytecode;
pub mod error;
pub mod frontend;
pub mod runtime;

pub use error::{Error, Result};

use crate::bytecode::Program;
use crate::frontend::LoaderConfig;
use crate::runtime::{InstanceResult, RunReport, Scheduler, SchedulerConfig, Vm};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub loader: LoaderConfig,
    pub scheduler: SchedulerConfig,
}

/// Load `source` and run it under the fork scheduler.
pub fn execute(source: &str, input: &[u8], config: &Config) -> Result<RunReport> {
    let program = Program::load_with(source, config.loader.clone())?;
    let report = Scheduler::new(&program, input, config.scheduler).run()?;
    Ok(report)
}

/// Load `source` and run it on one VM; `FORK` is skipped.
pub fn execute_single(source: &str, input: &[u8], config: &Config) -> Result<InstanceResult> {
    let program = Program::load_with(source, config.loader.clone())?;
    let mut vm = Vm::with_config(input, config.scheduler.vm);
    match vm.run(&program) {
        Ok(()) => Ok(vm.result()),
        Err(error) => Err(Error::Runtime {
            error,
            partial: Box::new(RunReport {
                total_steps: vm.steps(),
                instances: vec![vm.result()],
                refused_forks: Vec::new(),
            }),
        }),
    }
}
