use std::collections::BTreeMap;

use indexmap::IndexMap;
use thiserror::Error;

use crate::bytecode::Program;
use crate::runtime::InstanceId;
use crate::runtime::input::{InputQueue, InputSplit};
use crate::runtime::runtime_error::RuntimeError;
use crate::runtime::snapshot::{ForkRefusal, InstanceResult, InstanceSnapshot, RunReport};
use crate::runtime::vm::{Step, Vm, VmConfig};

pub const DEFAULT_MAX_LIVE_INSTANCES: usize = 8;
pub const DEFAULT_MAX_GLOBAL_STEPS: usize = 10_000_000;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Fork-bomb guard: at most this many non-halted instances at once.
    pub max_live_instances: usize,
    /// Instructions the whole fork tree may execute; `None` disables it.
    pub max_global_steps: Option<usize>,
    pub input_split: InputSplit,
    pub vm: VmConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            max_live_instances: DEFAULT_MAX_LIVE_INSTANCES,
            max_global_steps: Some(DEFAULT_MAX_GLOBAL_STEPS),
            input_split: InputSplit::default(),
            vm: VmConfig::default(),
        }
    }
}

/// A fatal error, with whatever the run had produced up to that point.
#[derive(Debug, Error)]
#[error("run aborted after {} steps", .partial.total_steps)]
pub struct RunError {
    #[source]
    pub error: RuntimeError,
    pub partial: RunReport,
}

/// Round-robin driver for every instance spawned from one program run.
///
/// Instances live in an `IndexMap` keyed by id, so iteration follows
/// registration order, which is also ascending id order since ids only grow.
/// Parents and children refer to each other by id only.
pub struct Scheduler<'p> {
    program: &'p Program,
    config: SchedulerConfig,
    instances: IndexMap<InstanceId, Vm>,
    // Results are taken the moment an instance halts, before it is purged.
    finished: BTreeMap<InstanceId, InstanceResult>,
    refused_forks: Vec<ForkRefusal>,
    next_id: InstanceId,
    global_steps: usize,
}

impl<'p> Scheduler<'p> {
    /// Register instance 0, owning all of `input`.
    pub fn new(program: &'p Program, input: impl Into<InputQueue>, config: SchedulerConfig) -> Self {
        let mut instances = IndexMap::new();
        instances.insert(0, Vm::with_config(input, config.vm));
        Scheduler {
            program,
            config,
            instances,
            finished: BTreeMap::new(),
            refused_forks: Vec::new(),
            next_id: 1,
            global_steps: 0,
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Vm> {
        self.instances.get(&id)
    }

    /// Registered instances in registration order.
    pub fn instances(&self) -> impl Iterator<Item = &Vm> {
        self.instances.values()
    }

    pub fn live_count(&self) -> usize {
        self.instances.values().filter(|vm| !vm.is_halted()).count()
    }

    pub fn is_done(&self) -> bool {
        self.live_count() == 0
    }

    pub fn global_steps(&self) -> usize {
        self.global_steps
    }

    pub fn refused_forks(&self) -> &[ForkRefusal] {
        &self.refused_forks
    }

    pub fn snapshots(&self) -> Vec<InstanceSnapshot> {
        self.instances
            .values()
            .map(|vm| vm.snapshot(self.program))
            .collect()
    }

    fn check_global_budget(&self) -> Result<(), RuntimeError> {
        match self.config.max_global_steps {
            Some(max) if self.global_steps >= max => {
                Err(RuntimeError::GlobalStepLimitExceeded { limit: max })
            }
            _ => Ok(()),
        }
    }

    /// One round: step every instance registered at the start of the round
    /// once, in id order. Instances forked during the round wait for the
    /// next one. Returns `false` when nothing could be stepped.
    pub fn sweep(&mut self) -> Result<bool, RuntimeError> {
        let program = self.program;
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        let mut progressed = false;

        for id in ids {
            let Some(vm) = self.instances.get(&id) else {
                continue;
            };
            if vm.is_halted() {
                continue;
            }
            // running off the end halts for free
            if vm.ip() < program.len() {
                self.check_global_budget()?;
            }

            let vm = self
                .instances
                .get_mut(&id)
                .ok_or(RuntimeError::UnknownInstance { instance: id })?;
            let step = vm.exec(program)?;
            progressed = true;
            // only instructions that actually ran count against the run
            if step != Step::Halted {
                self.global_steps += 1;
            }

            match step {
                Step::Continue => {}
                Step::Halted => {
                    tracing::debug!(instance = id, steps = vm.steps(), "instance halted");
                    self.finished.insert(id, vm.result());
                }
                Step::Fork => match self.fork(id) {
                    Ok(child) => {
                        tracing::debug!(parent = id, child, live = self.live_count(), "fork");
                    }
                    Err(err) if !err.is_fatal() => {
                        tracing::warn!("{}", err);
                    }
                    Err(err) => return Err(err),
                },
            }
        }

        self.purge_halted();
        Ok(progressed)
    }

    fn purge_halted(&mut self) {
        self.instances.retain(|_, vm| !vm.is_halted());
    }

    /// Resolve the `FORK` instance `id` is sitting on.
    ///
    /// On refusal the instance moves past the `FORK` with its cell untouched,
    /// and the refusal is logged in the report.
    pub(crate) fn fork(&mut self, id: InstanceId) -> Result<InstanceId, RuntimeError> {
        self.purge_halted();
        let live = self.instances.len();
        let budget = self.config.max_live_instances;
        let split = self.config.input_split;

        let parent = self
            .instances
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownInstance { instance: id })?;

        if live >= budget {
            self.refused_forks.push(ForkRefusal {
                instance: id,
                instruction_pointer: parent.ip(),
                live,
                budget,
            });
            parent.skip_fork();
            return Err(RuntimeError::ForkBudgetExceeded {
                instance: id,
                live,
                budget,
            });
        }

        let child_id = self.next_id;
        self.next_id += 1;
        let child = parent.spawn_child(child_id, split);
        self.instances.insert(child_id, child);
        Ok(child_id)
    }

    /// Results so far, by id: finished instances plus the current state of
    /// any that are still registered.
    pub fn report(&self) -> RunReport {
        let mut results = self.finished.clone();
        for (id, vm) in &self.instances {
            results.entry(*id).or_insert_with(|| vm.result());
        }
        RunReport {
            instances: results.into_values().collect(),
            refused_forks: self.refused_forks.clone(),
            total_steps: self.global_steps,
        }
    }

    /// Sweep until every instance has halted.
    pub fn run(&mut self) -> Result<RunReport, RunError> {
        while !self.is_done() {
            match self.sweep() {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    return Err(RunError {
                        error,
                        partial: self.report(),
                    });
                }
            }
        }
        Ok(self.report())
    }
}
