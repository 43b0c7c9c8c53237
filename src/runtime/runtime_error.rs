use thiserror::Error;

use crate::runtime::InstanceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// One instance ran more instructions than its budget allows.
    #[error("instance {instance}: execution step limit exceeded ({limit})")]
    StepLimitExceeded { instance: InstanceId, limit: usize },

    /// The whole fork tree ran more instructions than the run allows.
    #[error("global step limit exceeded ({limit}) - runaway fork tree or infinite loop")]
    GlobalStepLimitExceeded { limit: usize },

    /// A fork was refused; the forking instance keeps running.
    #[error("instance {instance}: fork refused, {live} live instances (budget {budget})")]
    ForkBudgetExceeded {
        instance: InstanceId,
        live: usize,
        budget: usize,
    },

    /// `>` moved past the last cell under the `Reject` overflow policy.
    #[error("instance {instance}: data pointer moved past the tape end (capacity {capacity})")]
    TapeOverflow {
        instance: InstanceId,
        capacity: usize,
    },

    #[error("no registered instance with id {instance}")]
    UnknownInstance { instance: InstanceId },
}

impl RuntimeError {
    /// Recoverable errors leave the run going; everything else ends it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RuntimeError::ForkBudgetExceeded { .. })
    }
}
