//! Plain-data views of VM instances, for presentation layers.
//!
//! Everything here is `serde`-serializable and carries ids instead of
//! references, so a report can be encoded (postcard) and inspected without
//! the VM that produced it.

use serde::{Deserialize, Serialize};

use crate::frontend::Instruction;
use crate::runtime::InstanceId;

/// Live state of one instance, taken between steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: InstanceId,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
    pub data_pointer: usize,
    pub instruction_pointer: usize,
    /// `None` once the pointer is past the end of the program.
    pub current_instruction: Option<Instruction>,
    pub halted: bool,
}

/// Final (or, after a fatal error, last known) state of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceResult {
    pub id: InstanceId,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
    pub output: Vec<u8>,
    pub data_pointer: usize,
    /// Tape up to the last non-zero cell or the data pointer.
    pub tape: Vec<u8>,
    pub steps: usize,
    pub halted: bool,
}

impl InstanceResult {
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// A fork attempt turned down by the live-instance budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkRefusal {
    pub instance: InstanceId,
    /// Index of the refused `FORK`.
    pub instruction_pointer: usize,
    pub live: usize,
    pub budget: usize,
}

/// Everything a run produced, ordered by instance id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub instances: Vec<InstanceResult>,
    pub refused_forks: Vec<ForkRefusal>,
    pub total_steps: usize,
}

impl RunReport {
    pub fn instance(&self, id: InstanceId) -> Option<&InstanceResult> {
        self.instances.iter().find(|r| r.id == id)
    }

    /// `(id, parent)` for every instance: the shape of the fork tree.
    pub fn lineage(&self) -> Vec<(InstanceId, Option<InstanceId>)> {
        self.instances.iter().map(|r| (r.id, r.parent)).collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
