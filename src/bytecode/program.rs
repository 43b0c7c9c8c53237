use crate::bytecode::jump_table::JumpTable;
use crate::bytecode::program_error::MalformedProgram;
use crate::frontend::instruction::Instruction;
use crate::frontend::loader::{Filtered, Loader, LoaderConfig};

/// A loaded, well-formed program.
///
/// Immutable after loading. Every VM running this program borrows it; the
/// jump table is never copied per instance.
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instruction>,
    /// Source byte offset of each instruction.
    offsets: Vec<usize>,
    jumps: JumpTable,
}

impl Program {
    /// Filter `source` with the default fork syntax and validate its loops.
    pub fn load(source: &str) -> Result<Self, MalformedProgram> {
        Self::load_with(source, LoaderConfig::default())
    }

    pub fn load_with(source: &str, config: LoaderConfig) -> Result<Self, MalformedProgram> {
        Self::from_filtered(Loader::with_config(source, config).filter())
    }

    pub fn from_filtered(filtered: Filtered) -> Result<Self, MalformedProgram> {
        let jumps = JumpTable::build(&filtered.instructions, &filtered.offsets)?;
        Ok(Program {
            instructions: filtered.instructions,
            offsets: filtered.offsets,
            jumps,
        })
    }

    #[inline]
    pub fn get(&self, ip: usize) -> Option<Instruction> {
        self.instructions.get(ip).copied()
    }

    #[inline]
    pub fn jump_target(&self, ip: usize) -> Option<usize> {
        self.jumps.target(ip)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn offset(&self, ip: usize) -> Option<usize> {
        self.offsets.get(ip).copied()
    }

    pub fn jumps(&self) -> &JumpTable {
        &self.jumps
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn fork_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| **i == Instruction::Fork)
            .count()
    }
}
