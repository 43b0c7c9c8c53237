use crate::bytecode::program_error::MalformedProgram;
use crate::frontend::instruction::Instruction;

/// Matching-bracket map for a program.
///
/// One slot per instruction; bracket slots hold the index of their partner,
/// every other slot is `None`. The map is symmetric: `target(target(i)) == i`
/// for every bracket index `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTable {
    targets: Vec<Option<usize>>,
}

impl JumpTable {
    /// Build the table with a single scan and a stack of pending `[`.
    ///
    /// `offsets` maps instruction indices back to source offsets and is only
    /// used to make errors point at the source text.
    pub fn build(
        instructions: &[Instruction],
        offsets: &[usize],
    ) -> Result<Self, MalformedProgram> {
        let offset_of = |i: usize| offsets.get(i).copied().unwrap_or(i);
        let mut targets = vec![None; instructions.len()];
        let mut pending = Vec::new();

        for (i, instruction) in instructions.iter().enumerate() {
            match instruction {
                Instruction::LoopOpen => pending.push(i),
                Instruction::LoopClose => {
                    let open = pending.pop().ok_or_else(|| MalformedProgram::UnmatchedClose {
                        index: i,
                        offset: offset_of(i),
                    })?;
                    targets[open] = Some(i);
                    targets[i] = Some(open);
                }
                _ => {}
            }
        }

        if let Some(&first_index) = pending.first() {
            return Err(MalformedProgram::UnmatchedOpen {
                count: pending.len(),
                first_index,
                first_offset: offset_of(first_index),
            });
        }

        Ok(JumpTable { targets })
    }

    /// Partner of the bracket at `index`, or `None` for non-bracket slots.
    #[inline]
    pub fn target(&self, index: usize) -> Option<usize> {
        self.targets.get(index).copied().flatten()
    }

    /// Iterate `(open, close)` pairs in order of the opening bracket.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.filter(|&t| t > i).map(|t| (i, t)))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
