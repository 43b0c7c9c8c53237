use thiserror::Error;

/// A program whose loop brackets do not pair up.
///
/// Detected once at load time; no VM is ever built for such a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedProgram {
    /// A `]` with no pending `[`.
    #[error("malformed program: unmatched ']' at instruction {index} (source offset {offset})")]
    UnmatchedClose { index: usize, offset: usize },

    /// One or more `[` still open at end of program.
    #[error(
        "malformed program: {count} unmatched '[' (first at instruction {first_index}, source offset {first_offset})"
    )]
    UnmatchedOpen {
        count: usize,
        first_index: usize,
        first_offset: usize,
    },
}

impl MalformedProgram {
    /// Instruction index the error points at.
    pub fn index(&self) -> usize {
        match self {
            MalformedProgram::UnmatchedClose { index, .. } => *index,
            MalformedProgram::UnmatchedOpen { first_index, .. } => *first_index,
        }
    }
}
