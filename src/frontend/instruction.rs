use serde::{Deserialize, Serialize};

/// A single executable instruction of the tape language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    // Pointer movement
    Right, // >
    Left,  // <

    // Cell arithmetic
    Inc, // +
    Dec, // -

    // I/O
    Output, // .
    Input,  // ,

    // Loops
    LoopOpen,  // [
    LoopClose, // ]

    /// Spawn a cooperating copy of the running instance.
    Fork,
}

impl Instruction {
    /// Map a single source character to a base instruction.
    ///
    /// `FORK` has no single-character form here; the loader decides how it is
    /// spelled.
    pub fn from_char(ch: char) -> Option<Self> {
        use Instruction::*;
        Some(match ch {
            '>' => Right,
            '<' => Left,
            '+' => Inc,
            '-' => Dec,
            '.' => Output,
            ',' => Input,
            '[' => LoopOpen,
            ']' => LoopClose,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        use Instruction::*;
        match self {
            Right => ">",
            Left => "<",
            Inc => "+",
            Dec => "-",
            Output => ".",
            Input => ",",
            LoopOpen => "[",
            LoopClose => "]",
            Fork => "FORK",
        }
    }

    pub fn is_bracket(&self) -> bool {
        matches!(self, Instruction::LoopOpen | Instruction::LoopClose)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
