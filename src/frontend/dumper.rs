use crate::frontend::instruction::Instruction;
use crate::frontend::loader::Filtered;

pub struct InstructionDumper {
    pub color: bool,
}

impl Default for InstructionDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl InstructionDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const GRN: &'static str = "\x1b[32m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn dump(&self, filtered: &Filtered) {
        for (index, located) in filtered.located().enumerate() {
            println!("{}", self.line(index, located.offset, located.instruction));
        }
    }

    fn line(&self, index: usize, offset: usize, instruction: Instruction) -> String {
        let colr = if self.color { self.color(instruction) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };
        format!(
            "[{:04} @{:05}] {}{:<6} {}{}",
            index,
            offset,
            colr,
            self.kind(instruction),
            instruction,
            reset
        )
    }

    fn kind(&self, instruction: Instruction) -> &'static str {
        use Instruction::*;
        match instruction {
            Right | Left => "MOVE",
            Inc | Dec => "ARITH",
            Output | Input => "IO",
            LoopOpen | LoopClose => "LOOP",
            Fork => "FORK",
        }
    }

    fn color(&self, instruction: Instruction) -> &'static str {
        use Instruction::*;
        match instruction {
            Right | Left => Self::CYN,
            Inc | Dec => Self::MAG,
            Output | Input => Self::GRN,
            LoopOpen | LoopClose | Fork => Self::YEL,
        }
    }
}
