use crate::bytecode::Program;
use crate::frontend::Instruction;
use crate::runtime::InstanceId;
use crate::runtime::input::{InputQueue, InputSplit};
use crate::runtime::runtime_error::RuntimeError;
use crate::runtime::snapshot::{InstanceResult, InstanceSnapshot};
use crate::runtime::tape::{Advance, DEFAULT_TAPE_CAPACITY, Tape, TapeOverflow};

pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

#[derive(Debug, Clone, Copy)]
pub struct VmConfig {
    pub tape_capacity: usize,
    /// Instructions one instance may execute; `None` disables the limit.
    pub max_steps: Option<usize>,
    pub overflow: TapeOverflow,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            tape_capacity: DEFAULT_TAPE_CAPACITY,
            max_steps: Some(DEFAULT_MAX_STEPS),
            overflow: TapeOverflow::default(),
        }
    }
}

/// Outcome of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The instruction pointer sits on a `FORK` that the owner must resolve.
    Fork,
    Halted,
}

/// The byte a parent sees after forking `child_id`. Cycles through 1..=255
/// so it never collides with the child's 0.
pub fn fork_marker(child_id: InstanceId) -> u8 {
    (child_id.saturating_sub(1) % 255 + 1) as u8
}

/// One VM instance: a tape, two pointers, an input queue and an output sink.
#[derive(Debug, Clone)]
pub struct Vm {
    id: InstanceId,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    tape: Tape,
    ip: usize,
    input: InputQueue,
    output: Vec<u8>,
    halted: bool,
    steps: usize,
    config: VmConfig,
}

impl Vm {
    pub fn new(input: impl Into<InputQueue>) -> Self {
        Self::with_config(input, VmConfig::default())
    }

    pub fn with_config(input: impl Into<InputQueue>, config: VmConfig) -> Self {
        Vm {
            id: 0,
            parent: None,
            children: Vec::new(),
            tape: Tape::new(config.tape_capacity),
            ip: 0,
            input: input.into(),
            output: Vec::new(),
            halted: false,
            steps: 0,
            config,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn ptr(&self) -> usize {
        self.tape.ptr()
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn cell(&self) -> u8 {
        self.tape.get()
    }

    /// Everything written so far; grows after each `.`.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        if let Some(max) = self.config.max_steps {
            if self.steps >= max {
                return Err(RuntimeError::StepLimitExceeded {
                    instance: self.id,
                    limit: max,
                });
            }
        }
        self.steps += 1;
        Ok(())
    }

    /// Execute the instruction under the instruction pointer.
    ///
    /// A `FORK` is reported, not executed: the pointer stays on it until the
    /// owner calls [`Vm::spawn_child`] or [`Vm::skip_fork`].
    pub fn exec(&mut self, program: &Program) -> Result<Step, RuntimeError> {
        if self.halted {
            return Ok(Step::Halted);
        }
        let Some(instruction) = program.get(self.ip) else {
            self.halted = true;
            return Ok(Step::Halted);
        };

        self.check_limits()?;

        match instruction {
            Instruction::Right => match self.tape.right(self.config.overflow) {
                Advance::Moved => {}
                Advance::Grew => {
                    tracing::debug!(instance = self.id, len = self.tape.len(), "tape grown");
                }
                Advance::Clamped => {
                    tracing::warn!(
                        instance = self.id,
                        ip = self.ip,
                        "data pointer clamped at last cell ({})",
                        self.tape.len() - 1
                    );
                }
                Advance::Rejected => {
                    return Err(RuntimeError::TapeOverflow {
                        instance: self.id,
                        capacity: self.tape.len(),
                    });
                }
            },
            Instruction::Left => self.tape.left(),
            Instruction::Inc => self.tape.inc(),
            Instruction::Dec => self.tape.dec(),
            Instruction::Output => {
                let byte = self.tape.get();
                tracing::trace!(instance = self.id, byte, "output");
                self.output.push(byte);
            }
            Instruction::Input => {
                let byte = self.input.read();
                self.tape.set(byte);
            }
            Instruction::LoopOpen => {
                if self.tape.get() == 0 {
                    self.ip = self.jump(program);
                }
            }
            Instruction::LoopClose => {
                if self.tape.get() != 0 {
                    self.ip = self.jump(program);
                }
            }
            Instruction::Fork => return Ok(Step::Fork),
        }

        self.ip += 1;
        Ok(Step::Continue)
    }

    // Programs only reach a VM through `Program::load`, so every bracket has a
    // partner; falling through keeps this total anyway.
    fn jump(&self, program: &Program) -> usize {
        program.jump_target(self.ip).unwrap_or(self.ip)
    }

    /// Single-instance step: `true` while running, `false` once halted.
    ///
    /// Without a scheduler there is nobody to hand a `FORK` to, so it is
    /// refused and skipped.
    pub fn step(&mut self, program: &Program) -> Result<bool, RuntimeError> {
        match self.exec(program)? {
            Step::Continue => Ok(true),
            Step::Fork => {
                tracing::warn!(
                    instance = self.id,
                    ip = self.ip,
                    "FORK ignored in single-instance mode"
                );
                self.skip_fork();
                Ok(true)
            }
            Step::Halted => Ok(false),
        }
    }

    /// Step until halted. On error the VM keeps its output and state.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        while self.step(program)? {}
        Ok(())
    }

    /// Move past a `FORK` that was refused.
    pub(crate) fn skip_fork(&mut self) {
        self.ip += 1;
    }

    /// Complete a `FORK`: build the child as a copy of this instance, split
    /// the pending input, mark both cells and move both pointers past the
    /// instruction.
    pub(crate) fn spawn_child(&mut self, child_id: InstanceId, split: InputSplit) -> Vm {
        let input = self.input.split(split);
        self.ip += 1;

        let mut child = Vm {
            id: child_id,
            parent: Some(self.id),
            children: Vec::new(),
            tape: self.tape.clone(),
            ip: self.ip,
            input,
            output: Vec::new(),
            halted: false,
            steps: 0,
            config: self.config,
        };
        child.tape.set(0);

        self.tape.set(fork_marker(child_id));
        self.children.push(child_id);
        child
    }

    pub fn snapshot(&self, program: &Program) -> InstanceSnapshot {
        InstanceSnapshot {
            id: self.id,
            parent: self.parent,
            children: self.children.clone(),
            data_pointer: self.tape.ptr(),
            instruction_pointer: self.ip,
            current_instruction: program.get(self.ip),
            halted: self.halted,
        }
    }

    pub fn result(&self) -> InstanceResult {
        InstanceResult {
            id: self.id,
            parent: self.parent,
            children: self.children.clone(),
            output: self.output.clone(),
            data_pointer: self.tape.ptr(),
            tape: self.tape.truncated(),
            steps: self.steps,
            halted: self.halted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str, input: &str) -> Vm {
        let program = Program::load(source).unwrap();
        let mut vm = Vm::new(input);
        vm.run(&program).unwrap();
        vm
    }

    #[test]
    fn test_echo() {
        assert_eq!(run(",.", "A").output(), b"A");
    }

    #[test]
    fn test_nested_loop_arithmetic() {
        let vm = run("++++++++[>++++++++<-]>+.", "");
        assert_eq!(vm.output(), &[65]);
        assert_eq!(vm.ptr(), 1);
    }

    #[test]
    fn test_hello_world() {
        let source = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        assert_eq!(run(source, "").output(), b"Hello World!\n");
    }

    #[test]
    fn test_input_underrun_reads_zero() {
        let vm = run("+,", "");
        assert_eq!(vm.cell(), 0);
    }

    #[test]
    fn test_wraparound() {
        let vm = run("-", "");
        assert_eq!(vm.cell(), 255);
        let plus = "+".repeat(256);
        assert_eq!(run(&plus, "").cell(), 0);
    }

    #[test]
    fn test_left_floor() {
        let vm = run("<<<+", "");
        assert_eq!(vm.ptr(), 0);
        assert_eq!(vm.cell(), 1);
    }

    #[test]
    fn test_skips_loop_on_zero() {
        let vm = run("[.+]+.", "");
        assert_eq!(vm.output(), &[1]);
    }

    #[test]
    fn test_step_reports_halt() {
        let program = Program::load("+").unwrap();
        let mut vm = Vm::new("");
        assert!(vm.step(&program).unwrap());
        assert!(!vm.is_halted());
        assert!(!vm.step(&program).unwrap());
        assert!(vm.is_halted());
        assert!(!vm.step(&program).unwrap());
        assert_eq!(vm.steps(), 1);
    }

    #[test]
    fn test_step_limit_keeps_partial_output() {
        let program = Program::load("+.[.]").unwrap();
        let config = VmConfig {
            max_steps: Some(50),
            ..VmConfig::default()
        };
        let mut vm = Vm::with_config("", config);
        let err = vm.run(&program).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::StepLimitExceeded {
                instance: 0,
                limit: 50
            }
        );
        assert!(!vm.output().is_empty());
        assert_eq!(vm.steps(), 50);
    }

    #[test]
    fn test_exact_step_budget_is_enough() {
        let program = Program::load("+++").unwrap();
        let config = VmConfig {
            max_steps: Some(3),
            ..VmConfig::default()
        };
        let mut vm = Vm::with_config("", config);
        vm.run(&program).unwrap();
        assert_eq!(vm.cell(), 3);
    }

    #[test]
    fn test_overflow_reject() {
        let program = Program::load(">>>").unwrap();
        let config = VmConfig {
            tape_capacity: 2,
            ..VmConfig::default()
        };
        let mut vm = Vm::with_config("", config);
        assert_eq!(
            vm.run(&program),
            Err(RuntimeError::TapeOverflow {
                instance: 0,
                capacity: 2
            })
        );
        assert_eq!(vm.ptr(), 1);
    }

    #[test]
    fn test_overflow_clamp_and_grow() {
        let program = Program::load(">>>+").unwrap();
        let clamp = VmConfig {
            tape_capacity: 2,
            overflow: TapeOverflow::Clamp,
            ..VmConfig::default()
        };
        let mut vm = Vm::with_config("", clamp);
        vm.run(&program).unwrap();
        assert_eq!(vm.ptr(), 1);

        let grow = VmConfig {
            overflow: TapeOverflow::Grow,
            ..clamp
        };
        let mut vm = Vm::with_config("", grow);
        vm.run(&program).unwrap();
        assert_eq!(vm.ptr(), 3);
        assert_eq!(vm.tape().len(), 4);
        assert_eq!(vm.cell(), 1);
    }

    #[test]
    fn test_exec_stops_on_fork() {
        let program = Program::load("FORK+").unwrap();
        let mut vm = Vm::new("");
        assert_eq!(vm.exec(&program).unwrap(), Step::Fork);
        assert_eq!(vm.ip(), 0);
        assert_eq!(vm.exec(&program).unwrap(), Step::Fork);
    }

    #[test]
    fn test_single_instance_skips_fork() {
        let vm = run("+FORK+.", "");
        assert_eq!(vm.output(), &[2]);
        assert!(vm.children().is_empty());
    }

    #[test]
    fn test_spawn_child() {
        let program = Program::load(",>+FORK,").unwrap();
        let mut parent = Vm::new("abcd");
        for _ in 0..3 {
            parent.exec(&program).unwrap();
        }
        assert_eq!(parent.exec(&program).unwrap(), Step::Fork);

        let child = parent.spawn_child(5, InputSplit::Halve);
        assert_eq!(parent.ip(), 4);
        assert_eq!(child.ip(), 4);
        assert_eq!(parent.cell(), 5);
        assert_eq!(child.cell(), 0);
        assert_eq!(child.tape().cells()[0], b'a');
        assert_eq!(child.parent(), Some(0));
        assert_eq!(parent.children(), &[5]);
        assert_eq!(parent.input().remaining(), b"bc".to_vec());
        assert_eq!(child.input().remaining(), b"d".to_vec());
        assert!(child.output().is_empty());
    }

    #[test]
    fn test_fork_marker_never_zero() {
        assert_eq!(fork_marker(1), 1);
        assert_eq!(fork_marker(255), 255);
        assert_eq!(fork_marker(256), 1);
        assert_eq!(fork_marker(511), 1);
        assert!((1..2000).all(|id| fork_marker(id) != 0));

        let program = Program::load("FORK").unwrap();
        let mut parent = Vm::new("");
        assert_eq!(parent.exec(&program).unwrap(), Step::Fork);
        let child = parent.spawn_child(256, InputSplit::Halve);
        assert_eq!(parent.cell(), 1);
        assert_eq!(child.cell(), 0);
        assert_eq!(parent.children(), &[256]);
    }

    #[test]
    fn test_snapshot() {
        let program = Program::load("+>FORK").unwrap();
        let mut vm = Vm::new("");
        vm.exec(&program).unwrap();
        vm.exec(&program).unwrap();
        let snap = vm.snapshot(&program);
        assert_eq!(snap.instruction_pointer, 2);
        assert_eq!(snap.data_pointer, 1);
        assert_eq!(snap.current_instruction, Some(Instruction::Fork));
        assert!(!snap.halted);
    }
}
