pub mod disasm;
pub mod jump_table;
pub mod program;
pub mod program_error;

pub use jump_table::JumpTable;
pub use program::Program;
pub use program_error::MalformedProgram;
