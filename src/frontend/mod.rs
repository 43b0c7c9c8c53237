//! # Source front end
//!
//! Turns raw program text into the instruction stream the VM executes.
//! Any character outside the instruction alphabet is commentary and is
//! dropped; each surviving instruction remembers its source offset so
//! diagnostics and presentation layers can point back at the text.

pub mod dumper;
pub mod instruction;
pub mod loader;

pub use instruction::Instruction;
pub use loader::{Filtered, ForkSyntax, Loader, LoaderConfig};
