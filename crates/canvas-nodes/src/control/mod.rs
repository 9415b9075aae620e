//! Control nodes
//!
//! Nodes whose output shape is decided at run time.

mod instruction;

pub use instruction::InstructionExecutor;
