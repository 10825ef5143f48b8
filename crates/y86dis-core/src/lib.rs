//! # y86dis-core
//!
//! Core abstractions for the y86dis disassembler. This crate defines the
//! Y86-64 register file, decoded instruction and operand types, and the
//! assembly text rendering shared by the decoder and the command-line tool.

pub mod error;
pub mod instruction;
pub mod operand;
pub mod output;
pub mod register;

pub use error::Error;
pub use instruction::{ArithOp, Condition, Instruction, Operation};
pub use operand::{le_value, Operand};
pub use output::{AsmWriter, Line};
pub use register::Register;
