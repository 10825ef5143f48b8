//! Error types for y86dis-core.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Register field outside `0x0..=0xE`, including the `0xF` sentinel.
    #[error("invalid register field {0:#x}")]
    InvalidRegister(u8),

    /// Sub-code outside the range of a conditional variant table.
    #[error("invalid condition code {0:#x}")]
    InvalidCondition(u8),

    /// Sub-code outside the range of the arithmetic operation table.
    #[error("invalid arithmetic code {0:#x}")]
    InvalidArithOp(u8),
}
