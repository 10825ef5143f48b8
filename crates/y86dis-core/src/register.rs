//! Y86-64 register file.
//!
//! Register fields are 4-bit codes packed two to an operand byte: `rA` in the
//! high nibble and `rB` in the low nibble. Codes `0x0..=0xE` name the fifteen
//! general purpose registers and `0xF` is the "no register" sentinel used by
//! `irmovq`, `pushq` and `popq`. Both nibble positions share one name table.

use crate::Error;

/// The "no register" sentinel value of a register field.
pub const NO_REGISTER: u8 = 0xF;

/// Canonical register names, indexed by register code.
const NAMES: [&str; 15] = [
    "%rax", "%rcx", "%rdx", "%rbx", "%rsp", "%rbp", "%rsi", "%rdi", "%r8", "%r9", "%r10", "%r11",
    "%r12", "%r13", "%r14",
];

/// A Y86-64 general purpose register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Register {
    Rax = 0x0,
    Rcx = 0x1,
    Rdx = 0x2,
    Rbx = 0x3,
    Rsp = 0x4,
    Rbp = 0x5,
    Rsi = 0x6,
    Rdi = 0x7,
    R8 = 0x8,
    R9 = 0x9,
    R10 = 0xA,
    R11 = 0xB,
    R12 = 0xC,
    R13 = 0xD,
    R14 = 0xE,
}

impl Register {
    /// All registers in encoding order.
    pub const ALL: [Register; 15] = [
        Self::Rax,
        Self::Rcx,
        Self::Rdx,
        Self::Rbx,
        Self::Rsp,
        Self::Rbp,
        Self::Rsi,
        Self::Rdi,
        Self::R8,
        Self::R9,
        Self::R10,
        Self::R11,
        Self::R12,
        Self::R13,
        Self::R14,
    ];

    /// Maps a register field to a register.
    ///
    /// Only the low four bits of `nibble` are considered. Returns `None` for
    /// the `0xF` sentinel.
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        Self::ALL.get(usize::from(nibble & 0x0F)).copied()
    }

    /// Splits an operand byte into its `(rA, rB)` register fields.
    pub fn split(operand: u8) -> (u8, u8) {
        (operand >> 4, operand & 0x0F)
    }

    /// Returns the 4-bit encoding of this register.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the canonical AT&T-style name, e.g. `%rsp`.
    pub fn name(self) -> &'static str {
        NAMES[usize::from(self.code())]
    }
}

impl TryFrom<u8> for Register {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0x0F {
            return Err(Error::InvalidRegister(value));
        }
        Self::from_nibble(value).ok_or(Error::InvalidRegister(value))
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
