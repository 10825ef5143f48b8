//! Instruction operand types.

use crate::Register;

/// Assembles bytes into an unsigned value, least significant byte first.
///
/// At most eight bytes contribute; missing high bytes read as zero.
pub fn le_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)))
}

/// An instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// Register operand.
    Register(Register),
    /// 8-byte immediate, printed as `$0x...`.
    Immediate(u64),
    /// Base register plus 8-byte displacement, printed as `0x...(%reg)`.
    Memory {
        /// Base register.
        base: Register,
        /// Displacement.
        displacement: u64,
    },
    /// Absolute branch or call target.
    Target(u64),
}

impl Operand {
    /// Creates a register operand.
    pub fn reg(reg: Register) -> Self {
        Self::Register(reg)
    }

    /// Creates a memory operand.
    pub fn mem(base: Register, displacement: u64) -> Self {
        Self::Memory { base, displacement }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{}", reg.name()),
            Self::Immediate(v) => write!(f, "${:#x}", v),
            Self::Memory { base, displacement } => write!(f, "{:#x}({})", displacement, base.name()),
            Self::Target(v) => write!(f, "{:#x}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_value() {
        assert_eq!(le_value(&[0x05, 0, 0, 0, 0, 0, 0, 0]), 5);
        assert_eq!(
            le_value(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]),
            0x0807_0605_0403_0201
        );
        assert_eq!(le_value(&[0xFF; 8]), u64::MAX);
    }

    #[test]
    fn test_le_value_short_and_long_input() {
        assert_eq!(le_value(&[]), 0);
        assert_eq!(le_value(&[0x34, 0x12]), 0x1234);
        // Bytes past the eighth are ignored.
        assert_eq!(le_value(&[1, 0, 0, 0, 0, 0, 0, 0, 0xAA]), 1);
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(Operand::reg(Register::Rax).to_string(), "%rax");
        assert_eq!(Operand::Immediate(5).to_string(), "$0x5");
        assert_eq!(Operand::Immediate(0).to_string(), "$0x0");
        assert_eq!(Operand::mem(Register::Rsp, 0x18).to_string(), "0x18(%rsp)");
        assert_eq!(Operand::Target(0x100).to_string(), "0x100");
        assert_eq!(
            Operand::Target(u64::MAX).to_string(),
            "0xffffffffffffffff"
        );
    }
}
