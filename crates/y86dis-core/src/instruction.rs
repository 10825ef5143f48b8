//! Decoded Y86-64 instruction representation.

use crate::{Error, Operand};

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// Address of the opcode byte.
    pub address: u64,
    /// Raw bytes of the instruction, opcode first, in the order consumed.
    pub bytes: Vec<u8>,
    /// Operation selected by the opcode byte.
    pub operation: Operation,
    /// Operands in printed order.
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Creates a new instruction without operands.
    pub fn new(address: u64, bytes: Vec<u8>, operation: Operation) -> Self {
        Self {
            address,
            bytes,
            operation,
            operands: Vec::new(),
        }
    }

    /// Adds an operand.
    pub fn with_operand(mut self, op: Operand) -> Self {
        self.operands.push(op);
        self
    }

    /// Sets operands.
    pub fn with_operands(mut self, ops: Vec<Operand>) -> Self {
        self.operands = ops;
        self
    }

    /// Returns the mnemonic, e.g. `irmovq` or `cmovge`.
    pub fn mnemonic(&self) -> &'static str {
        self.operation.mnemonic()
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if this instruction stops the processor.
    pub fn is_halt(&self) -> bool {
        self.operation == Operation::Halt
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())?;

        if !self.operands.is_empty() {
            write!(f, " ")?;
            for (i, op) in self.operands.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", op)?;
            }
        }

        Ok(())
    }
}

/// Operations of the Y86-64 instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Halt,
    Nop,
    /// `rrmovq` (unconditional) or `cmovXX`.
    Move(Condition),
    /// `irmovq`
    LoadImmediate,
    /// `rmmovq`
    Store,
    /// `mrmovq`
    Load,
    Arith(ArithOp),
    /// `jmp` (unconditional) or `jXX`.
    Jump(Condition),
    Call,
    Return,
    Push,
    Pop,
}

impl Operation {
    /// Returns the assembler mnemonic for this operation.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Nop => "nop",
            Self::Move(cond) => cond.cmov_mnemonic(),
            Self::LoadImmediate => "irmovq",
            Self::Store => "rmmovq",
            Self::Load => "mrmovq",
            Self::Arith(op) => op.mnemonic(),
            Self::Jump(cond) => cond.jump_mnemonic(),
            Self::Call => "call",
            Self::Return => "ret",
            Self::Push => "pushq",
            Self::Pop => "popq",
        }
    }
}

/// Condition codes shared by `cmovXX` and `jXX` (sub-codes `0..=6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    Always,
    LessOrEqual,
    Less,
    Equal,
    NotEqual,
    GreaterOrEqual,
    Greater,
}

impl Condition {
    /// Returns the 4-bit sub-code of this condition.
    pub fn code(self) -> u8 {
        match self {
            Self::Always => 0,
            Self::LessOrEqual => 1,
            Self::Less => 2,
            Self::Equal => 3,
            Self::NotEqual => 4,
            Self::GreaterOrEqual => 5,
            Self::Greater => 6,
        }
    }

    fn jump_mnemonic(self) -> &'static str {
        match self {
            Self::Always => "jmp",
            Self::LessOrEqual => "jle",
            Self::Less => "jl",
            Self::Equal => "je",
            Self::NotEqual => "jne",
            Self::GreaterOrEqual => "jge",
            Self::Greater => "jg",
        }
    }

    fn cmov_mnemonic(self) -> &'static str {
        match self {
            Self::Always => "rrmovq",
            Self::LessOrEqual => "cmovle",
            Self::Less => "cmovl",
            Self::Equal => "cmove",
            Self::NotEqual => "cmovne",
            Self::GreaterOrEqual => "cmovge",
            Self::Greater => "cmovg",
        }
    }
}

impl TryFrom<u8> for Condition {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Always,
            1 => Self::LessOrEqual,
            2 => Self::Less,
            3 => Self::Equal,
            4 => Self::NotEqual,
            5 => Self::GreaterOrEqual,
            6 => Self::Greater,
            _ => return Err(Error::InvalidCondition(code)),
        })
    }
}

/// Arithmetic operations of the `OPq` family (sub-codes `0..=6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArithOp {
    Add,
    Sub,
    And,
    Xor,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    /// Returns the 4-bit sub-code of this operation.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the assembler mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "addq",
            Self::Sub => "subq",
            Self::And => "andq",
            Self::Xor => "xorq",
            Self::Mul => "mulq",
            Self::Div => "divq",
            Self::Mod => "modq",
        }
    }
}

impl TryFrom<u8> for ArithOp {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Add,
            1 => Self::Sub,
            2 => Self::And,
            3 => Self::Xor,
            4 => Self::Mul,
            5 => Self::Div,
            6 => Self::Mod,
            _ => return Err(Error::InvalidArithOp(code)),
        })
    }
}
