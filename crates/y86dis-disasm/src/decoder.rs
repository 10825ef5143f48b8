//! Y86-64 instruction decoder.
//!
//! Every instruction starts with an opcode byte whose high nibble selects
//! the family and whose low nibble is the sub-code. Families that name
//! registers follow it with an operand byte (`rA:rB`), and families that
//! carry an immediate, displacement, or target follow that with an 8-byte
//! little-endian value:
//!
//! ```text
//! halt  nop  ret                 [op]
//! rrmovq cmovXX OPq pushq popq   [op][rA:rB]
//! jXX call                       [op][V x 8]
//! irmovq rmmovq mrmovq           [op][rA:rB][V x 8]
//! ```
//!
//! Handlers fetch bytes first and validate after. When an encoding is
//! illegal the handler keeps fetching until it holds the eight bytes an
//! aligned `.quad` would need, so recovery never has to read again.

use tracing::trace;
use y86dis_core::register::NO_REGISTER;
use y86dis_core::{le_value, ArithOp, Condition, Instruction, Operand, Operation, Register};

use crate::{ByteSource, DisasmError, InvalidReason, SliceSource};

/// Size of the immediate, displacement, and target fields.
pub const VALUE_SIZE: usize = 8;

/// Size of a `.quad` data directive.
pub const QUAD_SIZE: usize = 8;

/// Instruction families, selected by the opcode's high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Halt,
    Nop,
    /// `rrmovq` (sub-code 0) and `cmovXX` (sub-codes 1..=6).
    Move,
    IrMove,
    RmMove,
    MrMove,
    Arith,
    Jump,
    Call,
    Ret,
    Push,
    Pop,
}

impl Family {
    /// All families in encoding order.
    pub const ALL: [Family; 12] = [
        Self::Halt,
        Self::Nop,
        Self::Move,
        Self::IrMove,
        Self::RmMove,
        Self::MrMove,
        Self::Arith,
        Self::Jump,
        Self::Call,
        Self::Ret,
        Self::Push,
        Self::Pop,
    ];

    /// Looks up the family for a high nibble. Nibbles `0xC..=0xF` are unassigned.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Looks up the family for an opcode byte.
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::from_code(opcode >> 4)
    }

    /// Returns the high-nibble code of this family.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns true if an `rA:rB` operand byte follows the opcode.
    pub fn has_register_byte(self) -> bool {
        matches!(
            self,
            Self::Move
                | Self::IrMove
                | Self::RmMove
                | Self::MrMove
                | Self::Arith
                | Self::Push
                | Self::Pop
        )
    }

    /// Returns true if an 8-byte value ends the encoding.
    pub fn has_value(self) -> bool {
        matches!(
            self,
            Self::IrMove | Self::RmMove | Self::MrMove | Self::Jump | Self::Call
        )
    }

    /// Total encoded length of a valid instruction of this family.
    pub fn encoded_len(self) -> usize {
        1 + usize::from(self.has_register_byte()) + if self.has_value() { VALUE_SIZE } else { 0 }
    }

    /// Maps a sub-code to an operation, or `None` if out of range.
    pub fn operation(self, subcode: u8) -> Option<Operation> {
        match self {
            Self::Move => Condition::try_from(subcode).ok().map(Operation::Move),
            Self::Arith => ArithOp::try_from(subcode).ok().map(Operation::Arith),
            Self::Jump => Condition::try_from(subcode).ok().map(Operation::Jump),
            _ if subcode != 0 => None,
            Self::Halt => Some(Operation::Halt),
            Self::Nop => Some(Operation::Nop),
            Self::IrMove => Some(Operation::LoadImmediate),
            Self::RmMove => Some(Operation::Store),
            Self::MrMove => Some(Operation::Load),
            Self::Call => Some(Operation::Call),
            Self::Ret => Some(Operation::Return),
            Self::Push => Some(Operation::Push),
            Self::Pop => Some(Operation::Pop),
        }
    }

    /// Validates the register fields of an operand byte.
    ///
    /// `irmovq` requires `rA` to be the `0xF` sentinel, `pushq`/`popq`
    /// require it of `rB`, and every other field must name a register.
    fn registers(self, operand: u8) -> Option<(Option<Register>, Option<Register>)> {
        let (ra, rb) = Register::split(operand);
        match self {
            Self::IrMove if ra == NO_REGISTER => Some((None, Some(Register::from_nibble(rb)?))),
            Self::IrMove => None,
            Self::Push | Self::Pop if rb == NO_REGISTER => {
                Some((Some(Register::from_nibble(ra)?), None))
            }
            Self::Push | Self::Pop => None,
            _ => Some((
                Some(Register::from_nibble(ra)?),
                Some(Register::from_nibble(rb)?),
            )),
        }
    }

    /// Decodes one instruction of this family.
    ///
    /// `source` must be positioned just after `opcode`, which was read at
    /// `address`. The returned size counts the opcode and every byte this
    /// call consumed.
    pub fn decode<S: ByteSource + ?Sized>(
        self,
        opcode: u8,
        source: &mut S,
        address: u64,
    ) -> Result<Decoded, DisasmError> {
        let subcode = opcode & 0x0F;
        let mut fetch = Fetch::new(source, opcode, address);

        let operand = if self.has_register_byte() {
            match fetch.next()? {
                Some(b) => Some(b),
                None => return fetch.truncated(self, None),
            }
        } else {
            None
        };

        let Some(operation) = self.operation(subcode) else {
            return fetch.invalid(self, operand, InvalidReason::BadSubcode(subcode));
        };

        let (ra, rb) = match operand {
            Some(byte) => match self.registers(byte) {
                Some(regs) => regs,
                None => return fetch.invalid(self, operand, InvalidReason::BadRegister(byte)),
            },
            None => (None, None),
        };

        let value = if self.has_value() {
            if !fetch.take(VALUE_SIZE)? {
                return fetch.truncated(self, operand);
            }
            Some(le_value(&fetch.bytes[fetch.bytes.len() - VALUE_SIZE..]))
        } else {
            None
        };

        let operands = operands(operation, ra, rb, value);
        Ok(fetch.instruction(operation, operands))
    }
}

/// Orders operands the way the assembler prints them.
fn operands(
    operation: Operation,
    ra: Option<Register>,
    rb: Option<Register>,
    value: Option<u64>,
) -> Vec<Operand> {
    let value = value.unwrap_or_default();
    let ops = match operation {
        Operation::Halt | Operation::Nop | Operation::Return => return Vec::new(),
        Operation::Jump(_) | Operation::Call => return vec![Operand::Target(value)],
        Operation::Move(_) | Operation::Arith(_) => [ra.map(Operand::reg), rb.map(Operand::reg)],
        Operation::LoadImmediate => [Some(Operand::Immediate(value)), rb.map(Operand::reg)],
        Operation::Store => [ra.map(Operand::reg), rb.map(|b| Operand::mem(b, value))],
        Operation::Load => [rb.map(|b| Operand::mem(b, value)), ra.map(Operand::reg)],
        Operation::Push | Operation::Pop => [ra.map(Operand::reg), None],
    };
    ops.into_iter().flatten().collect()
}

/// Result of one decode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// What the bytes decoded to.
    pub outcome: Outcome,
    /// Number of bytes consumed, including the opcode.
    pub size: usize,
}

/// Outcome of decoding one opcode byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A valid instruction.
    Instruction(Instruction),
    /// An illegal or truncated encoding, to be rendered as a directive.
    Invalid(InvalidEncoding),
    /// An opcode with no assigned family; only the opcode was consumed.
    Skipped,
}

/// An encoding that could not be decoded, with every byte fetched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEncoding {
    /// Address of the opcode byte.
    pub address: u64,
    /// The opcode byte.
    pub opcode: u8,
    /// Family selected by the opcode.
    pub family: Family,
    /// Operand byte, if the family reads one and it was available.
    pub operand: Option<u8>,
    /// Every byte consumed, opcode first, at most what a `.quad` needs
    /// unless the family's own encoding is longer.
    pub bytes: Vec<u8>,
    /// Why decoding failed.
    pub reason: InvalidReason,
}

impl InvalidEncoding {
    /// Returns the sub-code (low nibble of the opcode).
    pub fn subcode(&self) -> u8 {
        self.opcode & 0x0F
    }

    /// Returns the `(rA, rB)` fields of the operand byte, if one was read.
    pub fn register_fields(&self) -> Option<(u8, u8)> {
        self.operand.map(Register::split)
    }

    /// Returns the first eight bytes if that many were fetched.
    pub fn quad_bytes(&self) -> Option<[u8; QUAD_SIZE]> {
        self.bytes.get(..QUAD_SIZE)?.try_into().ok()
    }
}

/// Byte fetcher that records everything it reads for one decode step.
struct Fetch<'s, S: ByteSource + ?Sized> {
    source: &'s mut S,
    address: u64,
    opcode: u8,
    bytes: Vec<u8>,
    eof: bool,
}

impl<'s, S: ByteSource + ?Sized> Fetch<'s, S> {
    fn new(source: &'s mut S, opcode: u8, address: u64) -> Self {
        let mut bytes = Vec::with_capacity(Family::IrMove.encoded_len());
        bytes.push(opcode);
        Self {
            source,
            address,
            opcode,
            bytes,
            eof: false,
        }
    }

    fn next(&mut self) -> Result<Option<u8>, DisasmError> {
        if self.eof {
            return Ok(None);
        }
        let offset = self.source.position();
        match self
            .source
            .read_byte()
            .map_err(|e| DisasmError::input(offset, e))?
        {
            Some(b) => {
                self.bytes.push(b);
                Ok(Some(b))
            }
            None => {
                self.eof = true;
                Ok(None)
            }
        }
    }

    /// Reads `n` bytes, returning false if the stream ended first.
    fn take(&mut self, n: usize) -> Result<bool, DisasmError> {
        for _ in 0..n {
            if self.next()?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn instruction(self, operation: Operation, operands: Vec<Operand>) -> Decoded {
        let size = self.bytes.len();
        let insn = Instruction::new(self.address, self.bytes, operation).with_operands(operands);
        trace!(address = insn.address, "{}", insn);
        Decoded {
            outcome: Outcome::Instruction(insn),
            size,
        }
    }

    /// Fills up to a quad's worth of bytes and reports the encoding invalid.
    fn invalid(
        mut self,
        family: Family,
        operand: Option<u8>,
        reason: InvalidReason,
    ) -> Result<Decoded, DisasmError> {
        while self.bytes.len() < QUAD_SIZE && self.next()?.is_some() {}
        let size = self.bytes.len();
        Ok(Decoded {
            outcome: Outcome::Invalid(InvalidEncoding {
                address: self.address,
                opcode: self.opcode,
                family,
                operand,
                bytes: self.bytes,
                reason,
            }),
            size,
        })
    }

    fn truncated(self, family: Family, operand: Option<u8>) -> Result<Decoded, DisasmError> {
        let reason = InvalidReason::truncated(family.encoded_len(), self.bytes.len());
        self.invalid(family, operand, reason)
    }
}

/// Y86-64 disassembler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Y86Disassembler;

impl Y86Disassembler {
    /// Creates a new disassembler.
    pub fn new() -> Self {
        Self
    }

    /// Decodes the instruction whose opcode byte was just read from `source`
    /// at `address`.
    pub fn decode<S: ByteSource + ?Sized>(
        &self,
        opcode: u8,
        source: &mut S,
        address: u64,
    ) -> Result<Decoded, DisasmError> {
        match Family::from_opcode(opcode) {
            Some(family) => family.decode(opcode, source, address),
            None => Ok(Decoded {
                outcome: Outcome::Skipped,
                size: 1,
            }),
        }
    }

    /// Decodes the instruction at the start of `bytes`, or `None` if empty.
    pub fn decode_bytes(&self, bytes: &[u8], address: u64) -> Option<Decoded> {
        let (&opcode, rest) = bytes.split_first()?;
        let mut source = SliceSource::new(rest);
        // Reads from a slice cannot fail.
        self.decode(opcode, &mut source, address).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Decoded {
        Y86Disassembler::new().decode_bytes(bytes, 0).unwrap()
    }

    fn decode_insn(bytes: &[u8]) -> Instruction {
        match decode(bytes).outcome {
            Outcome::Instruction(insn) => insn,
            other => panic!("expected instruction, got {:?}", other),
        }
    }

    fn decode_invalid(bytes: &[u8], address: u64) -> (InvalidEncoding, usize) {
        let decoded = Y86Disassembler::new().decode_bytes(bytes, address).unwrap();
        match decoded.outcome {
            Outcome::Invalid(inv) => (inv, decoded.size),
            other => panic!("expected invalid encoding, got {:?}", other),
        }
    }

    #[test]
    fn test_family_table() {
        for (code, family) in Family::ALL.iter().enumerate() {
            assert_eq!(family.code() as usize, code);
            assert_eq!(Family::from_code(code as u8), Some(*family));
        }
        for code in 0xC..=0xF {
            assert_eq!(Family::from_code(code), None);
        }
    }

    #[test]
    fn test_encoded_lengths() {
        assert_eq!(Family::Halt.encoded_len(), 1);
        assert_eq!(Family::Ret.encoded_len(), 1);
        assert_eq!(Family::Move.encoded_len(), 2);
        assert_eq!(Family::Pop.encoded_len(), 2);
        assert_eq!(Family::Jump.encoded_len(), 9);
        assert_eq!(Family::Call.encoded_len(), 9);
        assert_eq!(Family::IrMove.encoded_len(), 10);
        assert_eq!(Family::MrMove.encoded_len(), 10);
    }

    #[test]
    fn test_halt_nop_ret() {
        let halt = decode(&[0x00, 0x10]);
        assert_eq!(halt.size, 1);
        assert_eq!(decode_insn(&[0x00]).mnemonic(), "halt");
        assert_eq!(decode_insn(&[0x10]).mnemonic(), "nop");
        assert_eq!(decode_insn(&[0x90, 0x00]).mnemonic(), "ret");
        assert_eq!(decode_insn(&[0x90]).bytes, vec![0x90]);
    }

    #[test]
    fn test_irmovq() {
        let insn = decode_insn(&[0x30, 0xF0, 0x05, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(insn.operation, Operation::LoadImmediate);
        assert_eq!(
            insn.operands,
            vec![Operand::Immediate(5), Operand::reg(Register::Rax)]
        );
        assert_eq!(insn.size(), 10);
    }

    #[test]
    fn test_rrmovq_and_cmov() {
        let rr = decode_insn(&[0x20, 0x45]);
        assert_eq!(rr.to_string(), "rrmovq %rsp, %rbp");
        let cmov = decode_insn(&[0x25, 0x01]);
        assert_eq!(cmov.to_string(), "cmovge %rax, %rcx");
        assert_eq!(cmov.size(), 2);
    }

    #[test]
    fn test_memory_moves() {
        let store = decode_insn(&[0x40, 0x15, 0x08, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(store.to_string(), "rmmovq %rcx, 0x8(%rbp)");
        let load = decode_insn(&[0x50, 0x15, 0x08, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(load.to_string(), "mrmovq 0x8(%rbp), %rcx");
    }

    #[test]
    fn test_arith() {
        let names = ["addq", "subq", "andq", "xorq", "mulq", "divq", "modq"];
        for (sub, name) in names.iter().enumerate() {
            let insn = decode_insn(&[0x60 | sub as u8, 0x23]);
            assert_eq!(insn.to_string(), format!("{} %rdx, %rbx", name));
        }
    }

    #[test]
    fn test_jumps_and_call() {
        let names = ["jmp", "jle", "jl", "je", "jne", "jge", "jg"];
        for (sub, name) in names.iter().enumerate() {
            let insn = decode_insn(&[0x70 | sub as u8, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
            assert_eq!(insn.to_string(), format!("{} 0x100", name));
            assert_eq!(insn.size(), 9);
        }
        let call = decode_insn(&[0x80, 0x41, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(call.to_string(), "call 0x41");
    }

    #[test]
    fn test_push_pop() {
        assert_eq!(decode_insn(&[0xA0, 0x4F]).to_string(), "pushq %rsp");
        assert_eq!(decode_insn(&[0xB0, 0xEF]).to_string(), "popq %r14");
    }

    #[test]
    fn test_value_is_little_endian() {
        let insn = decode_insn(&[0x30, 0xF3, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01]);
        assert_eq!(insn.operands[0], Operand::Immediate(0x0123_4567_89AB_CDEF));
    }

    #[test]
    fn test_halt_with_subcode_is_invalid() {
        let (inv, size) = decode_invalid(&[0x01, 0, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.family, Family::Halt);
        assert_eq!(inv.reason, InvalidReason::BadSubcode(1));
        assert_eq!(inv.operand, None);
        assert_eq!(size, QUAD_SIZE);
    }

    #[test]
    fn test_invalid_arith_fetches_quad() {
        let bytes = [0x6F, 0x12, 1, 2, 3, 4, 5, 6, 0x99];
        let (inv, size) = decode_invalid(&bytes, 8);
        assert_eq!(size, QUAD_SIZE);
        assert_eq!(inv.bytes, bytes[..8].to_vec());
        assert_eq!(inv.opcode, bytes[0]);
        assert_eq!(inv.operand, Some(0x12));
        assert_eq!(inv.register_fields(), Some((0x1, 0x2)));
        assert_eq!(inv.subcode(), 0xF);
        assert_eq!(inv.quad_bytes(), Some([0x6F, 0x12, 1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_invalid_jump_fetches_quad() {
        let bytes = [0x77, 1, 2, 3, 4, 5, 6, 7, 8];
        let (inv, size) = decode_invalid(&bytes, 0);
        assert_eq!(size, QUAD_SIZE);
        assert_eq!(inv.reason, InvalidReason::BadSubcode(7));
        assert_eq!(inv.register_fields(), None);
    }

    #[test]
    fn test_sentinel_register_rules() {
        // irmovq needs rA == F.
        let (inv, _) = decode_invalid(&[0x30, 0x00, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.reason, InvalidReason::BadRegister(0x00));
        // irmovq rejects rB == F.
        let (inv, _) = decode_invalid(&[0x30, 0xFF, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.reason, InvalidReason::BadRegister(0xFF));
        // pushq needs rB == F.
        let (inv, _) = decode_invalid(&[0xA0, 0x40, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.reason, InvalidReason::BadRegister(0x40));
        // popq rejects rA == F.
        let (inv, _) = decode_invalid(&[0xB0, 0xFF, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.reason, InvalidReason::BadRegister(0xFF));
        // Two-register families reject the sentinel in either field.
        let (inv, _) = decode_invalid(&[0x60, 0x0F, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.reason, InvalidReason::BadRegister(0x0F));
        let (inv, _) = decode_invalid(&[0x40, 0xF0, 0, 0, 0, 0, 0, 0], 0);
        assert_eq!(inv.reason, InvalidReason::BadRegister(0xF0));
    }

    #[test]
    fn test_fixed_subcode_families() {
        for opcode in [0x31u8, 0x41, 0x51, 0x81, 0x91, 0xA1, 0xB1, 0x11] {
            let (inv, _) = decode_invalid(&[opcode, 0xF0, 0, 0, 0, 0, 0, 0, 0, 0], 0);
            assert_eq!(inv.reason, InvalidReason::BadSubcode(1), "opcode {:#04x}", opcode);
        }
    }

    #[test]
    fn test_truncated_instruction() {
        let (inv, size) = decode_invalid(&[0x30, 0xF0, 0x05], 0);
        assert_eq!(size, 3);
        assert_eq!(inv.bytes, vec![0x30, 0xF0, 0x05]);
        assert_eq!(inv.reason, InvalidReason::truncated(10, 3));
        assert_eq!(inv.quad_bytes(), None);

        let (inv, size) = decode_invalid(&[0x60], 0);
        assert_eq!(size, 1);
        assert_eq!(inv.operand, None);
    }

    #[test]
    fn test_invalid_short_stream_does_not_pad() {
        let (inv, size) = decode_invalid(&[0x6F, 0x00, 0x01], 0);
        assert_eq!(size, 3);
        assert_eq!(inv.bytes, vec![0x6F, 0x00, 0x01]);
    }

    #[test]
    fn test_unassigned_family_is_skipped() {
        let mut source = SliceSource::new(&[0xC0, 0x10]);
        source.seek(1).unwrap();
        let decoded = Y86Disassembler::new().decode(0xC0, &mut source, 0).unwrap();
        assert_eq!(decoded.outcome, Outcome::Skipped);
        assert_eq!(decoded.size, 1);
        assert_eq!(source.position(), 1);
    }

    #[test]
    fn test_decode_bytes_empty() {
        assert!(Y86Disassembler::new().decode_bytes(&[], 0).is_none());
    }
}
