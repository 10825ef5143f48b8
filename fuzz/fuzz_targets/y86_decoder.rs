#![no_main]

use libfuzzer_sys::fuzz_target;
use y86dis_disasm::{Family, Outcome, Y86Disassembler};

fuzz_target!(|data: &[u8]| {
    let disasm = Y86Disassembler::new();

    // Decode every offset as if it were an opcode
    for offset in 0..data.len().min(256) {
        let Some(decoded) = disasm.decode_bytes(&data[offset..], offset as u64) else {
            break;
        };
        assert!(decoded.size >= 1);
        assert!(decoded.size <= data.len() - offset);

        match decoded.outcome {
            Outcome::Instruction(insn) => {
                let family = Family::from_opcode(data[offset]).unwrap();
                assert_eq!(insn.size(), family.encoded_len());
                assert_eq!(&insn.bytes[..], &data[offset..offset + decoded.size]);
            }
            Outcome::Invalid(inv) => {
                assert_eq!(inv.bytes.len(), decoded.size);
            }
            Outcome::Skipped => assert_eq!(decoded.size, 1),
        }
    }
});
