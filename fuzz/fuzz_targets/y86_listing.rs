#![no_main]

use libfuzzer_sys::fuzz_target;
use y86dis_core::AsmWriter;
use y86dis_disasm::{SliceSource, StreamDriver};

fuzz_target!(|data: &[u8]| {
    let start = data.first().map_or(0, |&b| u64::from(b % 16));
    let mut out = AsmWriter::new(Vec::new());
    let summary = StreamDriver::new(SliceSource::new(data))
        .with_start(start)
        .run(&mut out)
        .unwrap();

    // The driver always reads to the end of the input
    assert!(summary.end_address >= data.len() as u64);
    assert!(String::from_utf8(out.into_inner()).is_ok());
});
