#![no_main]

use libfuzzer_sys::fuzz_target;
use fecframe::{Decoder, FecConfig};

fuzz_target!(|data: Vec<u8>| {
    // Untrusted wire bytes: any outcome but a panic is fine
    let configs = vec![
        FecConfig::new(4, 10, 2).unwrap(),
        FecConfig::new(16, 12, 4).unwrap(),
        FecConfig::new(16, 12, 4).unwrap().with_frame_digest(true),
    ];

    for config in configs {
        for total in [1, config.block_len() - 1, 3 * config.block_len()] {
            let mut decoder = Decoder::new(config, total).unwrap();
            if decoder.ingest(&data).is_err() {
                continue;
            }
            if let Ok(out) = decoder.finish() {
                // A successful decode always yields exactly the byte budget
                assert_eq!(out.len(), total);
            }
        }
    }
});
