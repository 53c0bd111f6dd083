#![no_main]

use libfuzzer_sys::fuzz_target;
use fecframe::{Decoder, Encoder, FecConfig, FrameReader};

fuzz_target!(|data: Vec<u8>| {
    if data.is_empty() {
        return;
    }

    let config = FecConfig::new(8, 10, 4).unwrap();
    let wire = Encoder::new(config).unwrap().encode_bytes(&data).unwrap();

    // Verify: frame count matches the layout
    let frames: Vec<_> = FrameReader::new(&wire, config.layout())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(frames.len() * config.frame_len(), wire.len());

    // Verify: dropping one source symbol per block is recoverable from repair
    let mut decoder = Decoder::new(config, data.len()).unwrap();
    for frame in frames.into_iter().rev() {
        if frame.symbol_id != 1 {
            decoder.ingest_frame(frame).unwrap();
        }
    }
    assert_eq!(decoder.finish().unwrap(), data);
});
