//! Decoding through a channel that drops and reorders frames.
//!
//! Frames are shuffled and a fraction of them dropped, but never more per
//! block than the repair symbols can cover.
//!
//! Run with:
//!     cargo run --example lossy_channel

use std::collections::HashMap;

use fecframe::{Decoder, Encoder, FecConfig, FrameReader};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data: Vec<u8> = (0..200_000).map(|i| (i * 7 + 3) as u8).collect();

    // 6 repair symbols per block: up to 4 losses keep a 2-symbol margin
    let config = FecConfig::new(512, 20, 6)?;
    let wire = Encoder::new(config)?.encode_bytes(&data)?;

    let mut rng = StdRng::seed_from_u64(7);
    let mut frames = FrameReader::new(&wire, config.layout()).collect::<Result<Vec<_>, _>>()?;
    let sent = frames.len();
    frames.shuffle(&mut rng);

    let mut dropped_per_block: HashMap<u32, u32> = HashMap::new();
    let mut decoder = Decoder::new(config, data.len())?;
    let mut restored = Vec::with_capacity(data.len());

    for frame in frames {
        let dropped = dropped_per_block.entry(frame.block_index).or_default();
        if *dropped < 4 && rng.gen_bool(0.15) {
            *dropped += 1;
            continue;
        }
        decoder.ingest_frame(frame)?;
        decoder.drain_ready(&mut restored)?;
    }
    decoder.finish_into(&mut restored)?;

    let lost: u32 = dropped_per_block.values().sum();
    let stats = decoder.stats();
    println!("Sent {} frames, dropped {}", sent, lost);
    println!(
        "Accepted {}, redundant {}, padding {}, peak live decoders {}",
        stats.frames_accepted,
        stats.frames_redundant,
        stats.padding_symbols,
        stats.peak_live_decoders
    );

    assert_eq!(restored, data);
    println!("Recovered {} bytes intact", restored.len());

    Ok(())
}
