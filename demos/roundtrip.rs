//! Basic encode/decode round trip.
//!
//! Run with:
//!     cargo run --example roundtrip

use fecframe::{FecConfig, decode, encode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 100 KB of sample data
    let data: Vec<u8> = (0..100_000).map(|i| (i % 251) as u8).collect();

    // 1 KiB symbols, 10 per block, 2 repair symbols per block
    let config = FecConfig::new(1024, 10, 2)?;

    let mut wire = vec![0u8; fecframe::Encoder::new(config)?.encoded_len(data.len())];
    let written = encode(config, &data, &mut wire)?;

    println!(
        "Encoded {} bytes into {} bytes of frames ({} frames of {} bytes)",
        data.len(),
        written,
        written / config.frame_len(),
        config.frame_len()
    );

    let mut restored = vec![0u8; data.len()];
    decode(config, data.len(), &wire[..written], &mut restored)?;

    assert_eq!(restored, data);
    println!("Decoded {} bytes, contents match", restored.len());

    Ok(())
}
