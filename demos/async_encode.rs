//! Async encoding from a tokio reader.
//!
//! Run with:
//!     cargo run --example async_encode --features async-io

use futures_util::StreamExt;
use tokio_util::compat::TokioAsyncReadCompatExt;

use fecframe::{Decoder, FecConfig, encode_async};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data: Vec<u8> = (0..50_000).map(|i| (i % 256) as u8).collect();
    let config = FecConfig::new(256, 12, 3)?;

    // Any tokio AsyncRead works once converted with compat()
    let reader = std::io::Cursor::new(data.clone()).compat();
    let mut stream = encode_async(reader, config)?;

    let mut decoder = Decoder::new(config, data.len())?;
    let mut restored = Vec::new();
    let mut frames = 0;

    while let Some(frame) = stream.next().await {
        let frame = frame?;
        frames += 1;
        decoder.ingest_frame(frame)?;
        decoder.drain_ready(&mut restored)?;
    }
    decoder.finish_into(&mut restored)?;

    println!("Streamed {} frames for {} bytes", frames, data.len());
    assert_eq!(restored, data);

    Ok(())
}
