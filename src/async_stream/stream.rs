//! Async stream adapter for encoding.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use fecframe::{encode_async, FecConfig};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), fecframe::FecError> {
//!     let mut stream = encode_async(reader, FecConfig::default())?;
//!
//!     while let Some(frame) = stream.next().await {
//!         let frame = frame?;
//!         println!("{frame}");
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;

use crate::codec::{ErasureCodec, RaptorQEncoder, SymbolEncoder};
use crate::config::FecConfig;
use crate::encoder::{BlockEncoder, Encoder};
use crate::error::FecError;
use crate::frame::SymbolFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Source,
    Prepare,
    Repair { next: u32 },
    Done,
}

pin_project! {
    /// A stream that yields frames from an async reader.
    ///
    /// Same frame order as [`FrameIter`](crate::FrameIter): each block's
    /// source frames as they are read, then its repair frames.
    pub struct FrameStream<R, E> {
        #[pin]
        reader: R,
        block: BlockEncoder<E>,
        chunk: Vec<u8>,
        filled: usize,
        state: State,
        eof: bool,
    }
}

impl<R, E> FrameStream<R, E> {
    fn new(reader: R, block: BlockEncoder<E>, symbol_size: usize) -> Self {
        Self {
            reader,
            block,
            chunk: vec![0u8; symbol_size],
            filled: 0,
            state: State::Source,
            eof: false,
        }
    }
}

impl<R: AsyncRead, E: SymbolEncoder> Stream for FrameStream<R, E> {
    type Item = Result<SymbolFrame, FecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match *this.state {
                State::Done => return Poll::Ready(None),

                State::Source => {
                    if *this.eof {
                        *this.state = if this.block.has_pending() {
                            State::Prepare
                        } else {
                            State::Done
                        };
                        continue;
                    }

                    // Fill one symbol; a pending read keeps what was read so far
                    while *this.filled < this.chunk.len() {
                        let buf = &mut this.chunk[*this.filled..];
                        match this.reader.as_mut().poll_read(cx, buf) {
                            Poll::Pending => return Poll::Pending,
                            Poll::Ready(Ok(0)) => {
                                *this.eof = true;
                                break;
                            }
                            Poll::Ready(Ok(n)) => *this.filled += n,
                            Poll::Ready(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {}
                            Poll::Ready(Err(e)) => {
                                *this.state = State::Done;
                                return Poll::Ready(Some(Err(FecError::Io(e))));
                            }
                        }
                    }

                    let n = std::mem::take(this.filled);
                    if n == 0 {
                        continue;
                    }

                    match this.block.push_source(&this.chunk[..n]) {
                        Ok(frame) => {
                            if this.block.is_full() {
                                *this.state = State::Prepare;
                            }
                            return Poll::Ready(Some(Ok(frame)));
                        }
                        Err(e) => {
                            *this.state = State::Done;
                            return Poll::Ready(Some(Err(e)));
                        }
                    }
                }

                State::Prepare => {
                    if let Err(e) = this.block.prepare_repair() {
                        *this.state = State::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                    *this.state = State::Repair { next: 0 };
                }

                State::Repair { next } => {
                    if next < this.block.repair_symbols() {
                        let result = this.block.repair_frame(next);
                        *this.state = match result {
                            Ok(_) => State::Repair { next: next + 1 },
                            Err(_) => State::Done,
                        };
                        return Poll::Ready(Some(result));
                    }
                    this.block.finish_block();
                    *this.state = State::Source;
                }
            }
        }
    }
}

impl<C: ErasureCodec> Encoder<C> {
    /// Creates a frame stream over an async reader.
    pub fn frame_stream<R: AsyncRead>(
        &self,
        reader: R,
    ) -> Result<FrameStream<R, C::Encoder>, FecError> {
        Ok(FrameStream::new(
            reader,
            self.block_encoder()?,
            self.config().symbol_size(),
        ))
    }
}

/// Creates a RaptorQ frame stream from an async reader.
///
/// Uses `futures_io::AsyncRead` for runtime-agnostic async I/O. For tokio,
/// convert the reader with `tokio_util::compat`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use fecframe::{encode_async, FecConfig};
///
/// let file = tokio::fs::File::open("file").await?;
/// let stream = encode_async(file.compat(), FecConfig::default())?;
/// ```
///
/// # Errors
///
/// Returns [`FecError::InvalidConfig`] if `config` does not validate, or
/// [`FecError::Engine`] if the engine rejects the block parameters.
pub fn encode_async<R: AsyncRead>(
    reader: R,
    config: FecConfig,
) -> Result<FrameStream<R, RaptorQEncoder>, FecError> {
    Encoder::new(config)?.frame_stream(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parity::ParityCodec;
    use futures_util::StreamExt;

    fn parity_encoder() -> Encoder<ParityCodec> {
        Encoder::with_codec(ParityCodec::new(), FecConfig::new(4, 4, 2).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_frame_stream_empty() {
        let reader: &[u8] = &[];
        let stream = parity_encoder().frame_stream(reader).unwrap();
        let frames: Vec<_> = stream.collect().await;
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn test_frame_stream_matches_sync() {
        let data: Vec<u8> = (0..45).collect();
        let encoder = parity_encoder();

        let reader: &[u8] = &data;
        let frames: Vec<_> = encoder.frame_stream(reader).unwrap().collect().await;
        let frames = frames.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

        let sync = encoder
            .frames(std::io::Cursor::new(&data))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(frames, sync);
    }

    #[tokio::test]
    async fn test_frame_stream_split_reads() {
        use tokio_util::compat::TokioAsyncReadCompatExt;

        let data: Vec<u8> = (0..45).collect();
        let encoder = parity_encoder();

        // Reads land across symbol and block boundaries
        let reader = tokio_test::io::Builder::new()
            .read(&data[..3])
            .read(&data[3..13])
            .read(&data[13..])
            .build()
            .compat();
        let frames: Vec<_> = encoder.frame_stream(reader).unwrap().collect().await;
        let frames = frames.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

        let sync = encoder
            .frames(std::io::Cursor::new(&data))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(frames, sync);
    }

    #[tokio::test]
    async fn test_encode_async_raptorq() {
        use tokio_util::compat::TokioAsyncReadCompatExt;

        let data = vec![0x42u8; 300];
        let config = FecConfig::new(32, 10, 2).unwrap();
        let reader = std::io::Cursor::new(data.clone()).compat();

        let frames: Vec<_> = encode_async(reader, config).unwrap().collect().await;
        let frames = frames.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

        // 10 source frames, 2 repair frames
        assert_eq!(frames.len(), 12);
        assert_eq!(frames[10].symbol_id, 10);
        assert!(frames.iter().all(|f| f.payload.len() == 32));
    }
}
