//! Reader-driven encoding - FrameIter.

use std::io::{self, Read};

use super::block::BlockEncoder;
use crate::buffer::Buffer;
use crate::codec::SymbolEncoder;
use crate::error::FecError;
use crate::frame::SymbolFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Source,
    Prepare,
    Repair { next: u32 },
    Done,
}

/// An iterator that yields frames from a reader.
///
/// Source frames are yielded as soon as their symbol has been read; a block's
/// repair frames follow its last source frame. Only one block of input is
/// held in memory at a time.
///
/// Created by [`Encoder::frames`](super::Encoder::frames).
pub struct FrameIter<R, E> {
    reader: R,
    block: BlockEncoder<E>,
    chunk: Buffer,
    state: State,
    eof: bool,
}

impl<R: Read, E: SymbolEncoder> FrameIter<R, E> {
    pub(crate) fn new(reader: R, block: BlockEncoder<E>, symbol_size: usize) -> Self {
        Self {
            reader,
            block,
            chunk: Buffer::take(symbol_size),
            state: State::Source,
            eof: false,
        }
    }

    fn fail(&mut self, err: FecError) -> Option<Result<SymbolFrame, FecError>> {
        self.state = State::Done;
        Some(Err(err))
    }
}

impl<R: Read, E: SymbolEncoder> Iterator for FrameIter<R, E> {
    type Item = Result<SymbolFrame, FecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Done => return None,

                State::Source => {
                    if self.eof {
                        self.state = if self.block.has_pending() {
                            State::Prepare
                        } else {
                            State::Done
                        };
                        continue;
                    }

                    let n = match read_full(&mut self.reader, &mut self.chunk) {
                        Ok(n) => n,
                        Err(e) => return self.fail(e.into()),
                    };
                    if n < self.chunk.len() {
                        self.eof = true;
                    }
                    if n == 0 {
                        continue;
                    }

                    let frame = match self.block.push_source(&self.chunk[..n]) {
                        Ok(frame) => frame,
                        Err(e) => return self.fail(e),
                    };
                    if self.block.is_full() {
                        self.state = State::Prepare;
                    }
                    return Some(Ok(frame));
                }

                State::Prepare => {
                    if let Err(e) = self.block.prepare_repair() {
                        return self.fail(e);
                    }
                    self.state = State::Repair { next: 0 };
                }

                State::Repair { next } => {
                    if next < self.block.repair_symbols() {
                        let frame = match self.block.repair_frame(next) {
                            Ok(frame) => frame,
                            Err(e) => return self.fail(e),
                        };
                        self.state = State::Repair { next: next + 1 };
                        return Some(Ok(frame));
                    }
                    self.block.finish_block();
                    self.state = State::Source;
                }
            }
        }
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
