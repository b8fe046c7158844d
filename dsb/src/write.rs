//! Stateful DSB stream writer: chunked output, running statistics, header.

use crate::{
    consts::{HEADER_LABEL, HEADER_LEN},
    encode::Command,
};
use snafu::{ensure, ResultExt, Snafu};
use std::io::Write;

/// Buffered bytes are handed to the sink in chunks of this size.
pub const CHUNK_LEN: usize = 1024 * 1024;

#[derive(Debug, Snafu)]
pub enum WriteError {
    #[snafu(display("the byte sink rejected a write"))]
    Io { source: std::io::Error },
    #[snafu(display("the writer is poisoned by an earlier sink error"))]
    Poisoned,
}

/// Destination for the encoded command stream. Chunks arrive strictly in
/// stream order; `close` is called exactly once, after the last chunk.
pub trait ByteSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), WriteError>;
    fn close(&mut self) -> Result<(), WriteError>;
}

impl ByteSink for Vec<u8> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), WriteError> {
        self.extend_from_slice(chunk);
        Ok(())
    }

    fn close(&mut self) -> Result<(), WriteError> {
        Ok(())
    }
}

/// Adapter turning any [`std::io::Write`] into a [`ByteSink`].
#[derive(Debug)]
pub struct IoSink<W: Write>(W);

impl<W: Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self(writer)
    }

    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), WriteError> {
        self.0.write_all(chunk).context(IoSnafu)
    }

    fn close(&mut self) -> Result<(), WriteError> {
        self.0.flush().context(IoSnafu)
    }
}

/// Final design statistics, as carried by the 512-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderStats {
    /// Count of stitch commands (jumps and color changes excluded).
    pub stitches: u64,
    pub color_changes: u64,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    /// Needle position after the last command, relative to the start.
    pub end_x: i32,
    pub end_y: i32,
}

impl HeaderStats {
    /// Renders the fixed-size ASCII header: the 20-byte label, one line
    /// per statistic, space padding to 512 bytes. Extents are reported as
    /// non-negative magnitudes on each side of the origin.
    pub fn to_header(&self) -> [u8; HEADER_LEN] {
        let lines = [
            format!("ST:      {}\n", self.stitches),
            format!("CO:  {}\n", self.color_changes),
            format!("+X:    {}\n", self.max_x.max(0)),
            format!("-X:    {}\n", self.min_x.min(0).abs()),
            format!("+Y:    {}\n", self.max_y.max(0)),
            format!("-Y:    {}\n", self.min_y.min(0).abs()),
            format!("AX:+    {}\n", self.end_x),
            format!("AY:+    {}\n", self.end_y),
        ];

        let mut header = [0x20; HEADER_LEN];
        header[..HEADER_LABEL.len()].copy_from_slice(HEADER_LABEL);

        let mut offset = HEADER_LABEL.len();
        for line in &lines {
            header[offset..offset + line.len()].copy_from_slice(line.as_bytes());
            offset += line.len();
        }

        header
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WriterState {
    x: i32,
    y: i32,
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
    stitches: u64,
    color_changes: u64,
}

impl WriterState {
    fn apply(&mut self, cmd: &Command) {
        // Signs come from the op byte, never from the raw magnitude bytes.
        let (dx, dy) = cmd.signed_delta();
        self.x += dx;
        self.y += dy;
        self.min_x = self.min_x.min(self.x);
        self.max_x = self.max_x.max(self.x);
        self.min_y = self.min_y.min(self.y);
        self.max_y = self.max_y.max(self.y);

        if cmd.is_stitch() {
            self.stitches += 1;
        }
        if cmd.is_color_change() {
            self.color_changes += 1;
        }
    }

    fn stats(&self) -> HeaderStats {
        HeaderStats {
            stitches: self.stitches,
            color_changes: self.color_changes,
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y,
            end_x: self.x,
            end_y: self.y,
        }
    }
}

/// Streams encoded commands to a sink while tracking the statistics the
/// header needs.
///
/// Commands are buffered and flushed in [`CHUNK_LEN`] chunks, in order. A
/// sink error poisons the writer; further pushes fail with
/// [`WriteError::Poisoned`] and the partial output is the caller's to
/// discard. [`finalize`](Self::finalize) consumes the writer, so pushing
/// after the end marker is unrepresentable.
#[derive(Debug)]
pub struct DsbWriter<S: ByteSink> {
    sink: S,
    buf: Vec<u8>,
    state: WriterState,
    poisoned: bool,
}

impl<S: ByteSink> DsbWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            buf: Vec::with_capacity(CHUNK_LEN),
            state: WriterState::default(),
            poisoned: false,
        }
    }

    pub fn push(&mut self, cmd: &Command) -> Result<(), WriteError> {
        ensure!(!self.poisoned, PoisonedSnafu);

        self.buf.extend_from_slice(&cmd.to_bytes());
        self.state.apply(cmd);

        if self.buf.len() >= CHUNK_LEN {
            self.flush()?;
        }
        Ok(())
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> HeaderStats {
        self.state.stats()
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        if !self.buf.is_empty() {
            if let Err(e) = self.sink.write_chunk(&self.buf) {
                self.poisoned = true;
                return Err(e);
            }
            self.buf.clear();
        }
        Ok(())
    }

    /// Appends the end marker, flushes, closes the sink, and returns the
    /// final statistics along with the sink.
    pub fn finalize(mut self) -> Result<(HeaderStats, S), WriteError> {
        self.push(&Command::END)?;
        self.flush()?;
        self.sink.close()?;
        Ok((self.state.stats(), self.sink))
    }
}
