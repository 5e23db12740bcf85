//! Streaming multi-member gzip decompression.
//!
//! Alpine package archives are several gzip members concatenated in one file:
//! a signature container first, then the manifest container, then file data.
//! [`DecompressionStream`] decodes one member at a time; [`reset`] advances to
//! the next concatenated member at the current input position. A registered
//! [`CaptureSink`] observes every slice of *compressed* input the decoder
//! consumes, which is how the scheme's content identifier (a digest over the
//! encoded bytes of the manifest member, not its plaintext) is computed.
//!
//! [`reset`]: DecompressionStream::reset

use std::cell::RefCell;
use std::io::{self, BufRead, Read};
use std::mem;
use std::rc::Rc;

use flate2::bufread::GzDecoder;
use sha1::digest::Digest;

/// Fixed size of the compressed-input buffer.
const INPUT_BUF_SIZE: usize = 64 * 1024;

/// Receiver for compressed-input slices as the decoder consumes them.
///
/// The sink is invoked synchronously, before any further decoding proceeds,
/// with exactly the bytes consumed since the previous invocation.
pub trait CaptureSink {
    /// Observe one consumed slice of compressed input.
    fn consume(&mut self, bytes: &[u8]);
}

/// Shared handle to a capture sink (ingestion is single-threaded).
pub type CaptureHandle = Rc<RefCell<dyn CaptureSink>>;

/// A [`CaptureSink`] that feeds a digest and counts the bytes seen.
#[derive(Debug, Default)]
pub struct DigestCapture<D> {
    digest: D,
    seen: u64,
}

impl<D: Digest + Default> DigestCapture<D> {
    /// Create a capture over a fresh digest state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of compressed bytes observed so far.
    pub fn bytes_seen(&self) -> u64 {
        self.seen
    }

    /// Finish the digest, resetting the accumulator.
    pub fn take_digest(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.digest).finalize().to_vec()
    }
}

impl<D: Digest> CaptureSink for DigestCapture<D> {
    fn consume(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
        self.seen += bytes.len() as u64;
    }
}

/// Fixed-buffer `BufRead` over the compressed source that reports every
/// consumed slice to the optional capture sink.
struct TapReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    sink: Option<CaptureHandle>,
}

impl<R: Read> TapReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0; INPUT_BUF_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            sink: None,
        }
    }
}

impl<R: Read> Read for TapReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = {
            let data = self.fill_buf()?;
            let n = data.len().min(out.len());
            out[..n].copy_from_slice(&data[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for TapReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos == self.filled {
            self.filled = self.inner.read(&mut self.buf)?;
            self.pos = 0;
        }
        Ok(&self.buf[self.pos..self.filled])
    }

    fn consume(&mut self, amt: usize) {
        let end = self.pos + amt;
        if amt > 0 {
            if let Some(sink) = &self.sink {
                sink.borrow_mut().consume(&self.buf[self.pos..end]);
            }
        }
        self.pos = end;
    }
}

/// Decoder state for the current member.
enum MemberState<R: Read> {
    /// At a member boundary. The decoder is armed on the next read, so the
    /// gzip header is consumed through the tap after any sink registration.
    Boundary(TapReader<R>),
    /// Mid-member; stays here yielding `Ok(0)` once the member ends.
    Decoding(GzDecoder<TapReader<R>>),
    /// The source ran out of input at a reset.
    Exhausted,
}

/// Streaming reader over one member of a concatenated multi-member gzip file.
///
/// Reads yield the current member's decompressed output and return `Ok(0)` at
/// the member's logical end (and on every read thereafter). Decode errors and
/// physical EOF while the decoder still expects input surface as `io::Error`.
/// Call [`reset`](Self::reset) to continue with the next member.
pub struct DecompressionStream<R: Read> {
    state: MemberState<R>,
}

impl<R: Read> std::fmt::Debug for DecompressionStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompressionStream").finish_non_exhaustive()
    }
}

impl<R: Read> DecompressionStream<R> {
    /// Wrap a compressed source. The gzip header is consumed and validated
    /// lazily, on the first read.
    pub fn new(reader: R) -> Self {
        Self {
            state: MemberState::Boundary(TapReader::new(reader)),
        }
    }

    /// Register (or clear) the compressed-byte capture sink.
    ///
    /// The sink observes exactly the compressed bytes consumed from this
    /// point on, so registering it right after a [`reset`](Self::reset)
    /// scopes its digest to the following member(s), gzip headers included.
    pub fn set_capture(&mut self, sink: Option<CaptureHandle>) {
        match &mut self.state {
            MemberState::Boundary(tap) => tap.sink = sink,
            MemberState::Decoding(decoder) => decoder.get_mut().sink = sink,
            MemberState::Exhausted => {}
        }
    }

    /// Advance to the next concatenated member.
    ///
    /// Clears the end-of-member state and guarantees at least one buffered
    /// input byte, refilling from the source if the buffer is empty. Returns
    /// `Ok(false)` if the source is exhausted; otherwise the next read begins
    /// decoding a new member at the current input position. The input buffer
    /// and its remaining contents are reused across members.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the underlying source.
    pub fn reset(&mut self) -> io::Result<bool> {
        let mut tap = match mem::replace(&mut self.state, MemberState::Exhausted) {
            MemberState::Boundary(tap) => tap,
            MemberState::Decoding(decoder) => decoder.into_inner(),
            MemberState::Exhausted => return Ok(false),
        };
        let more = !tap.fill_buf()?.is_empty();
        if more {
            self.state = MemberState::Boundary(tap);
        }
        Ok(more)
    }

    /// Read and discard the rest of the current member, returning the number
    /// of decompressed bytes skipped.
    ///
    /// # Errors
    ///
    /// Fails like any read: on a decode error or a truncated member.
    pub fn drain_member(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read> Read for DecompressionStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Arm at the boundary, not at construction: the header bytes flow
        // through the tap here, so a sink registered between members sees
        // the whole member. Header errors surface on this first read.
        self.state = match mem::replace(&mut self.state, MemberState::Exhausted) {
            MemberState::Boundary(tap) => MemberState::Decoding(GzDecoder::new(tap)),
            other => other,
        };
        match &mut self.state {
            MemberState::Decoding(decoder) => decoder.read(buf),
            MemberState::Boundary(_) | MemberState::Exhausted => Ok(0),
        }
    }
}
