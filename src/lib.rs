//! Streaming LZ compression tuned for log-like data: many small writes
//! whose contents repeat near-verbatim fragments of earlier writes.
//!
//! Two properties set the format apart from general-purpose LZ codecs:
//!
//! - **Write-through streaming.** Every [`Writer`] write is compressed in
//!   isolation and handed to the sink in exactly one sink call. Nothing
//!   uncompressed is retained between calls, so a crash loses at most the
//!   in-flight write and the bytes already in the sink always form a valid
//!   stream prefix.
//! - **Resumable concatenation.** Independently compressed streams can be
//!   concatenated byte-wise, with any amount of zero padding in between,
//!   and a single [`Reader`] decodes the lot.
//!
//! Compression is a greedy single-pass match over a power-of-two sliding
//! window, with a run-length specialization for periodic data and zero
//! runs, so the ratio comes from redundancy *between* writes rather than
//! entropy coding within one.
//!
//! ```
//! use std::io::{Read, Write};
//!
//! let mut writer = eazy::Writer::new(Vec::new(), 64 * 1024, 1024);
//! writer.write_all(b"first log line").unwrap();
//! writer.write_all(b"second log line").unwrap();
//! let compressed = writer.into_inner();
//!
//! let mut decoded = Vec::new();
//! eazy::Reader::new(&compressed[..]).read_to_end(&mut decoded).unwrap();
//! assert_eq!(decoded, b"first log linesecond log line");
//! ```

use std::io;

use thiserror::Error;

mod reader;
mod tag;
mod window;
mod writer;

pub use reader::{ReadStatus, Reader, ReaderOptions};
pub use tag::{
    LEN1, LEN2, LEN4, LEN_ALT, META, META_BREAK, META_LEN0, META_LEN_WIDE, META_MAGIC,
    META_RESET, META_VER, OFF1, OFF2, OFF4, OFF_LONG, TAG_COPY, TAG_LITERAL,
};
pub use writer::{Writer, WriterOptions};

/// First bytes of a compressed stream when the magic is enabled: a meta
/// element whose payload is the ASCII name of the format.
pub const MAGIC: &[u8] = b"\x80\x02eazy";

/// Latest supported wire format version.
pub const VERSION: u8 = 1;

/// Decoding errors. Encoding can only fail with [`Error::Io`] (surfaced as
/// `io::Error` by the [`Writer`]); the encoder is total otherwise.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A length or offset is out of range for the window, or a reserved
    /// wire code was used.
    #[error("length or offset overflow")]
    Overflow,
    /// Magic bytes were present but wrong.
    #[error("bad magic bytes")]
    BadMagic,
    /// The stream does not open with magic bytes but the reader requires
    /// them.
    #[error("magic bytes required but not present")]
    NoMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    /// Unrecognized meta kind, or a recognized one with an impossible
    /// payload.
    #[error("unsupported meta element {0:#04x}")]
    UnsupportedMeta(u8),
    /// The stream asked for a bigger window than the reader allows.
    #[error("window of 1<<{log2} bytes exceeds the configured limit of {limit}")]
    WindowSizeOverLimit { log2: u8, limit: usize },
    /// A data element arrived before any window reset; there is nothing
    /// to decode into.
    #[error("data element before any window reset")]
    MissingReset,
    /// The source ended in the middle of an element.
    #[error("unexpected end of stream")]
    UnexpectedEof,
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(inner) => inner,
            other @ Error::UnexpectedEof => {
                io::Error::new(io::ErrorKind::UnexpectedEof, other)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
