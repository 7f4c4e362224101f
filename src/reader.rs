//! Decompressing reader.
//!
//! The reader is a resumable state machine: it parses one wire element at a
//! time out of an internal input buffer, refilling from the source whenever
//! a parse step runs short, and reconstructs the sliding window as it
//! serves bytes to the caller. Nothing is assumed about how the compressed
//! bytes are chunked: streams may be concatenated, zero-padded between
//! elements, or delivered a byte at a time.

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::tag::{
    self, META_BREAK, META_MAGIC, META_RESET, META_VER, TAG_LITERAL, TakeError,
};
use crate::window::Window;
use crate::{Error, VERSION};

/// Pre-standard stream prefixes; the byte after the prefix is the
/// base-2 logarithm of the window size.
const LEGACY_TLZ: &[u8] = b"\x00\x03tlz\x00\x13000\x00\x20";
const LEGACY_EAZY: &[u8] = b"\x00\x02eazy\x00\x08";

/// Configuration for a [`Reader`].
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Largest window a stream header may allocate. Zero disables the
    /// check. Also bounds individual element lengths.
    pub window_size_limit: usize,
    /// Reject streams that do not open with the file magic.
    pub require_magic: bool,
    /// Skip meta elements of unknown kinds instead of failing.
    pub skip_unsupported_meta: bool,
    /// Recognize pre-standard stream prefixes.
    pub accept_legacy: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            window_size_limit: 16 << 20,
            require_magic: false,
            skip_unsupported_meta: false,
            accept_legacy: false,
        }
    }
}

/// Why a [`Reader::read`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The destination is full; more data may follow.
    Filled,
    /// A chunk break was consumed after the returned bytes.
    Break,
    /// The source is exhausted.
    Eof,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Literal { rem: usize },
    Copy { from: i64, rem: usize },
}

/// Outcome of one state-machine step, internal to the read loop.
enum Step {
    /// More input is needed before the current element can progress.
    Short,
    /// A break element was consumed.
    Break,
    Fatal(Error),
}

impl From<TakeError> for Step {
    fn from(e: TakeError) -> Self {
        match e {
            TakeError::Short => Step::Short,
            TakeError::Overflow => Step::Fatal(Error::Overflow),
        }
    }
}

/// Streaming decompressor over any [`io::Read`] source.
pub struct Reader<R> {
    src: R,
    opts: ReaderOptions,

    ver: u8,
    window: Window,
    state: State,

    b: Vec<u8>,
    i: usize,
    boff: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(src: R) -> Self {
        Self::with_options(src, ReaderOptions::default())
    }

    pub fn with_options(src: R, options: ReaderOptions) -> Self {
        Self {
            src,
            opts: options,
            ver: 0,
            window: Window::new(),
            state: State::Idle,
            b: Vec::new(),
            i: 0,
            boff: 0,
        }
    }

    /// Rewinds all stream state and switches to a new source, reusing the
    /// allocations. Returns the previous source.
    pub fn reset(&mut self, src: R) -> R {
        let old = std::mem::replace(&mut self.src, src);
        self.ver = 0;
        self.window.release();
        self.state = State::Idle;
        self.b.clear();
        self.i = 0;
        self.boff = 0;
        old
    }

    pub fn get_ref(&self) -> &R {
        &self.src
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.src
    }

    /// Consumes the reader, returning the source.
    pub fn into_inner(self) -> R {
        self.src
    }

    /// Fills `p` with decoded bytes. Decoding stops when the destination
    /// is full, when a break element is consumed, or at end of source; the
    /// status says which. End of source in the middle of an element is
    /// [`Error::UnexpectedEof`].
    pub fn read(&mut self, p: &mut [u8]) -> Result<(usize, ReadStatus), Error> {
        let mut n = 0;

        while n < p.len() {
            match self.step(&mut p[n..]) {
                Ok(m) => n += m,
                Err(Step::Short) => {
                    if self.refill()? == 0 {
                        if !matches!(self.state, State::Idle) || self.i < self.b.len() {
                            return Err(Error::UnexpectedEof);
                        }
                        return Ok((n, ReadStatus::Eof));
                    }
                }
                Err(Step::Break) => return Ok((n, ReadStatus::Break)),
                Err(Step::Fatal(e)) => return Err(e),
            }
        }

        Ok((n, ReadStatus::Filled))
    }

    /// Parses tags until a data element is current, then serves as much of
    /// it as fits.
    fn step(&mut self, p: &mut [u8]) -> Result<usize, Step> {
        while matches!(self.state, State::Idle) {
            self.parse_tag()?;
        }

        if self.window.size() == 0 {
            return Err(Step::Fatal(Error::MissingReset));
        }

        match self.state {
            State::Idle => unreachable!("parse loop leaves a data element current"),

            State::Literal { rem } => {
                if self.i == self.b.len() {
                    return Err(Step::Short);
                }

                let n = rem.min(p.len()).min(self.b.len() - self.i);
                p[..n].copy_from_slice(&self.b[self.i..self.i + n]);
                self.i += n;

                self.window.write(&p[..n]);
                self.state = if n == rem {
                    State::Idle
                } else {
                    State::Literal { rem: rem - n }
                };
                Ok(n)
            }

            State::Copy { from, rem } => {
                let pos = self.window.pos() as i64;
                let mut n = rem.min(p.len());

                if from + rem as i64 <= pos {
                    // The whole remaining copy lies behind the write head;
                    // take the contiguous piece before the ring wrap.
                    n = self.window.copy_to(from, &mut p[..n]);
                } else if from == pos {
                    // The implicit zero byte at the head: a zero run.
                    p[..n].fill(0);
                } else {
                    // Forward overlap: only `pos - from` source bytes exist
                    // yet. Serve those, append them to the window, and let
                    // the next pass copy from what this one produced.
                    let live = (pos - from) as usize;
                    if n > live {
                        n = live;
                    }
                    let mut j = 0;
                    while j < n {
                        j += self.window.copy_to(from + j as i64, &mut p[j..n]);
                    }
                }

                self.window.write(&p[..n]);
                self.state = if n == rem {
                    State::Idle
                } else {
                    State::Copy { from: from + n as i64, rem: rem - n }
                };
                Ok(n)
            }
        }
    }

    /// Parses one element header starting at the current buffer index. On
    /// success either a data element is current or a meta element has been
    /// fully handled. Leaves the index at the element start when more
    /// input is needed, so the element is re-parsed after a refill.
    fn parse_tag(&mut self) -> Result<(), Step> {
        if self.opts.accept_legacy {
            self.check_legacy(LEGACY_TLZ)?;
            self.check_legacy(LEGACY_EAZY)?;
        }

        // Zero bytes between elements are padding.
        while self.i < self.b.len() && self.b[self.i] == 0 {
            self.i += 1;
        }

        let st = self.i;
        let ((tag, len), next) = tag::take_tag(&self.b, st, self.ver)?;

        if self.boff == 0 && st == 0 && self.opts.require_magic && self.b[st] != tag::META {
            return Err(Step::Fatal(Error::NoMagic));
        }

        if tag == tag::META && len == 0 {
            return self.parse_meta(next, st);
        }

        if self.opts.window_size_limit != 0 && len > self.opts.window_size_limit {
            return Err(Step::Fatal(Error::Overflow));
        }

        if tag == TAG_LITERAL {
            self.state = State::Literal { rem: len };
            self.i = next;
        } else {
            let (off, next) = tag::take_offset(&self.b, next, len, self.ver)?;
            if off > self.window.size() {
                return Err(Step::Fatal(Error::Overflow));
            }
            self.state = State::Copy {
                from: self.window.pos() as i64 - off as i64,
                rem: len,
            };
            self.i = next;
        }

        Ok(())
    }

    /// Handles a meta element. `at` points just past the introducing tag
    /// byte, `st` at the tag byte itself.
    fn parse_meta(&mut self, at: usize, st: usize) -> Result<(), Step> {
        let ((kind, len), next) = tag::take_meta(&self.b, at)?;

        if self.boff == 0 && st == 0 && self.opts.require_magic && kind != META_MAGIC {
            return Err(Step::Fatal(Error::NoMagic));
        }

        if self.b.len() - next < len {
            return Err(Step::Short);
        }

        let expected = match kind {
            META_MAGIC => Some(4),
            META_VER | META_RESET => Some(1),
            META_BREAK => Some(0),
            _ => None,
        };
        if expected.is_some_and(|want| len != want) {
            return Err(Step::Fatal(Error::UnsupportedMeta(kind)));
        }

        match kind {
            META_MAGIC => {
                if &self.b[next..next + len] != b"eazy" {
                    return Err(Step::Fatal(Error::BadMagic));
                }
            }
            META_VER => {
                let ver = self.b[next];
                if ver > VERSION {
                    return Err(Step::Fatal(Error::UnsupportedVersion(ver)));
                }
                self.ver = ver;
            }
            META_RESET => {
                let log2 = self.b[next];
                self.reset_window(log2)?;
            }
            META_BREAK => {
                self.i = next;
                return Err(Step::Break);
            }
            _ => {
                if !self.opts.skip_unsupported_meta {
                    return Err(Step::Fatal(Error::UnsupportedMeta(kind)));
                }
                trace!(kind, len, "skipping unsupported meta element");
            }
        }

        self.i = next + len;
        Ok(())
    }

    fn reset_window(&mut self, log2: u8) -> Result<(), Step> {
        if log2 > 32 {
            return Err(Step::Fatal(Error::Overflow));
        }

        let limit = self.opts.window_size_limit;
        if limit != 0 && 1u64 << log2 > limit as u64 {
            return Err(Step::Fatal(Error::WindowSizeOverLimit { log2, limit }));
        }

        debug!(window_size = 1u64 << log2, "stream window reset");
        self.window.reset(log2 as u32);
        self.state = State::Idle;
        Ok(())
    }

    /// Detects one legacy prefix at the current index. A partial match at
    /// the end of the buffer asks for more input.
    fn check_legacy(&mut self, prefix: &[u8]) -> Result<(), Step> {
        let db = &self.b[self.i..];

        if db.len() <= prefix.len() {
            if prefix.starts_with(db) {
                return Err(Step::Short);
            }
            return Ok(());
        }

        if db.starts_with(prefix) {
            let log2 = db[prefix.len()];
            debug!(log2, "legacy stream prefix");
            self.reset_window(log2)?;
            self.ver = 0;
            self.i += prefix.len() + 1;
        }

        Ok(())
    }

    /// Compacts the consumed prefix of the input buffer and reads more
    /// from the source. Returns the number of new bytes; zero means end
    /// of source.
    fn refill(&mut self) -> Result<usize, Error> {
        self.b.copy_within(self.i.., 0);
        self.b.truncate(self.b.len() - self.i);
        self.boff += self.i as u64;
        self.i = 0;

        let old = self.b.len();
        self.b.reserve(if old == 0 { 1024 } else { 8 });
        let cap = self.b.capacity();
        self.b.resize(cap, 0);

        loop {
            match self.src.read(&mut self.b[old..]) {
                Ok(n) => {
                    self.b.truncate(old + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.b.truncate(old);
                    return Err(Error::Io(e));
                }
            }
        }
    }
}

/// Breaks are invisible through this interface: callers that do not care
/// about chunk boundaries see one unbroken byte stream.
impl<R: Read> Read for Reader<R> {
    fn read(&mut self, p: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;

        while n < p.len() {
            let (m, status) = Reader::read(self, &mut p[n..]).map_err(io::Error::from)?;
            n += m;
            match status {
                ReadStatus::Break => continue,
                ReadStatus::Filled | ReadStatus::Eof => break,
            }
        }

        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{LEN1, META, META_LEN0, OFF_LONG, TAG_COPY};

    fn bytes_reader(b: &[u8]) -> Reader<&[u8]> {
        Reader::new(b)
    }

    /// Header for a headerless-magic test stream: version 1, window
    /// `1 << log2`.
    fn header(log2: u8) -> Vec<u8> {
        vec![META, META_VER, 1, META, META_RESET, log2]
    }

    #[test]
    fn literal_served_across_partial_reads() {
        let mut b = header(5);
        b.push(TAG_LITERAL | 18);
        b.extend_from_slice(b"very_first_message");

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 10];

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!((n, status), (10, ReadStatus::Filled));
        assert_eq!(&p, b"very_first");

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!((n, status), (8, ReadStatus::Eof));
        assert_eq!(&p[..n], b"_message");
    }

    #[test]
    fn long_offset_copies_repeat_recent_output() {
        let mut b = header(4);
        b.extend_from_slice(&[TAG_LITERAL | 1, b'a', TAG_COPY | 5, OFF_LONG, 1]);
        b.extend_from_slice(&[TAG_LITERAL | 2, b'b', b'c', TAG_COPY | 5, OFF_LONG, 2]);
        b.extend_from_slice(&[TAG_LITERAL | 2, b'x', b'x']);

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 32];

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!(status, ReadStatus::Eof);
        assert_eq!(&p[..n], b"aaaaaabcbcbcbxx");
    }

    #[test]
    fn zero_offset_copy_is_a_zero_run() {
        let b = [
            META, META_RESET, 2,
            META, META_VER, 1,
            TAG_COPY | 10, OFF_LONG, 0,
        ];

        let mut p = [0u8; 16];
        p[..12].copy_from_slice(b"some_garbage");

        let mut r = bytes_reader(&b);
        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!(status, ReadStatus::Eof);
        assert_eq!(&p[..n], &[0u8; 10]);
    }

    #[test]
    fn copy_longer_than_produced_output_wraps_forward() {
        // "ab" then a 6-byte copy at distance 2: periodic extension.
        let mut b = header(4);
        b.extend_from_slice(&[TAG_LITERAL | 2, b'a', b'b', TAG_COPY | 6, OFF_LONG, 2]);

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 16];
        let (n, _) = r.read(&mut p).expect("read should succeed");
        assert_eq!(&p[..n], b"abababab");
    }

    #[test]
    fn padding_between_elements_is_skipped() {
        let mut b = header(5);
        b.extend_from_slice(&[0; 7]);
        b.extend_from_slice(&[TAG_LITERAL | 1, b'x']);
        b.extend_from_slice(&[0; 32]);
        b.extend_from_slice(&[TAG_LITERAL | 1, b'y']);
        b.extend_from_slice(&[0; 3]);

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 8];
        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!(status, ReadStatus::Eof);
        assert_eq!(&p[..n], b"xy");
    }

    #[test]
    fn breaks_are_reported_once_each() {
        let mut b = header(5);
        b.extend_from_slice(&[TAG_LITERAL | 3, b'a', b'b', b'c']);
        b.extend_from_slice(&[META, META_BREAK | META_LEN0]);
        b.extend_from_slice(&[TAG_LITERAL | 3, b'd', b'e', b'f']);

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 16];

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!((n, status), (3, ReadStatus::Break));
        assert_eq!(&p[..n], b"abc");

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!((n, status), (3, ReadStatus::Eof));
        assert_eq!(&p[..n], b"def");
    }

    #[test]
    fn break_with_no_data_still_surfaces() {
        let mut b = header(5);
        b.extend_from_slice(&[META, META_BREAK | META_LEN0]);

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 4];

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!((n, status), (0, ReadStatus::Break));

        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!((n, status), (0, ReadStatus::Eof));
    }

    #[test]
    fn data_before_any_window_reset_is_an_error() {
        let b = [TAG_LITERAL | 1, b'a'];
        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::MissingReset));
    }

    #[test]
    fn copy_past_the_window_is_an_error() {
        let mut b = header(14);
        b.extend_from_slice(&[TAG_LITERAL | 3, 0x94, 0xa8, 0xfb]);
        b.extend_from_slice(&[TAG_COPY | 9, 0xfd, 0x03, 0x65]);

        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 64]).expect_err("must fail");
        assert!(matches!(err, Error::Overflow));
    }

    #[test]
    fn truncation_inside_an_element_is_unexpected_eof() {
        // A literal that promises more bytes than the stream has.
        let mut b = header(5);
        b.extend_from_slice(&[TAG_LITERAL | 5, b'a']);

        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 16]).expect_err("must fail");
        assert!(matches!(err, Error::UnexpectedEof));

        // A copy whose offset never arrives.
        let mut b = header(5);
        b.extend_from_slice(&[TAG_LITERAL | 1, b'a', TAG_COPY | 9]);

        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 16]).expect_err("must fail");
        assert!(matches!(err, Error::UnexpectedEof));
    }

    #[test]
    fn reserved_length_code_is_an_error() {
        let mut b = header(5);
        b.push(TAG_LITERAL | crate::tag::LEN_ALT);

        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::Overflow));
    }

    #[test]
    fn version_zero_offsets_are_trailing_big_endian() {
        let mut b = vec![META, META_VER, 0, META, META_RESET, 5];
        b.extend_from_slice(&[TAG_LITERAL | 8]);
        b.extend_from_slice(b"prefix_1");
        // Copy the 8 bytes again: trailing distance 0, stored raw.
        b.extend_from_slice(&[TAG_COPY | 8, 0]);

        let mut r = bytes_reader(&b);
        let mut p = [0u8; 32];
        let (n, _) = r.read(&mut p).expect("read should succeed");
        assert_eq!(&p[..n], b"prefix_1prefix_1");
    }

    #[test]
    fn missing_magic_is_rejected_when_required() {
        let b = [META, META_VER, 1, META, META_RESET, 5, TAG_LITERAL | 1, b'a'];
        let mut r = Reader::with_options(
            &b[..],
            ReaderOptions { require_magic: true, ..ReaderOptions::default() },
        );
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::NoMagic));
    }

    #[test]
    fn wrong_magic_payload_is_rejected() {
        let b = [META, META_MAGIC | 2, b'e', b'a', b'z', b'q'];
        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::BadMagic));
    }

    #[test]
    fn future_version_is_rejected() {
        let b = [META, META_VER, VERSION + 1];
        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::UnsupportedVersion(v) if v == VERSION + 1));
    }

    #[test]
    fn unknown_meta_kinds_respect_the_skip_flag() {
        let mut b = header(5);
        b.extend_from_slice(&[META, (10 << 3) | 2, 1, 2, 3, 4]);
        b.extend_from_slice(&[TAG_LITERAL | 1, b'z']);

        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::UnsupportedMeta(k) if k == 10 << 3));

        let mut r = Reader::with_options(
            &b[..],
            ReaderOptions { skip_unsupported_meta: true, ..ReaderOptions::default() },
        );
        let mut p = [0u8; 4];
        let (n, _) = r.read(&mut p).expect("read should succeed");
        assert_eq!(&p[..n], b"z");
    }

    #[test]
    fn known_meta_with_wrong_payload_length_is_rejected() {
        // A version element with a two-byte payload.
        let b = [META, META_VER | 1, 1, 1];
        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::UnsupportedMeta(k) if k == META_VER));
    }

    #[test]
    fn window_reset_respects_the_size_limit() {
        let b = [META, META_RESET, 25];
        let mut r = Reader::with_options(
            &b[..],
            ReaderOptions { window_size_limit: 1 << 20, ..ReaderOptions::default() },
        );
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::WindowSizeOverLimit { log2: 25, limit } if limit == 1 << 20));

        let b = [META, META_RESET, 33];
        let mut r = bytes_reader(&b);
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::Overflow));
    }

    #[test]
    fn element_length_over_the_limit_is_rejected() {
        let mut b = header(5);
        // A literal of 380 bytes against a 256-byte limit.
        b.extend_from_slice(&[TAG_LITERAL | LEN1, 0xff]);

        let mut r = Reader::with_options(
            &b[..],
            ReaderOptions { window_size_limit: 256, ..ReaderOptions::default() },
        );
        let err = r.read(&mut [0u8; 4]).expect_err("must fail");
        assert!(matches!(err, Error::Overflow));
    }

    #[test]
    fn legacy_prefixes_are_opt_in() {
        let mut b = LEGACY_EAZY.to_vec();
        b.push(5); // 32-byte window
        b.extend_from_slice(&[TAG_LITERAL | 3, b'a', b'b', b'c']);

        let mut r = Reader::with_options(
            &b[..],
            ReaderOptions { accept_legacy: true, ..ReaderOptions::default() },
        );
        let mut p = [0u8; 8];
        let (n, status) = r.read(&mut p).expect("read should succeed");
        assert_eq!(status, ReadStatus::Eof);
        assert_eq!(&p[..n], b"abc");
    }

    #[test]
    fn reset_rewinds_for_a_new_stream() {
        let mut a = header(5);
        a.extend_from_slice(&[TAG_LITERAL | 3, b'a', b'b', b'c']);
        let mut b = header(5);
        b.extend_from_slice(&[TAG_LITERAL | 3, b'x', b'y', b'z']);

        let mut r = bytes_reader(&a);
        let mut p = [0u8; 8];
        let (n, _) = r.read(&mut p).expect("read should succeed");
        assert_eq!(&p[..n], b"abc");

        r.reset(&b);
        let (n, _) = r.read(&mut p).expect("read should succeed");
        assert_eq!(&p[..n], b"xyz");
    }

    /// Source that trickles one byte per call, forcing refills inside
    /// every element.
    struct OneByte<'a>(&'a [u8]);

    impl Read for OneByte<'_> {
        fn read(&mut self, p: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || p.is_empty() {
                return Ok(0);
            }
            p[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn byte_at_a_time_source_decodes_identically() {
        let mut b = header(5);
        b.extend_from_slice(&[TAG_LITERAL | 18]);
        b.extend_from_slice(b"prefix_1234_suffix");
        b.extend_from_slice(&[TAG_COPY | 7, 0x12 - 7]);
        b.extend_from_slice(&[TAG_LITERAL | 3, b'5', b'6', b'7']);
        b.extend_from_slice(&[TAG_COPY | 7, 0x11 - 7]);

        let mut r = Reader::new(OneByte(&b));
        let mut out = Vec::new();
        io::Read::read_to_end(&mut r, &mut out).expect("read should succeed");
        assert_eq!(out, b"prefix_1234_suffixprefix_567_suffix");
    }
}
