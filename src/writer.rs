//! Compressing writer.
//!
//! Every [`Writer::write`] call is compressed in isolation and handed to the
//! sink in exactly one sink call, so a crash loses at most the in-flight
//! call and a reader can start consuming mid-stream output immediately. If
//! the sink fails, the writer restarts: the next call emits a fresh header,
//! which keeps the overall byte stream decodable.

use std::io::{self, Write};

use tracing::debug;

use crate::tag::{self, META_BREAK, META_MAGIC, META_RESET, META_VER, TAG_COPY, TAG_LITERAL};
use crate::window::Window;
use crate::VERSION;

/// Multiplier applied to the little-endian load of four input bytes; the
/// top bits of the product select the hash-table slot.
const FINGERPRINT_MUL: u32 = 0x1e35_a7bd;

/// Configuration for a [`Writer`].
///
/// The window is how far back similar byte sequences are found; the hash
/// table is how many four-byte sequences are remembered. Both must be
/// powers of two. A 1 MiB window with a 1024-entry table is a reasonable
/// starting point for log-like data.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub window_size: usize,
    pub hash_table_size: usize,
    /// Start the stream with the file magic. On by default.
    pub append_magic: bool,
    /// Wire format version to emit. Version 0 exists for compatibility
    /// with old readers and compresses slightly worse.
    pub format_version: u8,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            window_size: 1 << 20,
            hash_table_size: 1024,
            append_magic: true,
            format_version: VERSION,
        }
    }
}

/// Streaming compressor over any [`io::Write`] sink.
pub struct Writer<W: Write> {
    sink: W,
    append_magic: bool,
    ver: u8,

    buf: Vec<u8>,
    written: u64,

    window: Window,
    ht: Vec<u32>,
    hash_shift: u32,
}

impl<W: Write> Writer<W> {
    /// Creates a writer with the given window and hash-table sizes.
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is not a power of two in `32..=2^31`, or if
    /// `hash_table_size` is not a power of two of at least 4.
    pub fn new(sink: W, window_size: usize, hash_table_size: usize) -> Self {
        Self::with_options(
            sink,
            WriterOptions {
                window_size,
                hash_table_size,
                ..WriterOptions::default()
            },
        )
    }

    /// Creates a writer from explicit [`WriterOptions`].
    pub fn with_options(sink: W, options: WriterOptions) -> Self {
        let mut w = Self {
            sink,
            append_magic: options.append_magic,
            ver: options.format_version,
            buf: Vec::new(),
            written: 0,
            window: Window::new(),
            ht: Vec::new(),
            hash_shift: 0,
        };
        w.configure(options.window_size, options.hash_table_size);
        w
    }

    fn configure(&mut self, window_size: usize, hash_table_size: usize) {
        assert!(
            window_size.is_power_of_two()
                && window_size >= 32
                && (window_size as u64) <= 1 << 31,
            "window size must be a power of two in 32..=2^31"
        );
        assert!(
            hash_table_size.is_power_of_two() && hash_table_size >= 4,
            "hash table size must be a power of two of at least 4"
        );

        self.window.reset(window_size.trailing_zeros());
        self.ht.clear();
        self.ht.resize(hash_table_size, 0);
        self.hash_shift = 32 - hash_table_size.trailing_zeros();
    }

    /// Restarts the stream on the same sizes: the next write emits a fresh
    /// header. Returns the previous sink.
    pub fn reset(&mut self, sink: W) -> W {
        let old = std::mem::replace(&mut self.sink, sink);
        self.restart();
        old
    }

    /// Restarts the stream, reallocating the window and hash table if the
    /// requested sizes differ. Returns the previous sink.
    pub fn reset_size(&mut self, sink: W, window_size: usize, hash_table_size: usize) -> W {
        let old = std::mem::replace(&mut self.sink, sink);
        if window_size != self.window.size() || hash_table_size != self.ht.len() {
            self.configure(window_size, hash_table_size);
        }
        self.restart();
        old
    }

    fn restart(&mut self) {
        self.window.clear();
        self.ht.fill(0);
        self.written = 0;
    }

    /// Emits the stream header now if nothing has been written yet.
    /// Writing data also does this implicitly.
    pub fn write_header(&mut self) -> io::Result<()> {
        if self.written != 0 {
            return Ok(());
        }
        self.buf.clear();
        self.append_header();
        self.emit()
    }

    /// Emits a break element: a logical chunk boundary the reader can
    /// observe without disturbing the byte stream.
    pub fn write_break(&mut self) -> io::Result<()> {
        self.buf.clear();
        if self.written == 0 {
            self.append_header();
        }
        tag::put_meta(&mut self.buf, META_BREAK, 0);
        self.emit()
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consumes the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn slot(&self, p: &[u8], i: usize) -> usize {
        let v = u32::from_le_bytes([p[i], p[i + 1], p[i + 2], p[i + 3]]);
        (v.wrapping_mul(FINGERPRINT_MUL) >> self.hash_shift) as usize
    }

    fn min_copy_len(&self) -> usize {
        if self.ver == 0 {
            4
        } else {
            6
        }
    }

    fn append_header(&mut self) {
        if self.append_magic {
            tag::put_meta(&mut self.buf, META_MAGIC, 4);
            self.buf.extend_from_slice(b"eazy");
        }

        tag::put_meta(&mut self.buf, META_VER, 1);
        self.buf.push(self.ver);

        tag::put_meta(&mut self.buf, META_RESET, 1);
        self.buf.push(self.window.size().trailing_zeros() as u8);

        debug!(
            version = self.ver,
            window_size = self.window.size(),
            "writing stream header"
        );
    }

    fn append_literal(&mut self, d: &[u8]) {
        tag::put_tag(&mut self.buf, self.ver, TAG_LITERAL, d.len());
        self.buf.extend_from_slice(d);
        self.window.write(d);
    }

    /// Appends a copy of window positions `st..end`. The offset is taken
    /// from the current write head, so any literal prefix must already be
    /// in the window.
    fn append_copy(&mut self, st: i64, end: i64) {
        let len = (end - st) as usize;
        let off = (self.window.pos() as i64 - st) as usize;
        debug_assert!(off <= self.window.size(), "copy reaches past the window");

        tag::put_tag(&mut self.buf, self.ver, TAG_COPY, len);
        tag::put_offset(&mut self.buf, self.ver, off, len);
    }

    /// One sink call for the buffered element sequence. Any failure, short
    /// writes included, restarts the stream.
    fn emit(&mut self) -> io::Result<()> {
        match self.sink.write(&self.buf) {
            Ok(n) if n == self.buf.len() => {
                self.written += n as u64;
                Ok(())
            }
            Ok(_) => {
                self.restart();
                Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "short write to compressed sink",
                ))
            }
            Err(e) => {
                self.restart();
                Err(e)
            }
        }
    }

    fn compress_chunk(&mut self, p: &[u8]) -> io::Result<usize> {
        self.buf.clear();
        if self.written == 0 {
            self.append_header();
        }

        let start = self.window.pos() as i64;
        let mut done = 0usize;
        let mut i = 0usize;

        while i + 4 <= p.len() {
            let slot = self.slot(p, i);
            let cand = i64::from(self.ht[slot]);
            self.ht[slot] = (start + i as i64) as u32;

            let pos = self.window.pos() as i64;
            let off = cand - pos;

            // Stale entry, or a truncated position from a lap of the
            // 32-bit counter: either way, too far back.
            if -off > self.window.size() as i64 {
                i += 1;
                continue;
            }

            // A candidate inside the current input means the input repeats
            // itself with a period shorter than what is already scanned.
            if off >= 0 && i > done + off as usize && self.ver != 0 {
                let (d, n) = self.emit_runlen(p, done, done + off as usize, i);
                done = d;
                i = n;
                continue;
            }

            // Extend the candidate backward over the unemitted prefix.
            let mut ist = i as i64 - 1;
            let mut st = cand - 1;
            while ist >= done as i64 && p[ist as usize] == self.window.get(st) {
                ist -= 1;
                st -= 1;
            }
            ist += 1;
            st += 1;

            // And forward, eight bytes at a time while both sides are
            // contiguous, then byte-wise.
            let mut iend = i as i64;
            let mut end = cand;
            while (iend as usize) + 8 < p.len()
                && self.window.masked(end) + 8 < self.window.size()
                && input_word(p, iend as usize) == self.window.word(end)
            {
                iend += 8;
                end += 8;
            }
            while (iend as usize) < p.len() && p[iend as usize] == self.window.get(end) {
                iend += 1;
                end += 1;
            }

            // The window is a ring: retract the match wherever the copy
            // region would intersect the bytes this emission is about to
            // overwrite, or wrap past its own start.
            let blit = pos - self.window.size() as i64;
            let bend = blit + (iend - done as i64);

            let diff = bend - st;
            if diff > 0 {
                end -= diff;
                iend -= diff;
            }

            let diff = (end - self.window.size() as i64) - blit;
            if diff > 0 {
                end -= diff;
                iend -= diff;
            }

            if end - st < self.min_copy_len() as i64 {
                i += 1;
                continue;
            }

            if done < ist as usize {
                self.append_literal(&p[done..ist as usize]);
            }

            self.append_copy(st, end);
            self.window.write(&p[ist as usize..iend as usize]);

            // Seed the slot just past the match start; the next input
            // often continues the same phrase.
            if i + 1 + 4 <= p.len() {
                let slot = self.slot(p, i + 1);
                self.ht[slot] = (start + i as i64 + 1) as u32;
            }

            i = iend as usize;
            done = iend as usize;
        }

        if done < p.len() {
            self.append_literal(&p[done..]);
            done = p.len();
        }

        self.emit()?;
        Ok(done)
    }

    /// Emits a copy whose source lies inside the current input: the
    /// run-length case. `st` is the candidate start within `p`, `i` the
    /// scan position; the gap `i - st` is the repetition period.
    fn emit_runlen(&mut self, p: &[u8], done: usize, st: usize, i: usize) -> (usize, usize) {
        let mut jf = 0usize;
        while i + jf < p.len() && p[st + jf] == p[i + jf] {
            jf += 1;
        }

        let mut jb = -1i64;
        while st as i64 + jb >= 0
            && i as i64 + jb >= done as i64
            && p[(st as i64 + jb) as usize] == p[(i as i64 + jb) as usize]
        {
            jb -= 1;
        }
        jb += 1;

        if jf as i64 - jb < self.min_copy_len() as i64 {
            return (done, i + 1);
        }

        // A run of zeros can be copied from the implicit zero byte at the
        // write head itself, no matter how far the period stretches.
        if st + 8 <= p.len() && p[st..st + 8] == [0; 8] {
            let mut zst = st;
            while zst > done && p[zst - 1] == 0 {
                zst -= 1;
            }
            let mut zend = st;
            while zend < p.len() && p[zend] == 0 {
                zend += 1;
            }

            if done < zst {
                self.append_literal(&p[done..zst]);
            }
            tag::put_tag(&mut self.buf, self.ver, TAG_COPY, zend - zst);
            tag::put_offset(&mut self.buf, self.ver, 0, zend - zst);
            self.window.write(&p[zst..zend]);

            return (zend, zend);
        }

        // The period is longer than the window: nothing to reference yet,
        // flush the input up to one period before the scan position.
        if i - st > self.window.size() {
            let diff = st - done;
            self.append_literal(&p[done..i - diff]);
            return (i - diff, i - diff);
        }

        let ist = (i as i64 + jb) as usize;
        let iend = i + jf;

        if done < ist {
            self.append_literal(&p[done..ist]);
        }
        tag::put_tag(&mut self.buf, self.ver, TAG_COPY, iend - ist);
        tag::put_offset(&mut self.buf, self.ver, i - st, iend - ist);
        self.window.write(&p[ist..iend]);

        (iend, iend)
    }
}

fn input_word(p: &[u8], i: usize) -> u64 {
    let mut w = [0u8; 8];
    w.copy_from_slice(&p[i..i + 8]);
    u64::from_le_bytes(w)
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, p: &[u8]) -> io::Result<usize> {
        self.compress_chunk(p)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
