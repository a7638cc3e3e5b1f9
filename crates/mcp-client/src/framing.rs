//! Newline-delimited JSON framing for the stdio transport.
//!
//! Every envelope travels as exactly one line of UTF-8 text terminated by
//! `\n`. [`LineReader`] pulls lines off the child's stdout one at a time and
//! [`write_newline_delimited`] pushes envelopes onto its stdin.

use std::io::{self, BufRead, BufReader, Read, Write};

/// Reads `\n`-terminated lines from a blocking reader.
///
/// Blank lines are skipped. A trailing `\r` is stripped along with the
/// newline so servers that emit CRLF are tolerated.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    /// Create a new line reader wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Block until the next non-empty line is available, returning `None` on EOF.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; such a line will fail
    /// envelope parsing later and be skipped like any other garbage.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the underlying read fails.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line.to_string()));
        }
    }
}

/// Write a JSON message in newline-delimited format to the given writer.
///
/// Appends `\n` and flushes. The `json` string must not contain embedded newlines.
///
/// # Errors
///
/// Returns an I/O error if writing or flushing fails.
pub fn write_newline_delimited<W: Write + ?Sized>(writer: &mut W, json: &str) -> io::Result<()> {
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
