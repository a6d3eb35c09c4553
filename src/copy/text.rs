// src/copy/text.rs

//! Streaming character decoding and encoding on top of `encoding_rs`.

use std::io::{self, Read, Write};

use encoding_rs::{Decoder, DecoderResult, Encoder, EncoderResult, Encoding, UTF_8};

use crate::errors::{Result, UptodateError};

const CHUNK_SIZE: usize = 8192;

/// Encoding used when none is configured.
pub fn platform_default() -> &'static Encoding {
    UTF_8
}

/// Look up an encoding by label; `None` means the platform default.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        None => Ok(platform_default()),
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| UptodateError::Encoding(format!("unknown encoding: {label}"))),
    }
}

/// Like [`resolve_encoding`], but rejects encodings that cannot be written
/// (UTF-16 and the replacement encoding).
pub fn resolve_output_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    let encoding = resolve_encoding(label)?;
    if encoding.output_encoding() != encoding {
        return Err(UptodateError::Encoding(format!(
            "cannot encode output as {}",
            encoding.name()
        )));
    }
    Ok(encoding)
}

fn malformed(encoding: &'static Encoding) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("input is not valid {}", encoding.name()),
    )
}

/// Decodes a byte stream into text, chunk by chunk.
pub struct TextReader<R> {
    inner: R,
    decoder: Decoder,
    raw: Vec<u8>,
    pending: String,
    pos: usize,
    eof: bool,
}

impl<R: Read> TextReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_without_bom_handling(),
            raw: vec![0; CHUNK_SIZE],
            pending: String::new(),
            pos: 0,
            eof: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        if self.pos > 0 {
            self.pending.drain(..self.pos);
            self.pos = 0;
        }

        let n = loop {
            match self.inner.read(&mut self.raw) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = n == 0;
        let mut input = &self.raw[..n];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(input.len())
                .unwrap_or(input.len() * 3 + 16);
            self.pending.reserve(needed);
            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(input, &mut self.pending, last);
            input = &input[read..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => return Err(malformed(self.decoder.encoding())),
            }
        }
        self.eof = last;
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.pos < self.pending.len()
    }

    /// Append whatever text is available. Returns `false` at end of input.
    pub fn read_chunk(&mut self, out: &mut String) -> io::Result<bool> {
        while !self.has_pending() {
            if self.eof {
                return Ok(false);
            }
            self.fill()?;
        }
        out.push_str(&self.pending[self.pos..]);
        self.pos = self.pending.len();
        Ok(true)
    }

    /// Read one line including its terminator (`\n`, `\r\n` or `\r`).
    /// Returns `false` at end of input.
    pub fn read_line(&mut self, line: &mut String) -> io::Result<bool> {
        line.clear();
        loop {
            let rest = &self.pending[self.pos..];
            if let Some(i) = rest.find(['\n', '\r']) {
                let after = i + 1;
                let take = if rest.as_bytes()[i] == b'\n' {
                    Some(after)
                } else if after < rest.len() {
                    Some(if rest.as_bytes()[after] == b'\n' { after + 1 } else { after })
                } else if self.eof {
                    Some(after)
                } else {
                    // a '\r' at the end of the buffer may be followed by '\n'
                    None
                };
                if let Some(take) = take {
                    line.push_str(&rest[..take]);
                    self.pos += take;
                    return Ok(true);
                }
            } else if self.eof {
                if rest.is_empty() {
                    return Ok(false);
                }
                line.push_str(rest);
                self.pos = self.pending.len();
                return Ok(true);
            }
            self.fill()?;
        }
    }
}

/// Encodes text into a byte stream.
pub struct TextWriter<W: Write> {
    inner: W,
    encoder: Encoder,
    buf: Vec<u8>,
}

impl<W: Write> TextWriter<W> {
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoder: encoding.new_encoder(),
            buf: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.encode(text, false)
    }

    /// Flush encoder state and the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.encode("", true)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn encode(&mut self, mut text: &str, last: bool) -> io::Result<()> {
        loop {
            let needed = self
                .encoder
                .max_buffer_length_from_utf8_without_replacement(text.len())
                .unwrap_or(text.len() * 4 + 16);
            self.buf.reserve(needed);
            let (result, read) =
                self.encoder
                    .encode_from_utf8_to_vec_without_replacement(text, &mut self.buf, last);
            text = &text[read..];
            match result {
                EncoderResult::InputEmpty => break,
                EncoderResult::OutputFull => continue,
                EncoderResult::Unmappable(c) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "character {c:?} cannot be encoded as {}",
                            self.encoder.encoding().name()
                        ),
                    ));
                }
            }
        }
        self.inner.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}
