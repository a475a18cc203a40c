use super::Chunks;

#[derive(Debug)]
pub enum Error {
    Chunks(reqwest::Error),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
    // The last byte pulled was a CR, so a leading LF in the next chunk
    // finishes the same line ending.
    after_cr: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            after_cr: false,
        }
    }

    /// Returns the data of the next event, or `None` when the stream ends.
    ///
    /// Bytes left in the buffer without a terminating blank line are
    /// discarded at the end of the stream.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain the buffered events before pulling more data, a chunk
            // may carry several of them.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::Chunks)?
            else {
                return Ok(None);
            };
            self.push_bytes(&bytes);
        }
    }

    /// Appends bytes to the buffer with CRLF and lone CR line endings
    /// turned into LF. CR only shows up in line endings, JSON payloads
    /// escape it.
    fn push_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let after_cr = std::mem::replace(&mut self.after_cr, b == b'\r');
            match b {
                b'\r' => self.buf.push(b'\n'),
                b'\n' if after_cr => {}
                _ => self.buf.push(b),
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // For `end-of-line`, we only handle line feed after normalizing CRs.
        //
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        loop {
            let Some(eol_idx) = self.buf.windows(2).position(|w| w == b"\n\n")
            else {
                return Ok(None);
            };

            let block: Vec<u8> = self.buf.drain(0..eol_idx + 2).collect();
            let Ok(block) = str::from_utf8(&block) else {
                return Err(Error::InvalidPayload);
            };

            let mut data_lines = Vec::new();
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                // Only the payloads matter to chat completions, other
                // fields (`event`, `id`, `retry` or unknown ones) are
                // ignored.
                if name == "data" {
                    data_lines.push(value);
                }
            }

            // Blocks with only comments (keep-alives) carry no event.
            if !data_lines.is_empty() {
                return Ok(Some(data_lines.join("\n")));
            }
        }
    }
}
