/// Prefix every meaningful stream line starts with.
pub const DATA_PREFIX: &str = "data: ";

/// One `data: <payload>` line with the prefix removed and the payload trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub payload: String,
}

impl EventRecord {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Incremental decoder turning raw body bytes into line records.
///
/// Bytes of a UTF-8 sequence split across reads are held back until the rest
/// arrives; a trailing partial line is held back until its newline arrives.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending_bytes: Vec<u8>,
    line_buffer: String,
}

impl StreamDecoder {
    /// Feed arbitrary bytes into the decoder and drain complete records.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<EventRecord> {
        self.decode_into_buffer(bytes);

        let mut records = Vec::new();
        while let Some(newline) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=newline).collect();
            if let Some(record) = classify_line(&line) {
                records.push(record);
            }
        }

        records
    }

    /// Flush decoder state at end of stream.
    ///
    /// A leftover partial line is never turned into a record; it is logged and
    /// returned so callers can inspect what was dropped.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_bytes.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.pending_bytes.clear();
            self.line_buffer.push_str(&tail);
        }

        let leftover = std::mem::take(&mut self.line_buffer);
        if leftover.trim().is_empty() {
            return None;
        }

        tracing::warn!(
            bytes = leftover.len(),
            "stream ended with an incomplete record; dropping it"
        );
        Some(leftover)
    }

    /// Decode a complete body in one shot.
    pub fn parse_records(input: &[u8]) -> Vec<EventRecord> {
        let mut decoder = Self::default();
        let records = decoder.feed(input);
        decoder.finish();
        records
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.pending_bytes.is_empty() && self.line_buffer.trim().is_empty()
    }

    fn decode_into_buffer(&mut self, bytes: &[u8]) {
        self.pending_bytes.extend_from_slice(bytes);

        let mut consumed = 0;
        while consumed < self.pending_bytes.len() {
            match std::str::from_utf8(&self.pending_bytes[consumed..]) {
                Ok(valid) => {
                    self.line_buffer.push_str(valid);
                    consumed = self.pending_bytes.len();
                }
                Err(error) => {
                    let valid_end = consumed + error.valid_up_to();
                    // `valid_up_to` guarantees this prefix decodes.
                    if let Ok(valid) = std::str::from_utf8(&self.pending_bytes[consumed..valid_end]) {
                        self.line_buffer.push_str(valid);
                    }

                    match error.error_len() {
                        Some(invalid_len) => {
                            self.line_buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_end + invalid_len;
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            consumed = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending_bytes.drain(..consumed);
    }
}

fn classify_line(line: &str) -> Option<EventRecord> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return None;
    }

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        tracing::warn!(line, "ignoring unexpected stream line");
        return None;
    };

    Some(EventRecord::new(payload.trim()))
}
