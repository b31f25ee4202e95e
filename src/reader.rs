use crate::ImportResult;
use csv_async::{AsyncReader, AsyncReaderBuilder, ByteRecord};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::io::InspectReader;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// One data record as it came off the file, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line the record starts on; the header is line 1.
    pub line: u64,
    pub values: Vec<String>,
}

/// Newline bookkeeping over the bytes handed to the CSV parser.
///
/// The parser reports where the previous record ended, which sits before any
/// `\n` of a CRLF pair and before skipped blank lines. The start line is
/// recovered by counting every `\n` up to that offset plus the terminators
/// that follow it.
#[derive(Debug, Default)]
struct LineIndex {
    /// Absolute offset of `pending[0]`.
    base: u64,
    newlines_before_base: u64,
    pending: VecDeque<u8>,
}

impl LineIndex {
    fn push(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    /// Line of the first non-terminator byte at or after `offset`. Offsets
    /// must not go backwards between calls.
    fn line_at(&mut self, offset: u64) -> u64 {
        while self.base < offset {
            let Some(b) = self.pending.pop_front() else {
                break;
            };
            if b == b'\n' {
                self.newlines_before_base += 1;
            }
            self.base += 1;
        }

        let skipped = self
            .pending
            .iter()
            .take_while(|b| matches!(b, b'\r' | b'\n'))
            .filter(|b| **b == b'\n')
            .count() as u64;
        self.newlines_before_base + skipped + 1
    }
}

/// Forward-only reader over a review upload: header first, then one
/// [`SourceRow`] per record until the stream ends.
pub struct ReviewCsvReader {
    rdr: AsyncReader<Box<dyn AsyncRead + Unpin + Send>>,
    header: Vec<String>,
    record: ByteRecord,
    lines: Arc<Mutex<LineIndex>>,
    rows_read: u64,
}

impl ReviewCsvReader {
    /// Reads the header line. An empty stream yields an empty header and no rows.
    pub async fn open<R>(reader: R, delimiter: u8) -> ImportResult<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        // Drop the BOM before the parser sees it so its byte offsets and ours agree.
        let mut buffered = BufReader::new(reader);
        if buffered.fill_buf().await?.starts_with(UTF8_BOM) {
            buffered.consume(UTF8_BOM.len());
        }

        let lines = Arc::new(Mutex::new(LineIndex::default()));
        let tee = Arc::clone(&lines);
        let inspected = InspectReader::new(buffered, move |bytes: &[u8]| {
            tee.lock().unwrap_or_else(|e| e.into_inner()).push(bytes);
        });
        let source: Box<dyn AsyncRead + Unpin + Send> = Box::new(inspected);

        let mut rdr = AsyncReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            // Width mismatches are judged by the row validator, not the parser.
            .flexible(true)
            .buffer_capacity(64 * 1024)
            .create_reader(source);

        let header = rdr
            .byte_headers()
            .await?
            .iter()
            .enumerate()
            .map(|(i, name)| clean_header(i, name))
            .collect();

        Ok(Self {
            rdr,
            header,
            record: ByteRecord::new(),
            lines,
            rows_read: 0,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Next record, or `None` at end of stream.
    pub async fn next_row(&mut self) -> ImportResult<Option<SourceRow>> {
        if !self.rdr.read_byte_record(&mut self.record).await? {
            return Ok(None);
        }
        self.rows_read += 1;

        let line = match self.record.position() {
            Some(pos) => self
                .lines
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .line_at(pos.byte()),
            None => self.rows_read + 1,
        };
        // Decode only now; invalid UTF-8 degrades to U+FFFD instead of failing the batch.
        let values = self
            .record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();

        Ok(Some(SourceRow { line, values }))
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}

fn clean_header(index: usize, raw: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(raw);
    let name: &str = if index == 0 {
        decoded.trim_start_matches('\u{feff}')
    } else {
        &decoded
    };
    name.trim().to_string()
}
