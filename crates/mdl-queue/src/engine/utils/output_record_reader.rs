//! Line reader for converter stderr.
//!
//! FFmpeg rewrites its status line in place with `\r`, so a plain
//! `lines()` reader only sees progress once the process prints a newline.
//! [`StderrRecords`] treats both `\r` and `\n` as terminators.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Records longer than this are cut; the rest of the record is dropped.
const MAX_RECORD_LEN: usize = 16 * 1024;

/// Yields trimmed, non-empty text records from an async byte stream.
pub struct StderrRecords<R> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
    chunk: Box<[u8]>,
    /// Skipping the tail of a record that was cut at `MAX_RECORD_LEN`.
    discarding: bool,
    eof: bool,
}

impl<R> StderrRecords<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buffer: Vec::new(),
            chunk: vec![0u8; 4096].into_boxed_slice(),
            discarding: false,
            eof: false,
        }
    }

    /// Next record, or `None` once the stream is exhausted.
    pub async fn next_record(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(record) = self.take_buffered() {
                return Ok(Some(record));
            }

            if self.eof {
                return Ok(self.take_remainder());
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                self.eof = true;
                continue;
            }
            self.buffer.extend_from_slice(&self.chunk[..n]);
        }
    }

    fn take_buffered(&mut self) -> Option<String> {
        while let Some(end) = self.buffer.iter().position(is_terminator) {
            let record = if self.discarding {
                self.discarding = false;
                String::new()
            } else {
                decode(&self.buffer[..end.min(MAX_RECORD_LEN)])
            };
            let skip = self.buffer[end..]
                .iter()
                .take_while(|b| is_terminator(b))
                .count();
            self.buffer.drain(..end + skip);
            if !record.is_empty() {
                return Some(record);
            }
        }

        // no terminator buffered from here on
        if self.discarding {
            self.buffer.clear();
        } else if self.buffer.len() > MAX_RECORD_LEN {
            let record = decode(&self.buffer[..MAX_RECORD_LEN]);
            self.buffer.clear();
            self.discarding = true;
            if !record.is_empty() {
                return Some(record);
            }
        }
        None
    }

    fn take_remainder(&mut self) -> Option<String> {
        if self.discarding {
            self.buffer.clear();
            return None;
        }
        let record = decode(&self.buffer[..self.buffer.len().min(MAX_RECORD_LEN)]);
        self.buffer.clear();
        (!record.is_empty()).then_some(record)
    }
}

fn is_terminator(b: &u8) -> bool {
    matches!(b, b'\n' | b'\r')
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn collect(input: impl AsRef<[u8]>) -> Vec<String> {
        let input = input.as_ref().to_vec();
        let (mut tx, rx) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let _ = tx.write_all(&input).await;
        });

        let mut records = StderrRecords::new(rx);
        let mut out = Vec::new();
        while let Some(record) = records.next_record().await.unwrap() {
            out.push(record);
        }
        out
    }

    #[tokio::test]
    async fn test_splits_on_carriage_return_and_newline() {
        let records = collect(b"Duration: 00:00:10.00\nframe=1 time=00:00:01.00\rframe=2 time=00:00:02.00\r\ndone").await;
        assert_eq!(
            records,
            vec![
                "Duration: 00:00:10.00",
                "frame=1 time=00:00:01.00",
                "frame=2 time=00:00:02.00",
                "done"
            ]
        );
    }

    #[tokio::test]
    async fn test_skips_blank_records() {
        let records = collect(b"\r\n  \n\nonly\n\r").await;
        assert_eq!(records, vec!["only"]);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        assert!(collect(b"").await.is_empty());
    }

    #[tokio::test]
    async fn test_overlong_record_is_cut_and_tail_dropped() {
        let mut input = vec![b'a'; 40_000];
        input.extend_from_slice(b"\nok\n");

        let records = collect(input).await;
        let lengths: Vec<_> = records.iter().map(String::len).collect();
        assert_eq!(lengths, vec![MAX_RECORD_LEN, 2]);
        assert_eq!(records[1], "ok");
    }

    #[tokio::test]
    async fn test_overlong_record_at_end_of_stream() {
        let mut input = b"first\r".to_vec();
        input.extend(std::iter::repeat_n(b'b', MAX_RECORD_LEN * 3));

        let records = collect(input).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], "first");
        assert_eq!(records[1].len(), MAX_RECORD_LEN);
    }
}
