//! Chunk sources for the streaming parser

use std::io::{ErrorKind, Read};

/// Adapts a reader into fixed-size byte chunks.
///
/// Yields `Err` once on a read failure and then ends.
#[derive(Debug)]
pub struct ReaderChunks<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ReaderChunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl<R: Read> Iterator for ReaderChunks<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Some(Ok(chunk));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Split complete `\n`-terminated lines off the front of `buffer`.
///
/// The trailing partial line stays in the buffer; a `\r` before the newline
/// is removed.
pub fn drain_complete_lines(buffer: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut start = 0usize;

    for (idx, byte) in buffer.iter().enumerate() {
        if *byte == b'\n' {
            lines.push(trim_line_end(&buffer[start..idx]).to_vec());
            start = idx + 1;
        }
    }

    if start > 0 {
        buffer.drain(0..start);
    }

    lines
}

pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
