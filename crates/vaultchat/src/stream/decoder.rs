use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use super::ChunkStream;
use crate::errors::ChatResult;

/// Splits a streamed body into lines, carrying an unterminated tail between reads.
///
/// Splitting happens on raw bytes, so a multi-byte character cut by a read boundary is
/// reassembled before it is decoded. Lines that are empty or whitespace-only are dropped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    /// Leading bytes of `buffer` already known to contain no newline
    scanned: usize,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return every line it completed
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
            search_from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        lines
    }

    /// Flush the remaining fragment as a final line once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        let tail = std::mem::take(&mut self.buffer);
        decode_line(&tail)
    }

    /// Bytes received but not yet part of a complete line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(bytes);
    if line.trim().is_empty() {
        None
    } else {
        Some(line.into_owned())
    }
}

/// Decode a body stream into lines; each line is yielded as soon as its newline arrives
pub fn decode_lines<S>(body: S) -> ChunkStream<String>
where
    S: Stream<Item = ChatResult<Bytes>> + Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        let mut body = Box::pin(body);
        let mut decoder = LineDecoder::new();

        while let Some(bytes) = body.next().await {
            let bytes = bytes?;
            for line in decoder.push(&bytes) {
                yield line;
            }
        }

        if let Some(line) = decoder.finish() {
            yield line;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ChatError;
    use futures::stream;

    #[test]
    fn test_line_split_across_reads() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"0:\"Hel").is_empty());
        assert_eq!(decoder.pending(), 6);
        assert_eq!(decoder.push(b"lo\"\n0:\"wor"), vec!["0:\"Hello\""]);
        assert_eq!(decoder.push(b"ld\"\n"), vec!["0:\"world\""]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_multiple_lines_in_one_read() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"0:\"a\"\n0:\"b\"\nf:{\"messageId\":\"m1\"}\n");
        assert_eq!(lines, vec!["0:\"a\"", "0:\"b\"", "f:{\"messageId\":\"m1\"}"]);
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let line = "0:\"caf\u{e9} \u{1f680}\"\n".as_bytes();
        let split = line.len() - 4; // inside the four-byte rocket
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(decoder.push(&line[split..]), vec!["0:\"caf\u{e9} \u{1f680}\""]);
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"\n   \n0:\"x\"\n\t\n");
        assert_eq!(lines, vec!["0:\"x\""]);
    }

    #[test]
    fn test_unterminated_tail_becomes_final_line() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"0:\"a\"\ne:{}"), vec!["0:\"a\""]);
        assert_eq!(decoder.finish(), Some("e:{}".to_string()));
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_long_line_in_small_reads_is_scanned_once() {
        let payload = "x".repeat(4096);
        let line = format!("0:\"{}\"", payload);
        let mut decoder = LineDecoder::new();

        for byte in line.as_bytes() {
            assert!(decoder.push(std::slice::from_ref(byte)).is_empty());
            // everything buffered so far has been searched and holds no newline
            assert_eq!(decoder.scanned, decoder.pending());
        }
        assert_eq!(decoder.push(b"\n0:"), vec![line]);
        assert_eq!(decoder.scanned, 2);
        assert_eq!(decoder.finish(), Some("0:".to_string()));
        assert_eq!(decoder.scanned, 0);
    }

    #[test]
    fn test_lines_reconstruct_input() {
        let input = "0:\"one\"\n9:{\"toolCallId\":\"t1\"}\na:{}\n2:[1,2]";
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for piece in input.as_bytes().chunks(3) {
            lines.extend(decoder.push(piece));
        }
        lines.extend(decoder.finish());

        assert!(lines.iter().all(|line| !line.contains('\n')));
        assert_eq!(lines.join("\n"), input);
    }

    #[tokio::test]
    async fn test_decode_lines_stream() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"0:\"Hello \"\n0:")),
            Ok(Bytes::from_static(b"\"world!\"\n")),
            Ok(Bytes::from_static(b"d:{}")),
        ]);

        let lines: Vec<_> = decode_lines(body).collect().await;
        assert_eq!(
            lines,
            vec![
                Ok("0:\"Hello \"".to_string()),
                Ok("0:\"world!\"".to_string()),
                Ok("d:{}".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_decode_lines_propagates_read_error() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"0:\"a\"\n0:\"b")),
            Err(ChatError::Network("connection reset".into())),
        ]);

        let lines: Vec<_> = decode_lines(body).collect().await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Ok("0:\"a\"".to_string()));
        assert_eq!(lines[1], Err(ChatError::Network("connection reset".into())));
    }
}
