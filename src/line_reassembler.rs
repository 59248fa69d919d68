//! Turns an arbitrarily chunked byte stream into newline-delimited records.
//!
//! The link hands us whatever the radio happened to deliver, so a record may
//! be split anywhere: mid-field, between the `\r` and `\n` of a line ending,
//! or even inside a multi-byte UTF-8 character. The [`LineReassembler`] holds
//! on to the unterminated tail of the stream until the rest of it shows up.
//!
//! There is no upper bound on how much unterminated data is buffered. A
//! sender that never emits a newline will grow the buffer forever; keeping
//! the stream framed is the transport's job.

const DELIMITER: u8 = b'\n';

/// Accumulates raw chunks and splits them into complete, trimmed records.
#[derive(Debug, Default, Clone)]
pub struct LineReassembler {
    pending: Vec<u8>,
}

impl LineReassembler {
    /// Instantiates a [`LineReassembler`] with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` to the pending buffer and returns every record that is
    /// now complete, in stream order. Records are trimmed of surrounding
    /// whitespace and blank records are dropped.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk.as_ref());

        let mut records = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == DELIMITER) {
            let end = start + offset;
            let line = self.pending[start..end].trim_ascii();
            if !line.is_empty() {
                records.push(line.to_vec());
            }
            start = end + 1;
        }

        // Everything after the last delimiter is carried over to the next call
        self.pending.drain(..start);
        records
    }

    /// The bytes received since the last delimiter.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Throws away any partially received record.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    const STREAM: &str = "10:00,72,0.98,36.6,Medium Left,0\r\n\
                          10:01,73,0.97,36.7,Extreme Left,1\r\n\
                          \r\n\
                          10:02,,0.99,36.5,relatively up,0\r\n\
                          10:03,75";

    fn to_strings(records: Vec<Vec<u8>>) -> Vec<String> {
        records
            .into_iter()
            .map(|r| String::from_utf8(r).unwrap())
            .collect()
    }

    #[test]
    fn splits_complete_lines_and_keeps_the_tail() {
        let mut reassembler = LineReassembler::new();
        let records = to_strings(reassembler.feed(STREAM));

        assert_eq!(
            records,
            vec![
                "10:00,72,0.98,36.6,Medium Left,0",
                "10:01,73,0.97,36.7,Extreme Left,1",
                "10:02,,0.99,36.5,relatively up,0",
            ]
        );
        assert_eq!(reassembler.pending(), b"10:03,75");
    }

    #[test]
    fn tail_is_completed_by_the_next_chunk() {
        let mut reassembler = LineReassembler::new();
        assert!(reassembler.feed("10:00,7").is_empty());
        assert!(reassembler.feed("2,0.98").is_empty());
        let records = to_strings(reassembler.feed(",36.6,Medium Left,0\n10:01"));

        assert_eq!(records, vec!["10:00,72,0.98,36.6,Medium Left,0"]);
        assert_eq!(reassembler.pending(), b"10:01");
    }

    #[test]
    fn blank_lines_are_dropped() {
        let mut reassembler = LineReassembler::new();
        let records = reassembler.feed("\n\r\n   \n\t\r\n");
        assert!(records.is_empty());
        assert!(reassembler.pending().is_empty());
    }

    #[test]
    fn crlf_split_between_chunks() {
        let mut reassembler = LineReassembler::new();
        assert!(reassembler.feed("a,b\r").is_empty());
        assert_eq!(to_strings(reassembler.feed("\n")), vec!["a,b"]);
    }

    #[test]
    fn multibyte_character_split_between_chunks() {
        let bytes = "36.6°C,x\n".as_bytes();
        let split = bytes.iter().position(|&b| b == 0xC2).unwrap() + 1;

        let mut reassembler = LineReassembler::new();
        assert!(reassembler.feed(&bytes[..split]).is_empty());
        assert_eq!(to_strings(reassembler.feed(&bytes[split..])), vec!["36.6°C,x"]);
    }

    #[test]
    fn every_split_point_gives_the_same_records() {
        let mut whole = LineReassembler::new();
        let expected = whole.feed(STREAM);

        let bytes = STREAM.as_bytes();
        for split in 0..=bytes.len() {
            let mut reassembler = LineReassembler::new();
            let mut records = reassembler.feed(&bytes[..split]);
            records.extend(reassembler.feed(&bytes[split..]));

            assert_eq!(records, expected, "split at byte {split}");
            assert_eq!(reassembler.pending(), whole.pending());
        }
    }

    #[test]
    fn random_chunking_matches_a_single_feed() {
        let mut rng = thread_rng();
        let stream = STREAM.repeat(20);
        let mut whole = LineReassembler::new();
        let expected = whole.feed(&stream);

        for _ in 0..100 {
            let mut reassembler = LineReassembler::new();
            let mut records = Vec::new();
            let mut rest = stream.as_bytes();
            while !rest.is_empty() {
                let n = rng.gen_range(1..=rest.len().min(20));
                let (chunk, tail) = rest.split_at(n);
                records.extend(reassembler.feed(chunk));
                rest = tail;
            }
            assert_eq!(records, expected);
        }
    }

    #[test]
    fn clear_forgets_the_partial_record() {
        let mut reassembler = LineReassembler::new();
        reassembler.feed("10:00,72");
        reassembler.clear();
        assert_eq!(to_strings(reassembler.feed(",x\n")), vec![",x"]);
    }
}
