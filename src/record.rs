//! Decodes one line of the sensor stream into a [`Sample`].
//!
//! A record is a comma separated line in the fixed order
//! `time, heartRate, spo2, temperature, headPosition, snoring`. The parser is
//! forgiving: positions that are missing are filled with
//! [`PLACEHOLDER`], extra positions are ignored, and nothing is converted to
//! a number here. Deciding what a value *means* is left to the window store.

use crate::head_position::normalize_label;

use std::{borrow::Cow, fmt, str::FromStr};

/// Stand-in for a field the device did not send.
pub const PLACEHOLDER: &str = "-";

/// Column names in wire order. Also the header row of exported tables.
pub const FIELD_NAMES: [&str; 6] = [
    "time",
    "heartRate",
    "spo2",
    "temperature",
    "headPosition",
    "snoring",
];

/// A fully parsed record. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    time: String,
    heart_rate: String,
    spo2: String,
    temperature: String,
    head_position: String,
    snoring: String,
}

/// Why a record was rejected. None of these are fatal, the record is simply
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The record had nothing in it once trimmed.
    Empty,

    /// The record was not valid UTF-8.
    NotText(std::str::Utf8Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ParseError::Empty => Cow::from("empty record"),
            ParseError::NotText(error) => Cow::from(format!("record is not text: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ParseError {}

impl Sample {
    /// Builds a sample from positional fields in wire order. Positions that
    /// are `None`, or missing entirely, become [`PLACEHOLDER`]; anything past
    /// the sixth position is ignored. The head position is normalized.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut sample = Self::from_stored(fields);
        sample.head_position = normalize_label(&sample.head_position);
        sample
    }

    /// Like [`Sample::from_fields`], but keeps every field exactly as given.
    /// For fields that were already normalized on the way in, such as rows
    /// of an exported table.
    pub(crate) fn from_stored<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut fields = fields.into_iter();
        let mut next = || {
            fields
                .next()
                .flatten()
                .map(Into::into)
                .unwrap_or_else(|| PLACEHOLDER.to_owned())
        };

        Sample {
            time: next(),
            heart_rate: next(),
            spo2: next(),
            temperature: next(),
            head_position: next(),
            snoring: next(),
        }
    }

    /// Parses a raw record as handed over by the
    /// [`LineReassembler`](crate::line_reassembler::LineReassembler).
    pub fn parse_bytes(record: &[u8]) -> Result<Self, ParseError> {
        std::str::from_utf8(record)
            .map_err(ParseError::NotText)?
            .parse()
    }

    /// The timestamp label, used as the x axis of every chart.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Heart rate, as sent.
    pub fn heart_rate(&self) -> &str {
        &self.heart_rate
    }

    /// Blood oxygen saturation, as sent.
    pub fn spo2(&self) -> &str {
        &self.spo2
    }

    /// Skin temperature, as sent.
    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    /// The normalized head position label.
    pub fn head_position(&self) -> &str {
        &self.head_position
    }

    /// Snoring indicator, as sent.
    pub fn snoring(&self) -> &str {
        &self.snoring
    }

    /// All six fields in [`FIELD_NAMES`] order.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.time,
            &self.heart_rate,
            &self.spo2,
            &self.temperature,
            &self.head_position,
            &self.snoring,
        ]
    }
}

impl FromStr for Sample {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        Ok(Sample::from_fields(s.split(',').map(|f| Some(f.trim()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_record() {
        let sample: Sample = "10:00,72,0.98,36.6,Medium Left,0".parse().unwrap();

        assert_eq!(sample.time(), "10:00");
        assert_eq!(sample.heart_rate(), "72");
        assert_eq!(sample.spo2(), "0.98");
        assert_eq!(sample.temperature(), "36.6");
        assert_eq!(sample.head_position(), "Medium Left");
        assert_eq!(sample.snoring(), "0");
    }

    #[test]
    fn test_fields_are_trimmed_and_position_normalized() {
        let sample: Sample = "  10:00 , 72 ,0.98,  36.6 ,  EXTREME right ,1 ".parse().unwrap();

        assert_eq!(
            sample.fields(),
            ["10:00", "72", "0.98", "36.6", "Extreme Right", "1"]
        );
    }

    #[test]
    fn test_missing_fields_are_filled() {
        let sample: Sample = "10:00,72".parse().unwrap();

        assert_eq!(sample.fields(), ["10:00", "72", "-", "-", "-", "-"]);
    }

    #[test]
    fn test_empty_fields_stay_empty() {
        let sample: Sample = "10:00,,0.98,,relatively up,".parse().unwrap();

        assert_eq!(
            sample.fields(),
            ["10:00", "", "0.98", "", "Relatively Up", ""]
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let sample: Sample = "10:00,72,0.98,36.6,Medium Left,0,99,junk".parse().unwrap();

        assert_eq!(sample.snoring(), "0");
    }

    #[test]
    fn test_empty_record_is_rejected() {
        assert_eq!("".parse::<Sample>(), Err(ParseError::Empty));
        assert_eq!("  \t ".parse::<Sample>(), Err(ParseError::Empty));
        assert_eq!(Sample::parse_bytes(b""), Err(ParseError::Empty));
    }

    #[test]
    fn test_non_text_is_rejected() {
        let res = Sample::parse_bytes(&[0x31, 0x30, 0xFF, 0x2C, 0x37]);
        assert!(matches!(res, Err(ParseError::NotText(_))));
    }

    #[test]
    fn test_stored_fields_are_kept_verbatim() {
        let sample: Sample = "10:00,72,0.98,36.6,ßeta,0".parse().unwrap();
        assert_eq!(sample.head_position(), "SSeta");

        let stored = Sample::from_stored(sample.fields().map(Some));
        assert_eq!(stored, sample);
        assert_eq!(Sample::from_fields(sample.fields().map(Some)).head_position(), "Sseta");
    }

    #[test]
    fn test_from_fields_defaults_none() {
        let sample = Sample::from_fields([Some("10:00"), None, Some("0.95")]);

        assert_eq!(sample.fields(), ["10:00", "-", "0.95", "-", "-", "-"]);
    }
}
