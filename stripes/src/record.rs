//! Field-delimited records and the line codec.
//!
//! There is no escaping: a field that contains the delimiter cannot be told
//! apart from two fields once encoded.

use std::ops::Deref;

use itertools::Itertools;

use crate::error::{Error, Result};

/// The first `num_partition_keys` fields of a record.
pub type Key = Vec<String>;

/// Build a [`Record`] from any `Display` values, in order.
///
/// ```
/// use stripes::record;
/// let r = record!["th", 1];
/// assert_eq!(r.fields(), ["th", "1"]);
/// ```
#[macro_export]
macro_rules! record {
    ($($field:expr),* $(,)?) => {
        $crate::Record::from(vec![$($field.to_string()),*])
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Split a raw line on `delimiter` after dropping trailing line terminators.
    pub fn decode(line: &str, delimiter: char) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        Self {
            fields: line.split(delimiter).map(str::to_owned).collect(),
        }
    }

    /// Like [`Record::decode`] but for raw bytes off the wire.
    pub fn decode_bytes(line: &[u8], delimiter: char) -> Result<Self> {
        let line = std::str::from_utf8(line)
            .map_err(|e| Error::Decode(format!("line is not valid UTF-8: {e}")))?;
        Ok(Self::decode(line, delimiter))
    }

    pub fn encode(&self, delimiter: char) -> String {
        self.fields.iter().join(&delimiter.to_string())
    }

    /// Field at `index`, or [`Error::MissingField`].
    pub fn field(&self, index: usize) -> Result<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or(Error::MissingField {
                index,
                len: self.fields.len(),
            })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Split into the key prefix and the value fragment.
    ///
    /// The value may be empty; the key must be complete.
    pub fn split_key(mut self, num_keys: usize) -> Result<(Key, Vec<String>)> {
        if self.fields.len() < num_keys {
            return Err(Error::Decode(format!(
                "expected at least {num_keys} key fields, found {}",
                self.fields.len()
            )));
        }
        let value = self.fields.split_off(num_keys);
        Ok((self.fields, value))
    }
}

impl From<Vec<String>> for Record {
    fn from(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl From<Vec<&str>> for Record {
    fn from(fields: Vec<&str>) -> Self {
        Self {
            fields: fields.into_iter().map(str::to_owned).collect(),
        }
    }
}

impl Deref for Record {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_strips_terminators() {
        let r = Record::decode("a\x01b\x01c\r\n", '\x01');
        assert_eq!(r.fields(), ["a", "b", "c"]);
    }

    #[test]
    fn test_decode_keeps_empty_fields() {
        let r = Record::decode("a\t\tb\t", '\t');
        assert_eq!(r.fields(), ["a", "", "b", ""]);
    }

    #[test]
    fn test_delimiter_in_field_is_ambiguous() {
        let r = record!["a,b", "c"];
        let back = Record::decode(&r.encode(','), ',');
        assert_eq!(back.fields(), ["a", "b", "c"]);
    }

    #[test]
    fn test_split_key() {
        let (key, value) = Record::from(vec!["a", "b", "1"]).split_key(2).unwrap();
        assert_eq!(key, ["a", "b"]);
        assert_eq!(value, ["1"]);

        let (key, value) = Record::from(vec!["a"]).split_key(1).unwrap();
        assert_eq!(key, ["a"]);
        assert!(value.is_empty());

        assert!(matches!(
            Record::from(vec!["a"]).split_key(2),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_a_decode_error() {
        assert!(matches!(
            Record::decode_bytes(b"a\x01\xff", '\x01'),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_record_macro_stringifies() {
        let r = record!["en", 2, 1.5];
        assert_eq!(r.fields(), ["en", "2", "1.5"]);
        assert_eq!(r.encode('\x01'), "en\x012\x011.5");
        assert!(matches!(r.field(3), Err(Error::MissingField { index: 3, len: 3 })));
    }

    proptest! {
        #[test]
        fn test_encode_decode_round_trip(
            fields in prop::collection::vec("[a-z0-9 ,.-]{0,8}", 1..8),
            delimiter in prop::sample::select(vec!['\x01', '\t', '|', ';']),
        ) {
            let record = Record::new(fields);
            let back = Record::decode(&record.encode(delimiter), delimiter);
            prop_assert_eq!(back, record);
        }
    }
}
