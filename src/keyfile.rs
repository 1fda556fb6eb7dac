//! Persistence of key sets.
//!
//! The text format is a whitespace separated list of decimal numbers:
//! the number of packed bits `n`, then the `n` packed bits, then the `2^n` keys.
//! A binary snapshot encoded with `bincode` is also available.

use crate::{Error, KeySet, Result};

use num_bigint::BigUint;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(bincode::Encode, bincode::Decode)]
struct Snapshot {
    bits: Vec<Vec<u32>>,
    keys: Vec<Vec<u32>>,
}

/// Pulls numbered fields out of the text format.
struct Fields<'a> {
    tokens: core::str::SplitWhitespace<'a>,
    index: usize,
}

impl<'a> Fields<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace(),
            index: 0,
        }
    }

    fn next_token(&mut self, expected: &'static str) -> Result<&'a str> {
        self.index += 1;
        self.tokens.next().ok_or(Error::Truncated {
            field: self.index,
            expected,
        })
    }

    fn next_count(&mut self) -> Result<usize> {
        let token = self.next_token("bit count")?;
        token.parse().map_err(|_| Error::Parse {
            field: self.index,
            expected: "bit count",
            found: token.to_owned(),
        })
    }

    fn next_number(&mut self, expected: &'static str) -> Result<BigUint> {
        let token = self.next_token(expected)?;
        BigUint::parse_bytes(token.as_bytes(), 10).ok_or_else(|| Error::Parse {
            field: self.index,
            expected,
            found: token.to_owned(),
        })
    }
}

impl KeySet {
    /// Writes the key set in the text format.
    ///
    /// ## Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", self.num_bits())?;
        for bit in self.bits() {
            writeln!(writer, "{bit}")?;
        }
        for key in self.keys() {
            writeln!(writer, "{key}")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a key set in the text format.
    ///
    /// Nothing is kept if any field is missing or malformed.
    ///
    /// ## Errors
    ///
    /// Returns an error if reading fails, a field cannot be parsed,
    /// the input ends early or the declared bit count is too large.
    ///
    /// ## Examples
    ///
    /// ```
    /// use supercomp::KeySet;
    ///
    /// let text = "1\n6\n3\n5\n";
    /// let key_set = KeySet::read_from(text.as_bytes()).unwrap();
    /// assert!(key_set.verify_packing());
    ///
    /// assert!(KeySet::read_from("1\n6\n3\nfive\n".as_bytes()).is_err());
    /// ```
    pub fn read_from<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let mut fields = Fields::new(&text);

        let num_bits = fields.next_count()?;
        if num_bits >= usize::BITS as usize {
            return Err(Error::TooManyBits(num_bits));
        }

        let mut bits = Vec::new();
        for _ in 0..num_bits {
            bits.push(fields.next_number("packed bit")?);
        }
        let mut keys = Vec::new();
        for _ in 0..1usize << num_bits {
            keys.push(fields.next_number("key")?);
        }

        Self::from_parts(bits, keys)
    }

    /// Writes the key set to a file in the text format.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }

    /// Reads a key set from a file in the text format.
    ///
    /// ## Errors
    ///
    /// See `KeySet::read_from`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }

    /// Encodes the packed bits and keys as a binary snapshot.
    ///
    /// ## Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            bits: self.bits().iter().map(BigUint::to_u32_digits).collect(),
            keys: self.keys().iter().map(BigUint::to_u32_digits).collect(),
        };
        Ok(bincode::encode_to_vec(
            &snapshot,
            bincode::config::standard(),
        )?)
    }

    /// Decodes a binary snapshot produced by `KeySet::to_bytes`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the bytes are not a valid snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (snapshot, _): (Snapshot, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Self::from_parts(
            snapshot.bits.into_iter().map(BigUint::new).collect(),
            snapshot.keys.into_iter().map(BigUint::new).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeySet {
        KeySet::calculate(2, &BigUint::from(11u32), |_| {})
    }

    #[test]
    fn test_text_layout() {
        let key_set = sample();
        let mut out = Vec::new();
        key_set.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 1 + 2 + 4);
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], key_set.bits()[0].to_string());
        assert_eq!(&lines[3..], ["11", "13", "15", "17"]);
    }

    #[test]
    fn test_text_roundtrip() {
        let key_set = sample();
        let mut out = Vec::new();
        key_set.write_to(&mut out).unwrap();
        let read = KeySet::read_from(out.as_slice()).unwrap();
        assert_eq!(read, key_set);
    }

    #[test]
    fn test_reader_accepts_any_whitespace() {
        let read = KeySet::read_from("1 6\t3\r\n5".as_bytes()).unwrap();
        assert_eq!(read.keys(), [BigUint::from(3u32), BigUint::from(5u32)]);
    }

    #[test]
    fn test_malformed_bit_count() {
        let err = KeySet::read_from("two\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { field: 1, .. }));

        let err = KeySet::read_from("-1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { field: 1, .. }));

        let err = KeySet::read_from("".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Truncated { field: 1, .. }));

        let err = KeySet::read_from("64\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::TooManyBits(64)));
    }

    #[test]
    fn test_malformed_fields() {
        let err = KeySet::read_from("1\n6\n3\n5x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { field: 4, expected: "key", .. }));

        let err = KeySet::read_from("1\n-6\n3\n5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { field: 2, expected: "packed bit", .. }));

        let err = KeySet::read_from("2\n6\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Truncated { field: 3, .. }));
    }

    #[test]
    fn test_invalid_keys() {
        let err = KeySet::read_from("1\n6\n0\n5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Inconsistent(_)));

        let err = KeySet::read_from("1\n6\n4\n6\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Inconsistent(_)));
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("supercomp_keyfile_{}.txt", std::process::id()));
        let key_set = sample();
        key_set.write(&path).unwrap();
        let read = KeySet::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read, key_set);

        assert!(matches!(KeySet::read(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let key_set = KeySet::calculate(3, &BigUint::from(10u32).pow(30), |_| {});
        let bytes = key_set.to_bytes().unwrap();
        assert_eq!(KeySet::from_bytes(&bytes).unwrap(), key_set);

        assert!(matches!(
            KeySet::from_bytes(&bytes[..bytes.len() / 2]),
            Err(Error::Decode(_))
        ));
    }
}
