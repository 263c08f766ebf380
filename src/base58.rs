// Rust Compact Address Library
// Written by
//   The Elements developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! # Base58 and Base58Check
//!
//! Slice writers over the `bitcoin` crate's base58 codec. Every leading zero
//! byte is written as one leading `1` and read back the same way.
//!
//! The `_into` functions write into caller-owned buffers and are paired with
//! [`max_encoded_len`] and [`max_decoded_len`], which bound the output size
//! from above. On error the buffer is left untouched.
//!

use std::fmt::{self, Write};

use bitcoin::base58;

use crate::error::impl_std_error;

const CHECKSUM_LEN: usize = 4;

/// Base58 and Base58Check errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A byte of the input is not in the Base58 alphabet.
    BadByte(u8),
    /// The checksum embedded in the data does not match the computed one.
    BadChecksum {
        /// Checksum computed over the payload.
        expected: [u8; 4],
        /// Checksum found in the data.
        actual: [u8; 4],
    },
    /// The decoded data is too short to carry a checksum.
    TooShort(usize),
    /// An output buffer was smaller than its size prediction said it had to be.
    BufferInadequate {
        /// Bytes the operation needed.
        needed: usize,
        /// Bytes the buffer had.
        available: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::BadByte(b) => write!(f, "invalid base58 character {:#x}", b),
            Error::BadChecksum { expected, actual } => write!(
                f,
                "base58ck checksum {:08x} does not match computed {:08x}",
                u32::from_be_bytes(actual),
                u32::from_be_bytes(expected),
            ),
            Error::TooShort(len) => {
                write!(f, "base58ck data not even long enough for a checksum ({} bytes)", len)
            }
            Error::BufferInadequate { needed, available } => {
                write!(f, "output buffer too small: needed {}, have {}", needed, available)
            }
        }
    }
}

impl_std_error!(Error);

/// Upper bound on the length of the Base58 text of `n` bytes.
///
/// log(256) / log(58) is below 1.38.
pub fn max_encoded_len(n: usize) -> usize {
    n * 138 / 100 + 1
}

/// Upper bound on the number of bytes decoded from `n` characters.
///
/// A leading `1` decodes to exactly one byte and any other character to less
/// than one.
pub fn max_decoded_len(n: usize) -> usize {
    n
}

/// Upper bound on the length of the Base58Check text of an `n`-byte payload.
pub fn max_encoded_check_len(n: usize) -> usize {
    max_encoded_len(n + CHECKSUM_LEN)
}

/// Upper bound on the payload decoded from `n` characters of Base58Check.
pub fn max_decoded_check_len(n: usize) -> usize {
    max_decoded_len(n).saturating_sub(CHECKSUM_LEN)
}

impl From<base58::InvalidCharacterError> for Error {
    fn from(e: base58::InvalidCharacterError) -> Error {
        Error::BadByte(e.invalid_base58_character())
    }
}

impl From<base58::Error> for Error {
    fn from(e: base58::Error) -> Error {
        match e {
            base58::Error::Decode(e) => e.into(),
            base58::Error::IncorrectChecksum(e) => {
                let (actual, expected) = e.incorrect_checksum();
                Error::BadChecksum { expected: expected.to_le_bytes(), actual: actual.to_le_bytes() }
            }
            base58::Error::TooShort(e) => Error::TooShort(e.invalid_base58_length()),
            // decode_check yields no other variant
            _ => Error::TooShort(0),
        }
    }
}

/// Base58Check text of a payload, rendered by the `bitcoin` crate.
struct Check<'a>(&'a [u8]);

impl fmt::Display for Check<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        base58::encode_check_to_fmt(f, self.0)
    }
}

/// `fmt::Write` sink over a byte slice. Text that does not fit is counted,
/// not written.
struct SliceWriter<'o> {
    out: &'o mut [u8],
    len: usize,
}

impl Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if let Some(dst) = self.out.get_mut(self.len..end) {
            dst.copy_from_slice(s.as_bytes());
        }
        self.len = end;
        Ok(())
    }
}

fn copy_into(out: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    if out.len() < src.len() {
        return Err(Error::BufferInadequate { needed: src.len(), available: out.len() });
    }
    out[..src.len()].copy_from_slice(src);
    Ok(src.len())
}

/// Writes the Base58 text of `data` into `out`, returning its length.
pub fn encode_into(out: &mut [u8], data: &[u8]) -> Result<usize, Error> {
    copy_into(out, base58::encode(data).as_bytes())
}

/// Writes the bytes encoded by the Base58 text `s` into `out`, returning
/// their number.
pub fn decode_into(out: &mut [u8], s: &str) -> Result<usize, Error> {
    copy_into(out, &base58::decode(s)?)
}

/// Writes the Base58Check text of `data` into `out`, returning its length.
///
/// The text is measured before any of it is written.
pub fn encode_check_into(out: &mut [u8], data: &[u8]) -> Result<usize, Error> {
    let mut counter = SliceWriter { out: &mut [], len: 0 };
    write!(counter, "{}", Check(data)).expect("SliceWriter never fails");
    let needed = counter.len;
    if out.len() < needed {
        return Err(Error::BufferInadequate { needed, available: out.len() });
    }

    let mut writer = SliceWriter { out, len: 0 };
    write!(writer, "{}", Check(data)).expect("SliceWriter never fails");
    debug_assert_eq!(writer.len, needed);
    Ok(needed)
}

/// Verifies the Base58Check text `s` and writes its payload into `out`,
/// returning the payload length.
pub fn decode_check_into(out: &mut [u8], s: &str) -> Result<usize, Error> {
    copy_into(out, &base58::decode_check(s)?)
}

fn into_string(mut out: Vec<u8>, len: usize) -> String {
    out.truncate(len);
    String::from_utf8(out).expect("base58 output is ASCII")
}

/// Encodes `data` as Base58.
pub fn encode(data: &[u8]) -> String {
    let mut out = vec![0; max_encoded_len(data.len())];
    let len = encode_into(&mut out, data).expect("buffer sized by max_encoded_len");
    into_string(out, len)
}

/// Decodes Base58 text.
pub fn decode(s: &str) -> Result<Vec<u8>, Error> {
    let mut out = vec![0; max_decoded_len(s.len())];
    let len = decode_into(&mut out, s)?;
    out.truncate(len);
    Ok(out)
}

/// Encodes `data` as Base58Check.
pub fn encode_check(data: &[u8]) -> String {
    let mut out = vec![0; max_encoded_check_len(data.len())];
    let len = encode_check_into(&mut out, data).expect("buffer sized by max_encoded_check_len");
    into_string(out, len)
}

/// Decodes and verifies Base58Check text, returning the payload.
pub fn decode_check(s: &str) -> Result<Vec<u8>, Error> {
    let mut out = vec![0; max_decoded_check_len(s.len())];
    let len = decode_check_into(&mut out, s)?;
    out.truncate(len);
    Ok(out)
}
