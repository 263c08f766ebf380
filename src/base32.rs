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

//! # Bech32-family codec
//!
//! Bit-level encoding and decoding of bech32, bech32m, blech32 and blech32m
//! strings. The four variants share the charset and the algorithm; they
//! differ only in the parameters held by [`Family`] and in the checksum
//! constant of [`Variant`].
//!
//! Both directions are streaming state machines that work on caller-owned
//! buffers. [`encoded_size`] and [`Decoder::bits_remaining`] tell the caller
//! exactly how much room to make before the data is fed, so a host that needs
//! to prepend its own header simply passes `&mut buf[header..]`.
//!

use std::convert::TryFrom;
use std::fmt;

use bech32::primitives::checksum::Engine;
use bech32::Fe32;

use crate::error::impl_std_error;
use crate::variant::{Blech32, Blech32m, Family, FamilyParams, Variant};

/// Human-readable part and data part separator.
pub const SEP: char = '1';

/// Encoding character set. Maps data value -> char
const CHARSET: [u8; 32] = *b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Bech32-family encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The string is shorter than the family allows.
    TooShort(usize),
    /// The string (or the string an encoding would produce) is longer than
    /// the family allows.
    TooLong(usize),
    /// The string contains no `1` separator.
    NoSeparator,
    /// The string mixes upper and lower case letters.
    MixedCase,
    /// The data part contains a character outside the charset.
    IllegalChar(char),
    /// The bits left over after the last full byte are too many or non-zero.
    PaddingError,
    /// The checksum does not verify.
    ChecksumFailure,
    /// The human-readable part is empty.
    HrpTooShort,
    /// The human-readable part is too long.
    HrpTooLong(usize),
    /// The human-readable part contains a byte outside US-ASCII 33..=126.
    HrpIllegalChar(u8),
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
            Error::TooShort(len) => write!(f, "encoding is too short ({} characters)", len),
            Error::TooLong(len) => write!(f, "encoding is too long ({} characters)", len),
            Error::NoSeparator => write!(f, "encoding contains no separator, \"{}\"", SEP),
            Error::MixedCase => f.write_str("encoding uses mixed case"),
            Error::IllegalChar(c) => write!(f, "encoding contains an illegal character {:?}", c),
            Error::PaddingError => f.write_str("encoding has a padding error"),
            Error::ChecksumFailure => f.write_str("checksum verification failed"),
            Error::HrpTooShort => f.write_str("human-readable part is empty"),
            Error::HrpTooLong(len) => {
                write!(f, "human-readable part is too long ({} characters)", len)
            }
            Error::HrpIllegalChar(b) => {
                write!(f, "human-readable part contains an illegal character (code={})", b)
            }
            Error::BufferInadequate { needed, available } => {
                write!(f, "output buffer too small: needed {}, have {}", needed, available)
            }
        }
    }
}

impl_std_error!(Error);

/// The exact length of the string produced by encoding `data_bits` bits under
/// an HRP of `hrp_len` characters.
pub fn encoded_size(family: Family, hrp_len: usize, data_bits: usize) -> usize {
    hrp_len + 1 + (data_bits + 4) / 5 + family.params().checksum_len
}

/// The checksum engine of one variant.
///
/// Members of a family share a generator, so a decoder may run the engine of
/// either and compare the residue against the constant it settles on later.
#[derive(Clone)]
enum Polymod {
    Bech32(Engine<bech32::Bech32>),
    Bech32m(Engine<bech32::Bech32m>),
    Blech32(Engine<Blech32>),
    Blech32m(Engine<Blech32m>),
}

impl Polymod {
    fn new(variant: Variant) -> Polymod {
        match variant {
            Variant::Bech32 => Polymod::Bech32(Engine::new()),
            Variant::Bech32m => Polymod::Bech32m(Engine::new()),
            Variant::Blech32 => Polymod::Blech32(Engine::new()),
            Variant::Blech32m => Polymod::Blech32m(Engine::new()),
        }
    }

    fn input_fe(&mut self, fe: Fe32) {
        match *self {
            Polymod::Bech32(ref mut e) => e.input_fe(fe),
            Polymod::Bech32m(ref mut e) => e.input_fe(fe),
            Polymod::Blech32(ref mut e) => e.input_fe(fe),
            Polymod::Blech32m(ref mut e) => e.input_fe(fe),
        }
    }

    /// Feeds the HRP expansion: high bits, a zero, low bits. Case is ignored.
    ///
    /// `Engine::input_hrp` takes a `bech32::Hrp`, which can't hold the longer
    /// blech32 HRPs, so the expansion is fed symbol by symbol.
    fn input_hrp(&mut self, hrp: &[u8]) {
        for b in hrp {
            self.input_fe(fe(b.to_ascii_lowercase() >> 5));
        }
        self.input_fe(Fe32::Q);
        for b in hrp {
            self.input_fe(fe(b.to_ascii_lowercase()));
        }
    }

    fn input_target_residue(&mut self) {
        match *self {
            Polymod::Bech32(ref mut e) => e.input_target_residue(),
            Polymod::Bech32m(ref mut e) => e.input_target_residue(),
            Polymod::Blech32(ref mut e) => e.input_target_residue(),
            Polymod::Blech32m(ref mut e) => e.input_target_residue(),
        }
    }

    fn residue(&self) -> u64 {
        match *self {
            Polymod::Bech32(ref e) => u64::from(*e.residue()),
            Polymod::Bech32m(ref e) => u64::from(*e.residue()),
            Polymod::Blech32(ref e) => *e.residue(),
            Polymod::Blech32m(ref e) => *e.residue(),
        }
    }

    /// The checksum symbols closing the data fed so far, most significant
    /// first.
    fn checksum(mut self, len: usize) -> impl Iterator<Item = Fe32> {
        self.input_target_residue();
        let residue = self.residue();
        (0..len).rev().map(move |i| fe((residue >> (5 * i)) as u8))
    }
}

impl fmt::Debug for Polymod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let variant = match *self {
            Polymod::Bech32(_) => Variant::Bech32,
            Polymod::Bech32m(_) => Variant::Bech32m,
            Polymod::Blech32(_) => Variant::Blech32,
            Polymod::Blech32m(_) => Variant::Blech32m,
        };
        write!(f, "Polymod({}, {:#x})", variant, self.residue())
    }
}

/// The field element holding the low five bits of `value`.
fn fe(value: u8) -> Fe32 {
    Fe32::try_from(value & 0x1f).expect("five-bit value")
}

pub(crate) fn check_hrp(hrp: &str, params: &FamilyParams) -> Result<(), Error> {
    if hrp.len() < params.hrp_min {
        return Err(Error::HrpTooShort);
    }
    if hrp.len() > params.hrp_max {
        return Err(Error::HrpTooLong(hrp.len()));
    }
    match hrp.bytes().find(|b| !(33..=126).contains(b)) {
        Some(b) => Err(Error::HrpIllegalChar(b)),
        None => Ok(()),
    }
}

/// Field element of a data character already checked by [`Decoder::new`].
fn fe_value(ch: u8) -> Fe32 {
    Fe32::from_char_unchecked(ch)
}

/// Streaming encoder writing into a caller-provided buffer.
///
/// Construction writes the HRP and separator, [`Encoder::write_bits`] may be
/// called any number of times, and [`Encoder::finish`] pads the last group and
/// appends the checksum.
pub struct Encoder<'o> {
    out: &'o mut [u8],
    pos: usize,
    variant: Variant,
    polymod: Polymod,
    acc: u32,
    nacc: u32,
}

impl<'o> Encoder<'o> {
    /// Validates `hrp` and writes it, lower-cased, followed by the separator.
    pub fn new(out: &'o mut [u8], hrp: &str, variant: Variant) -> Result<Encoder<'o>, Error> {
        let params = variant.params();
        check_hrp(hrp, params)?;
        let needed = hrp.len() + 1;
        if out.len() < needed {
            return Err(Error::BufferInadequate { needed, available: out.len() });
        }

        for (dst, b) in out.iter_mut().zip(hrp.bytes()) {
            *dst = b.to_ascii_lowercase();
        }
        out[hrp.len()] = SEP as u8;

        let mut polymod = Polymod::new(variant);
        polymod.input_hrp(hrp.as_bytes());
        Ok(Encoder { out, pos: needed, variant, polymod, acc: 0, nacc: 0 })
    }

    /// Feeds the first `nbits` bits of `data`, most significant bit first.
    ///
    /// When `nbits` is not a multiple of 8 the last byte contributes its top
    /// bits only. Bits that don't fill a 5-bit group are carried over to the
    /// next call.
    ///
    /// # Panics
    ///
    /// If `data` holds fewer than `nbits` bits.
    pub fn write_bits(&mut self, data: &[u8], nbits: usize) -> Result<(), Error> {
        assert!(nbits <= data.len() * 8, "{} bits requested from {} bytes", nbits, data.len());
        let needed = self.pos + (self.nacc as usize + nbits) / 5;
        if needed > self.out.len() {
            return Err(Error::BufferInadequate { needed, available: self.out.len() });
        }

        let mut remaining = nbits;
        for &byte in data {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(8) as u32;
            remaining -= take as usize;
            self.acc = (self.acc << take) | u32::from(byte >> (8 - take));
            self.nacc += take;
            while self.nacc >= 5 {
                self.nacc -= 5;
                self.push(fe((self.acc >> self.nacc) as u8));
            }
            self.acc &= (1 << self.nacc) - 1;
        }
        Ok(())
    }

    /// Pads and writes any carried bits, then appends the checksum.
    ///
    /// Returns the total number of bytes written to the buffer.
    pub fn finish(mut self) -> Result<usize, Error> {
        let checksum_len = self.variant.params().checksum_len;
        let needed = self.pos + usize::from(self.nacc > 0) + checksum_len;
        if needed > self.out.len() {
            return Err(Error::BufferInadequate { needed, available: self.out.len() });
        }

        if self.nacc > 0 {
            self.push(fe((self.acc << (5 - self.nacc)) as u8));
        }
        for fe in self.polymod.clone().checksum(checksum_len) {
            self.out[self.pos] = CHARSET[usize::from(fe.to_u8())];
            self.pos += 1;
        }
        Ok(self.pos)
    }

    fn push(&mut self, fe: Fe32) {
        self.out[self.pos] = CHARSET[usize::from(fe.to_u8())];
        self.polymod.input_fe(fe);
        self.pos += 1;
    }
}

/// Streaming decoder over a bech32-family string.
///
/// Construction validates the structure of the whole string, so reading data
/// can't fail on bad input. The checksum and padding are checked by
/// [`Decoder::finish`]; bits read before it returns must not be trusted.
#[derive(Debug)]
pub struct Decoder<'i> {
    hrp: &'i str,
    /// Unread data characters, checksum excluded.
    data: &'i [u8],
    checksum: &'i [u8],
    family: Family,
    polymod: Polymod,
    acc: u32,
    nacc: u32,
}

impl<'i> Decoder<'i> {
    /// Checks lengths, separator, characters and case of `s`.
    pub fn new(s: &'i str, family: Family) -> Result<Decoder<'i>, Error> {
        let params = family.params();
        if s.len() < params.min_size() {
            return Err(Error::TooShort(s.len()));
        }
        if s.len() > params.max_size {
            return Err(Error::TooLong(s.len()));
        }

        let sep = s.rfind(SEP).ok_or(Error::NoSeparator)?;
        let (hrp, rest) = s.split_at(sep);
        let data = &rest[1..];
        check_hrp(hrp, params)?;
        if data.len() < params.checksum_len {
            return Err(Error::TooShort(s.len()));
        }
        for ch in data.chars() {
            Fe32::from_char(ch).map_err(|_| Error::IllegalChar(ch))?;
        }
        let has_upper = s.bytes().any(|b| b.is_ascii_uppercase());
        let has_lower = s.bytes().any(|b| b.is_ascii_lowercase());
        if has_upper && has_lower {
            return Err(Error::MixedCase);
        }

        let mut polymod = Polymod::new(family.for_version(0));
        polymod.input_hrp(hrp.as_bytes());
        let (data, checksum) = data.as_bytes().split_at(data.len() - params.checksum_len);
        Ok(Decoder { hrp, data, checksum, family, polymod, acc: 0, nacc: 0 })
    }

    /// The human-readable part, as written in the input.
    pub fn hrp(&self) -> &'i str {
        self.hrp
    }

    /// Number of data bits not yet read.
    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 5 + self.nacc as usize
    }

    /// Reads the next `nbits` bits into `out`, most significant bit first.
    /// A final partial byte is left-aligned with zero low bits.
    ///
    /// # Panics
    ///
    /// If fewer than `nbits` bits remain.
    pub fn read_bits(&mut self, out: &mut [u8], nbits: usize) -> Result<(), Error> {
        assert!(nbits <= self.bits_remaining(), "{} bits requested, {} remain", nbits, self.bits_remaining());
        let needed = (nbits + 7) / 8;
        if out.len() < needed {
            return Err(Error::BufferInadequate { needed, available: out.len() });
        }

        let mut remaining = nbits;
        for dst in &mut out[..needed] {
            let take = remaining.min(8) as u32;
            remaining -= take as usize;
            while self.nacc < take {
                let fe = self.next_fe();
                self.acc = (self.acc << 5) | u32::from(fe.to_u8());
                self.nacc += 5;
            }
            self.nacc -= take;
            let bits = (self.acc >> self.nacc) & ((1 << take) - 1);
            *dst = (bits << (8 - take)) as u8;
            self.acc &= (1 << self.nacc) - 1;
        }
        Ok(())
    }

    /// Verifies the checksum against `variant`'s constant, then verifies that
    /// the unread bits are fewer than five and all zero.
    ///
    /// `variant` must belong to the family the decoder was created for.
    pub fn finish(mut self, variant: Variant) -> Result<(), Error> {
        debug_assert_eq!(variant.family(), self.family);
        let unread = self.bits_remaining();
        let mut nonzero = self.acc != 0;
        while !self.data.is_empty() {
            nonzero |= self.next_fe() != Fe32::Q;
        }
        for &ch in self.checksum {
            self.polymod.input_fe(fe_value(ch));
        }

        if self.polymod.residue() != variant.constant() {
            return Err(Error::ChecksumFailure);
        }
        if unread >= 5 || nonzero {
            return Err(Error::PaddingError);
        }
        Ok(())
    }

    fn next_fe(&mut self) -> Fe32 {
        let fe = fe_value(self.data[0]);
        self.data = &self.data[1..];
        self.polymod.input_fe(fe);
        fe
    }
}

/// A decoded bech32-family string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The human-readable part, lower-cased.
    pub hrp: String,
    /// The data bits, with a left-aligned final partial byte.
    pub data: Vec<u8>,
    /// Number of data bits.
    pub nbits: usize,
}

/// Encodes the first `nbits` bits of `data` under `hrp`.
pub fn encode(hrp: &str, data: &[u8], nbits: usize, variant: Variant) -> Result<String, Error> {
    let size = encoded_size(variant.family(), hrp.len(), nbits);
    if size > variant.params().max_size {
        return Err(Error::TooLong(size));
    }

    let mut out = vec![0; size];
    let mut encoder = Encoder::new(&mut out, hrp, variant)?;
    encoder.write_bits(data, nbits).expect("buffer sized by encoded_size");
    let written = encoder.finish().expect("buffer sized by encoded_size");
    debug_assert_eq!(written, size);
    Ok(String::from_utf8(out).expect("bech32 output is ASCII"))
}

/// Decodes `s`, checking the checksum against `variant`.
///
/// Every data bit is returned, so no padding is discarded.
pub fn decode(s: &str, variant: Variant) -> Result<Decoded, Error> {
    let mut decoder = Decoder::new(s, variant.family())?;
    let nbits = decoder.bits_remaining();
    let mut data = vec![0; (nbits + 7) / 8];
    decoder.read_bits(&mut data, nbits).expect("buffer sized by bits_remaining");
    let hrp = decoder.hrp().to_ascii_lowercase();
    decoder.finish(variant)?;
    Ok(Decoded { hrp, data, nbits })
}

/// Extracts the human-readable part of `s` as written, after checking the
/// structure of the string. The checksum is not verified.
pub fn hrp(s: &str, family: Family) -> Result<&str, Error> {
    Decoder::new(s, family).map(|decoder| decoder.hrp())
}
