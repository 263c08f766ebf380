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

//! # Addresses
//!
//! Conversion between address text, the unpacked [`Address`] fields and the
//! [`CompactAddress`] binary form.
//!
//! A compact address starts with a discriminator byte:
//!
//! | byte           | meaning                                                   |
//! |----------------|-----------------------------------------------------------|
//! | `0xff`         | legacy; version byte and 20-byte hash follow               |
//! | `0x80..=0xbf`  | bech32, well-known HRP number `b - 0x80`                   |
//! | `0xc0..=0xfe`  | blech32, well-known HRP number `b - 0xc0`                  |
//! | `0x01..=0x7e`  | bech32, explicit HRP of `b` lower-cased bytes              |
//! | `0x7f`         | blech32, explicit HRP; a big-endian `u16` length precedes it |
//!
//! Segwit records continue with the witness version byte and the witness
//! program.
//!

use std::error;
use std::fmt;
use std::str::{self, FromStr};

use bitcoin::hex::DisplayHex;
use log::{debug, trace};

use crate::base32::{self, Decoder, Encoder};
use crate::base58;
use crate::error::write_err;
use crate::variant::{self, Family, Variant};

/// The highest witness version.
pub const MAX_WITNESS_VERSION: u8 = 16;

const LEGACY: u8 = 0xff;
const WELL_KNOWN: u8 = 0x80;
const BLECH: u8 = 0x40;
const BLECH_EXPLICIT: u8 = 0x7f;

/// Address encoding, decoding and packing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Bech32-family encoding error
    Base32(base32::Error),
    /// Base58 encoding error
    Base58(base58::Error),
    /// Script version must be 0 to 16 inclusive
    InvalidWitnessVersion(u8),
    /// The witness program is shorter than the family allows.
    WitnessProgramTooShort(usize),
    /// The witness program is longer than the family allows.
    WitnessProgramTooLong(usize),
    /// A v0 witness program must have one of the two canonical lengths.
    InvalidSegwitV0ProgramLength(usize),
    /// A legacy payload must be a 20-byte hash.
    InvalidLegacyPayloadLength(usize),
    /// A compact address is truncated or malformed.
    CorruptedCompact,
    /// A compact address refers to a well-known HRP that is not in the table.
    UnknownWellKnownHrp(u8),
    /// Was unable to parse the address.
    InvalidAddress(String),
    /// The decoded lengths disagree with the predicted ones.
    Internal(String),
    /// An output buffer was smaller than [`Address::packed_len`].
    BufferInadequate {
        /// Bytes the operation needed.
        needed: usize,
        /// Bytes the buffer had.
        available: usize,
    },
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AddressError::Base32(ref e) => write_err!(f, "bech32 error"; e),
            AddressError::Base58(ref e) => write_err!(f, "base58 error"; e),
            AddressError::InvalidWitnessVersion(wver) => {
                write!(f, "invalid witness script version: {}", wver)
            }
            AddressError::WitnessProgramTooShort(len) => {
                write!(f, "the witness program is too short ({} bytes)", len)
            }
            AddressError::WitnessProgramTooLong(len) => {
                write!(f, "the witness program is too long ({} bytes)", len)
            }
            AddressError::InvalidSegwitV0ProgramLength(len) => {
                write!(f, "a v0 witness program has an illegal length {}", len)
            }
            AddressError::InvalidLegacyPayloadLength(len) => {
                write!(f, "a legacy address payload must be 20 bytes, not {}", len)
            }
            AddressError::CorruptedCompact => f.write_str("corrupted compact address"),
            AddressError::UnknownWellKnownHrp(b) => {
                write!(f, "compact address uses unknown human-readable part {:#04x}", b)
            }
            AddressError::InvalidAddress(ref a) => {
                write!(f, "was unable to parse the address: {}", a)
            }
            AddressError::Internal(ref a) => write!(f, "internal error decoding {}", a),
            AddressError::BufferInadequate { needed, available } => {
                write!(f, "output buffer too small: needed {}, have {}", needed, available)
            }
        }
    }
}

impl error::Error for AddressError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            AddressError::Base32(ref e) => Some(e),
            AddressError::Base58(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<base32::Error> for AddressError {
    fn from(e: base32::Error) -> AddressError {
        AddressError::Base32(e)
    }
}

#[doc(hidden)]
impl From<base58::Error> for AddressError {
    fn from(e: base58::Error) -> AddressError {
        AddressError::Base58(e)
    }
}

/// A Base58Check address: a version byte and a pubkey or script hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LegacyAddress {
    version: u8,
    payload: [u8; 20],
}

impl LegacyAddress {
    /// Length of the hash carried by a legacy address.
    pub const PAYLOAD_LEN: usize = 20;

    /// Creates a legacy address. The payload must be exactly 20 bytes.
    pub fn new(version: u8, payload: &[u8]) -> Result<LegacyAddress, AddressError> {
        if payload.len() != LegacyAddress::PAYLOAD_LEN {
            return Err(AddressError::InvalidLegacyPayloadLength(payload.len()));
        }
        let mut hash = [0; 20];
        hash.copy_from_slice(payload);
        Ok(LegacyAddress { version, payload: hash })
    }

    /// The Base58Check version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The 20-byte hash.
    pub fn payload(&self) -> &[u8; 20] {
        &self.payload
    }

    fn write_text_into(&self, out: &mut [u8]) -> Result<usize, AddressError> {
        let mut data = [0; 1 + LegacyAddress::PAYLOAD_LEN];
        data[0] = self.version;
        data[1..].copy_from_slice(&self.payload);
        Ok(base58::encode_check_into(out, &data)?)
    }
}

/// A segwit address, in the bech32 or the blinded blech32 family.
///
/// The human-readable part is stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegwitAddress {
    hrp: String,
    version: u8,
    program: Vec<u8>,
    blech: bool,
}

impl SegwitAddress {
    /// Creates a segwit address, checking everything that encoding it would
    /// check: the total length, the HRP, the version and the program length.
    ///
    /// A blinded (`blech`) program is the 33-byte blinding key followed by the
    /// witness program.
    pub fn new(
        hrp: &str,
        version: u8,
        program: &[u8],
        blech: bool,
    ) -> Result<SegwitAddress, AddressError> {
        let family = if blech { Family::Blech32 } else { Family::Bech32 };
        let params = family.params();
        let size = base32::encoded_size(family, hrp.len(), 5 + 8 * program.len());
        if size > params.max_size {
            return Err(base32::Error::TooLong(size).into());
        }
        base32::check_hrp(hrp, params)?;
        if version > MAX_WITNESS_VERSION {
            return Err(AddressError::InvalidWitnessVersion(version));
        }
        if program.len() < params.program_min {
            return Err(AddressError::WitnessProgramTooShort(program.len()));
        }
        if program.len() > params.program_max {
            return Err(AddressError::WitnessProgramTooLong(program.len()));
        }
        if version == 0 && program.len() != params.pkh_size && program.len() != params.sh_size {
            return Err(AddressError::InvalidSegwitV0ProgramLength(program.len()));
        }

        Ok(SegwitAddress {
            hrp: hrp.to_ascii_lowercase(),
            version,
            program: program.to_vec(),
            blech,
        })
    }

    /// The human-readable part.
    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    /// The witness version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The witness program, blinding key included for blinded addresses.
    pub fn program(&self) -> &[u8] {
        &self.program
    }

    /// Whether this is a blinded (blech32) address.
    pub fn is_blech(&self) -> bool {
        self.blech
    }

    /// The encoding family.
    pub fn family(&self) -> Family {
        if self.blech {
            Family::Blech32
        } else {
            Family::Bech32
        }
    }

    /// The checksum variant, selected by the witness version.
    pub fn variant(&self) -> Variant {
        self.family().for_version(self.version)
    }

    fn text_len(&self) -> usize {
        base32::encoded_size(self.family(), self.hrp.len(), 5 + 8 * self.program.len())
    }

    fn write_text_into(&self, out: &mut [u8]) -> Result<usize, AddressError> {
        let needed = self.text_len();
        if out.len() < needed {
            return Err(AddressError::BufferInadequate { needed, available: out.len() });
        }
        let mut encoder = Encoder::new(out, &self.hrp, self.variant())?;
        encoder.write_bits(&[self.version << 3], 5)?;
        encoder.write_bits(&self.program, 8 * self.program.len())?;
        Ok(encoder.finish()?)
    }
}

/// The unpacked fields of an address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Address {
    /// A Base58Check address.
    Legacy(LegacyAddress),
    /// A bech32 or blech32 address.
    Segwit(SegwitAddress),
}

impl Address {
    /// Whether this is a segwit address.
    pub fn is_segwit(&self) -> bool {
        match *self {
            Address::Legacy(_) => false,
            Address::Segwit(_) => true,
        }
    }

    /// The human-readable part of a segwit address.
    pub fn hrp(&self) -> Option<&str> {
        match *self {
            Address::Legacy(_) => None,
            Address::Segwit(ref a) => Some(a.hrp()),
        }
    }

    /// The witness version, or the Base58Check version byte.
    pub fn version(&self) -> u8 {
        match *self {
            Address::Legacy(ref a) => a.version(),
            Address::Segwit(ref a) => a.version(),
        }
    }

    /// The witness program, or the 20-byte hash.
    pub fn program(&self) -> &[u8] {
        match *self {
            Address::Legacy(ref a) => &a.payload()[..],
            Address::Segwit(ref a) => a.program(),
        }
    }

    /// Whether this is a blinded (blech32) address.
    pub fn is_blech(&self) -> bool {
        match *self {
            Address::Legacy(_) => false,
            Address::Segwit(ref a) => a.is_blech(),
        }
    }

    /// Upper bound on the length of the text form.
    pub fn text_len(&self) -> usize {
        match *self {
            Address::Legacy(_) => base58::max_encoded_check_len(1 + LegacyAddress::PAYLOAD_LEN),
            Address::Segwit(ref a) => a.text_len(),
        }
    }

    /// Writes the text form into `out`, returning its length.
    pub fn write_text_into(&self, out: &mut [u8]) -> Result<usize, AddressError> {
        match *self {
            Address::Legacy(ref a) => a.write_text_into(out),
            Address::Segwit(ref a) => a.write_text_into(out),
        }
    }

    /// The exact length of the compact form.
    pub fn packed_len(&self) -> usize {
        match *self {
            Address::Legacy(_) => 1 + 1 + LegacyAddress::PAYLOAD_LEN,
            Address::Segwit(ref a) => hrp_header_len(a.hrp(), a.family()) + 1 + a.program.len(),
        }
    }

    /// Writes the compact form into `out`, returning its length.
    ///
    /// Nothing is written unless `out` holds at least
    /// [`Address::packed_len`] bytes.
    pub fn pack_into(&self, out: &mut [u8]) -> Result<usize, AddressError> {
        let needed = self.packed_len();
        if out.len() < needed {
            return Err(AddressError::BufferInadequate { needed, available: out.len() });
        }

        match *self {
            Address::Legacy(ref a) => {
                out[0] = LEGACY;
                out[1] = a.version;
                out[2..needed].copy_from_slice(&a.payload);
            }
            Address::Segwit(ref a) => {
                let header = write_hrp_header(out, &a.hrp, a.family());
                out[header] = a.version;
                out[header + 1..needed].copy_from_slice(&a.program);
            }
        }
        Ok(needed)
    }

    /// The compact form of this address.
    pub fn pack(&self) -> CompactAddress {
        CompactAddress::pack(self)
    }

    /// Reads the fields of a compact address.
    pub fn unpack(bytes: &[u8]) -> Result<Address, AddressError> {
        let (&tag, rest) = bytes.split_first().ok_or(AddressError::CorruptedCompact)?;
        let (hrp, blech, rest) = match tag {
            0xff => {
                if rest.len() != 1 + LegacyAddress::PAYLOAD_LEN {
                    return Err(AddressError::CorruptedCompact);
                }
                return Ok(Address::Legacy(LegacyAddress::new(rest[0], &rest[1..])?));
            }
            0x00 => return Err(AddressError::CorruptedCompact),
            0x01..=0x7e => {
                let len = usize::from(tag);
                if rest.len() < len {
                    return Err(AddressError::CorruptedCompact);
                }
                (&rest[..len], false, &rest[len..])
            }
            0x7f => {
                if rest.len() < 2 {
                    return Err(AddressError::CorruptedCompact);
                }
                let len = usize::from(u16::from_be_bytes([rest[0], rest[1]]));
                let rest = &rest[2..];
                if rest.len() < len {
                    return Err(AddressError::CorruptedCompact);
                }
                (&rest[..len], true, &rest[len..])
            }
            0x80..=0xfe => {
                let hrp = variant::well_known_hrp(usize::from(tag & !(WELL_KNOWN | BLECH)))
                    .ok_or(AddressError::UnknownWellKnownHrp(tag))?;
                (hrp.as_bytes(), tag & BLECH != 0, rest)
            }
        };

        let (&version, program) = rest.split_first().ok_or(AddressError::CorruptedCompact)?;
        let hrp = match str::from_utf8(hrp) {
            Ok(hrp) if hrp.is_ascii() => hrp,
            _ => return Err(AddressError::CorruptedCompact),
        };
        Ok(Address::Segwit(SegwitAddress::new(hrp, version, program, blech)?))
    }
}

impl From<LegacyAddress> for Address {
    fn from(a: LegacyAddress) -> Address {
        Address::Legacy(a)
    }
}

impl From<SegwitAddress> for Address {
    fn from(a: SegwitAddress) -> Address {
        Address::Segwit(a)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = vec![0; self.text_len()];
        let len = self.write_text_into(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(str::from_utf8(&buf[..len]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Address, AddressError> {
        CompactAddress::from_str(s)?.unpack()
    }
}

/// Length of the discriminator and HRP part of a compact segwit address.
fn hrp_header_len(hrp: &str, family: Family) -> usize {
    match (variant::find_well_known_hrp(hrp), family) {
        (Some(_), _) => 1,
        (None, Family::Bech32) => 1 + hrp.len(),
        (None, Family::Blech32) => 3 + hrp.len(),
    }
}

/// Writes the discriminator and HRP part, returning its length.
fn write_hrp_header(out: &mut [u8], hrp: &str, family: Family) -> usize {
    let blech = if family.is_blech() { BLECH } else { 0 };
    if let Some(index) = variant::find_well_known_hrp(hrp) {
        debug_assert!(index < variant::WELL_KNOWN_HRP_SLOTS);
        out[0] = WELL_KNOWN | blech | index as u8;
        return 1;
    }

    let start = match family {
        Family::Bech32 => {
            out[0] = hrp.len() as u8;
            1
        }
        Family::Blech32 => {
            out[0] = BLECH_EXPLICIT;
            out[1..3].copy_from_slice(&(hrp.len() as u16).to_be_bytes());
            3
        }
    };
    for (dst, b) in out[start..].iter_mut().zip(hrp.bytes()) {
        *dst = b.to_ascii_lowercase();
    }
    start + hrp.len()
}

/// An address in its compact binary form.
///
/// The bytes always unpack to a valid [`Address`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompactAddress(Vec<u8>);

impl CompactAddress {
    /// Packs the fields of an address.
    pub fn pack(address: &Address) -> CompactAddress {
        let mut out = vec![0; address.packed_len()];
        let len = address.pack_into(&mut out).expect("buffer sized by packed_len");
        debug_assert_eq!(len, out.len());
        CompactAddress(out)
    }

    /// Validates a compact address by unpacking it, and returns it in
    /// canonical form: well-known HRPs as an index, explicit HRPs lower-cased.
    pub fn from_bytes(bytes: &[u8]) -> Result<CompactAddress, AddressError> {
        Ok(Address::unpack(bytes)?.pack())
    }

    /// Reads the fields back.
    pub fn unpack(&self) -> Result<Address, AddressError> {
        Address::unpack(&self.0)
    }

    /// Whether this is a segwit address.
    pub fn is_segwit(&self) -> bool {
        self.0.first() != Some(&LEGACY)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the address, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CompactAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&Address> for CompactAddress {
    fn from(address: &Address) -> CompactAddress {
        CompactAddress::pack(address)
    }
}

impl fmt::Debug for CompactAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CompactAddress({})", self.0.as_hex())
    }
}

impl fmt::Display for CompactAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let address = self.unpack().map_err(|_| fmt::Error)?;
        fmt::Display::fmt(&address, f)
    }
}

/// Outcome of decoding a string under one family.
enum Attempt {
    /// The string can't have this family's sizes.
    Skipped,
    /// The string is not a segwit address at all.
    NotSegwit(AddressError),
    /// The string failed under this family only.
    Rejected(Variant, AddressError),
    Accepted(CompactAddress),
}

fn try_witness(s: &str, sep: usize, family: Family) -> Result<Attempt, AddressError> {
    let params = family.params();
    let n_data = s.len() - sep - 1;
    if s.len() > params.max_size
        || sep < params.hrp_min
        || sep > params.hrp_max
        || n_data < 1 + params.checksum_len
    {
        return Ok(Attempt::Skipped);
    }
    let data_bits = 5 * (n_data - params.checksum_len);
    let n_program = (data_bits - 5) / 8;
    if n_program < params.program_min || n_program > params.program_max {
        return Ok(Attempt::Skipped);
    }

    let mut decoder = match Decoder::new(s, family) {
        Ok(decoder) => decoder,
        Err(e) => match e {
            base32::Error::MixedCase
            | base32::Error::IllegalChar(_)
            | base32::Error::HrpIllegalChar(_) => return Ok(Attempt::NotSegwit(e.into())),
            base32::Error::TooShort(_)
            | base32::Error::TooLong(_)
            | base32::Error::NoSeparator
            | base32::Error::HrpTooShort
            | base32::Error::HrpTooLong(_)
            | base32::Error::PaddingError
            | base32::Error::ChecksumFailure
            | base32::Error::BufferInadequate { .. } => {
                unreachable!("excluded by the size checks: {}", e)
            }
        },
    };
    if decoder.hrp().len() != sep || decoder.bits_remaining() != data_bits {
        return Err(AddressError::Internal(s.to_owned()));
    }

    let mut version = [0];
    decoder.read_bits(&mut version, 5).expect("one byte holds the version");
    let version = version[0] >> 3;
    if version > MAX_WITNESS_VERSION {
        return Ok(Attempt::NotSegwit(AddressError::InvalidWitnessVersion(version)));
    }

    let hrp = decoder.hrp();
    let header = hrp_header_len(hrp, family);
    let mut out = vec![0; header + 1 + n_program];
    write_hrp_header(&mut out, hrp, family);
    out[header] = version;
    decoder
        .read_bits(&mut out[header + 1..], 8 * n_program)
        .expect("buffer sized by the program length");

    let variant = family.for_version(version);
    match decoder.finish(variant) {
        Ok(()) => {}
        Err(e @ base32::Error::ChecksumFailure) | Err(e @ base32::Error::PaddingError) => {
            return Ok(Attempt::Rejected(variant, e.into()));
        }
        Err(e) => unreachable!("finishing only checks checksum and padding: {}", e),
    }
    if version == 0 && n_program != params.pkh_size && n_program != params.sh_size {
        let e = AddressError::InvalidSegwitV0ProgramLength(n_program);
        return Ok(Attempt::Rejected(variant, e));
    }
    Ok(Attempt::Accepted(CompactAddress(out)))
}

fn legacy_from_str(s: &str) -> Result<CompactAddress, AddressError> {
    // decoding time is quadratic in the length
    if s.len() > base58::max_encoded_check_len(1 + LegacyAddress::PAYLOAD_LEN) {
        debug!("{} characters is too long for base58check", s.len());
        return Err(AddressError::InvalidAddress(s.to_owned()));
    }
    let mut out = vec![0; 1 + base58::max_decoded_check_len(s.len())];
    match base58::decode_check_into(&mut out[1..], s) {
        Ok(len) if len == 1 + LegacyAddress::PAYLOAD_LEN => {
            out[0] = LEGACY;
            out.truncate(1 + len);
            Ok(CompactAddress(out))
        }
        Ok(len) => {
            debug!("{}: base58check payload has {} bytes", s, len);
            Err(AddressError::InvalidAddress(s.to_owned()))
        }
        Err(e) => {
            debug!("{}: not base58check: {}", s, e);
            Err(AddressError::InvalidAddress(s.to_owned()))
        }
    }
}

impl FromStr for CompactAddress {
    type Err = AddressError;

    /// Decodes address text, trying bech32, then blech32, then Base58Check.
    fn from_str(s: &str) -> Result<CompactAddress, AddressError> {
        if let Some(sep) = s.rfind(base32::SEP) {
            for &family in &[Family::Bech32, Family::Blech32] {
                match try_witness(s, sep, family)? {
                    Attempt::Accepted(compact) => return Ok(compact),
                    Attempt::Skipped => trace!("{}: sizes don't fit {:?}", s, family),
                    Attempt::Rejected(variant, e) => debug!("{}: rejected as {}: {}", s, variant, e),
                    Attempt::NotSegwit(e) => {
                        debug!("{}: not segwit: {}", s, e);
                        break;
                    }
                }
            }
        }
        legacy_from_str(s)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Address {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt::Formatter;

        struct Visitor;
        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("an address")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Address::from_str(v).map_err(E::custom)
            }

            fn visit_borrowed_str<E>(self, v: &'de str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(v)
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CompactAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt::Formatter;

        struct TextVisitor;
        impl<'de> serde::de::Visitor<'de> for TextVisitor {
            type Value = CompactAddress;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("an address")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                CompactAddress::from_str(v).map_err(E::custom)
            }
        }

        struct BytesVisitor;
        impl<'de> serde::de::Visitor<'de> for BytesVisitor {
            type Value = CompactAddress;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a compact address")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                CompactAddress::from_bytes(v).map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(TextVisitor)
        } else {
            deserializer.deserialize_bytes(BytesVisitor)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CompactAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use bitcoin::hex::FromHex;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn roundtrips(s: &str) -> CompactAddress {
        let compact = CompactAddress::from_str(s).unwrap();
        let address = compact.unpack().unwrap();
        let text = if compact.is_segwit() { s.to_ascii_lowercase() } else { s.to_owned() };
        assert_eq!(address.to_string(), text);
        assert_eq!(compact.to_string(), text);
        assert_eq!(Address::from_str(s).unwrap(), address);
        assert_eq!(address.pack(), compact);
        assert_eq!(address.packed_len(), compact.as_bytes().len());
        assert_eq!(CompactAddress::from_bytes(compact.as_bytes()).unwrap(), compact);
        #[cfg(feature = "serde")]
        assert_eq!(
            serde_json::from_value::<Address>(serde_json::to_value(&address).unwrap()).ok().as_ref(),
            Some(&address)
        );
        compact
    }

    fn hex(s: &str) -> Vec<u8> {
        Vec::from_hex(s).unwrap()
    }

    #[test]
    fn bip_173_350_addresses() {
        let compact = roundtrips("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        let mut expected = vec![0x80, 0];
        expected.extend(hex("751e76e8199196d454941c45d1b3a323f1433bd6"));
        assert_eq!(compact.as_bytes(), &expected[..]);
        assert_eq!(roundtrips("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4"), compact);

        let compact =
            roundtrips("tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7");
        let address = compact.unpack().unwrap();
        assert_eq!(address.hrp(), Some("tb"));
        assert_eq!(address.version(), 0);
        assert_eq!(
            address.program(),
            &hex("1863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262")[..]
        );
        assert_eq!(compact.as_bytes()[0], 0x81);

        let address = roundtrips(
            "bc1pw508d6qejxtdg4y5r3zarvary0c5xw7kw508d6qejxtdg4y5r3zarvary0c5xw7kt5nd6y",
        )
        .unpack()
        .unwrap();
        assert_eq!(address.version(), 1);
        assert_eq!(address.program().len(), 40);

        let address = roundtrips("bc1sw50qgdz25j").unpack().unwrap();
        assert_eq!(address.version(), 16);
        assert_eq!(address.program(), &[0x75, 0x1e][..]);

        let address = roundtrips("bc1zw508d6qejxtdg4y5r3zarvaryvaxxpcs").unpack().unwrap();
        assert_eq!(address.version(), 2);
        assert_eq!(address.program(), &hex("751e76e8199196d454941c45d1b3a323")[..]);

        let address =
            roundtrips("tb1pqqqqp399et2xygdj5xreqhjjvcmzhxw4aywxecjdzew6hylgvsesf3hn0c")
                .unpack()
                .unwrap();
        assert_eq!(
            address.program(),
            &hex("000000c4a5cad46221b2a187905e5266362b99d5e91c6ce24d165dab93e86433")[..]
        );
        assert!(!address.is_blech());
    }

    #[test]
    fn elements_addresses() {
        let compact = roundtrips("ex1q7gkeyjut0mrxc3j0kjlt7rmcnvsh0gt45d3fud");
        assert_eq!(compact.as_bytes()[..2], [0x83, 0]);
        assert_eq!(compact.as_bytes()[2..], hex("f22d924b8b7ec66c464fb4bebf0f789b2177a175")[..]);

        let compact = roundtrips("ert1qwhh2n5qypypm0eufahm2pvj8raj9zq5c27cysu");
        assert_eq!(compact.as_bytes()[..2], [0x85, 0]);
        assert_eq!(compact.as_bytes()[2..], hex("75eea9d0040903b7e789edf6a0b2471f64510298")[..]);

        let compact = roundtrips("el1qq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsmxh4xcjh2rse");
        assert_eq!(compact.as_bytes()[..2], [0xc6, 0]);
        assert_eq!(compact.as_bytes()[2..], hex("03f9bb4439168b190c7f308b36fedc74f258a1bc2a0f1ddee2e1135d663b68921675eea9d0040903b7e789edf6a0b2471f64510298")[..]);
        let address = compact.unpack().unwrap();
        assert!(address.is_blech());
        assert_eq!(address.hrp(), Some("el"));

        let compact = roundtrips("lq1qqf8er278e6nyvuwtgf39e6ewvdcnjupn9a86rzpx655y5lhkt0walu3djf9cklkxd3ryld97hu8h3xepw7sh2rlu7q45dcew5");
        assert_eq!(compact.as_bytes()[..2], [0xc4, 0]);
        assert_eq!(compact.as_bytes()[2..], hex("024f91abc7cea64671cb42625ceb2e63713970332f4fa18826d5284a7ef65bdddff22d924b8b7ec66c464fb4bebf0f789b2177a175")[..]);
    }

    #[test]
    fn legacy_addresses() {
        let compact = roundtrips("1111111111111111111114oLvT2");
        let mut expected = vec![LEGACY];
        expected.extend_from_slice(&[0; 21]);
        assert_eq!(compact.as_bytes(), &expected[..]);
        assert!(!compact.is_segwit());
        let address = compact.unpack().unwrap();
        assert_eq!(address, LegacyAddress::new(0, &[0; 20]).unwrap().into());
        assert_eq!(address.hrp(), None);

        // Elements regtest and Liquid p2pkh
        let address = roundtrips("2dxmEBXc2qMYcLSKiDBxdEePY3Ytixmnh4E").unpack().unwrap();
        assert_eq!(address.version(), 235);
        assert_eq!(address.program(), &hex("fff9ff3859841aaf0a87300a9d9b744d17e937ea")[..]);
        let address = roundtrips("GqiQRsPEyJLAsEBFB5R34KHuqxDNkG3zur").unpack().unwrap();
        assert_eq!(address.version(), 39);

        roundtrips("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2");
        roundtrips("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy");

        assert_eq!(
            LegacyAddress::new(0, &[0; 21]),
            Err(AddressError::InvalidLegacyPayloadLength(21))
        );
    }

    #[test]
    fn invalid_addresses() {
        let invalid = [
            // wrong checksum constant for the witness version
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kemeawh",
            "tb1q0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vq24jc47",
            "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqh2y7hd",
            "el1pq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsxguu9nrdg2pc",
            "el1qq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsnnmzrstzt7de",
            // checksum
            "bc1qr508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5",
            // v0 of an illegal size
            "BC1QR508D6QEJXTDG4Y5R3ZARVARYV98GJ9P",
            // version 17
            "ert130xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqqu2tys",
            // mixed case
            "bc1qW508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            // program of 74 bytes
            "el1pq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqpe9jfn0gypaj",
            // no data
            "bc1gmk9yu",
            // blinded base58 address
            "CTEo6VKG8xbe7HnfVW9mQoWTgtgeRSPktwTLbELzGw5tV8Ngzu53EBiasFMQKVbWmKWWTAdN5AUf4M6Y",
            "",
            "1",
            "not an address",
        ];
        for s in &invalid {
            assert_eq!(
                CompactAddress::from_str(s),
                Err(AddressError::InvalidAddress(s.to_string())),
                "{}",
                s
            );
        }
    }

    #[test]
    fn zero_program_matches_reference() {
        let address = SegwitAddress::new("bc", 0, &[0; 20], false).unwrap();
        assert_eq!(
            Address::from(address).to_string(),
            "bc1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq9e75rs"
        );
    }

    #[test]
    fn explicit_hrps() {
        let address: Address = SegwitAddress::new("XyZ", 1, &[1; 32], false).unwrap().into();
        assert_eq!(address.hrp(), Some("xyz"));
        assert_eq!(
            address.to_string(),
            "xyz1pqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqsdn7zu4"
        );
        let compact = roundtrips("xyz1pqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqsdn7zu4");
        assert_eq!(compact.as_bytes()[..5], [3, b'x', b'y', b'z', 1]);
        assert_eq!(compact.as_bytes().len(), 5 + 32);

        let address: Address = SegwitAddress::new("foo", 0, &[2; 53], true).unwrap().into();
        let compact = roundtrips("foo1qqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyk3zzy3k84vpk");
        assert_eq!(compact.unpack().unwrap(), address);
        assert_eq!(compact.as_bytes()[..7], [0x7f, 0, 3, b'f', b'o', b'o', 0]);

        // a long blinded HRP needs the two length bytes
        let hrp = "h".repeat(300);
        let address: Address = SegwitAddress::new(&hrp, 1, &[7; 40], true).unwrap().into();
        let compact = address.pack();
        assert_eq!(compact.as_bytes()[..3], [0x7f, 0x01, 0x2c]);
        assert_eq!(roundtrips(&address.to_string()), compact);
    }

    #[test]
    fn well_known_hrp_compaction() {
        for (index, hrp) in variant::WELL_KNOWN_HRPS.iter().enumerate() {
            for &blech in &[false, true] {
                let len = if blech { 53 } else { 20 };
                let upper = hrp.to_ascii_uppercase();
                let address: Address = SegwitAddress::new(&upper, 0, &vec![9; len], blech).unwrap().into();
                let compact = address.pack();
                let blech_bit = if blech { BLECH } else { 0 };
                let tag = WELL_KNOWN | blech_bit | index as u8;
                assert_eq!(compact.as_bytes()[0], tag);
                assert!(compact.as_bytes().len() < len + 2 + hrp.len());
                assert_eq!(compact.unpack().unwrap().hrp(), Some(*hrp));
            }
        }

        // explicit spelling of a well-known HRP is canonicalized
        let mut explicit = vec![2, b'B', b'c', 0];
        explicit.extend_from_slice(&[0; 20]);
        let compact = CompactAddress::from_bytes(&explicit).unwrap();
        assert_eq!(compact.as_bytes()[..2], [0x80, 0]);
    }

    #[test]
    fn segwit_boundaries() {
        let new = |version, len, blech| SegwitAddress::new("tb", version, &vec![0; len], blech).map(|_| ());
        assert_eq!(new(1, 1, false), Err(AddressError::WitnessProgramTooShort(1)));
        assert_eq!(new(1, 2, false), Ok(()));
        assert_eq!(new(1, 40, false), Ok(()));
        assert_eq!(new(1, 41, false), Err(AddressError::WitnessProgramTooLong(41)));
        assert_eq!(new(0, 20, false), Ok(()));
        assert_eq!(new(0, 21, false), Err(AddressError::InvalidSegwitV0ProgramLength(21)));
        assert_eq!(new(0, 32, false), Ok(()));
        assert_eq!(new(1, 34, true), Err(AddressError::WitnessProgramTooShort(34)));
        assert_eq!(new(1, 35, true), Ok(()));
        assert_eq!(new(1, 73, true), Ok(()));
        assert_eq!(new(1, 74, true), Err(AddressError::WitnessProgramTooLong(74)));
        assert_eq!(new(0, 53, true), Ok(()));
        assert_eq!(new(0, 54, true), Err(AddressError::InvalidSegwitV0ProgramLength(54)));
        assert_eq!(new(0, 65, true), Ok(()));
        assert_eq!(new(16, 2, false), Ok(()));
        assert_eq!(new(17, 2, false), Err(AddressError::InvalidWitnessVersion(17)));

        assert_eq!(
            SegwitAddress::new("", 1, &[0; 2], false),
            Err(AddressError::Base32(base32::Error::HrpTooShort))
        );
        assert_eq!(
            SegwitAddress::new("a b", 1, &[0; 2], false),
            Err(AddressError::Base32(base32::Error::HrpIllegalChar(b' ')))
        );
        // 83 + 1 + 5 + 6
        assert_eq!(
            SegwitAddress::new(&"x".repeat(83), 1, &[0; 2], false),
            Err(AddressError::Base32(base32::Error::TooLong(95)))
        );
        assert!(SegwitAddress::new(&"x".repeat(78), 1, &[0; 2], false).is_ok());
    }

    #[test]
    fn corrupted_compact() {
        let cases: Vec<(Vec<u8>, AddressError)> = vec![
            (vec![], AddressError::CorruptedCompact),
            (vec![0x00, 0, 1, 2], AddressError::CorruptedCompact),
            (vec![0xff; 3], AddressError::CorruptedCompact),
            (vec![0xff; 23], AddressError::CorruptedCompact),
            (vec![0x80], AddressError::CorruptedCompact),
            (vec![0x05, b'a', b'b'], AddressError::CorruptedCompact),
            (vec![0x7f, 0x00], AddressError::CorruptedCompact),
            (vec![0x7f, 0x00, 0x05, b'a'], AddressError::CorruptedCompact),
            (vec![0x02, 0xc3, 0xa9, 1, 0, 0], AddressError::CorruptedCompact),
            (vec![0x89, 1, 0, 0], AddressError::UnknownWellKnownHrp(0x89)),
            (vec![0xbf, 1, 0, 0], AddressError::UnknownWellKnownHrp(0xbf)),
            (vec![0xfe, 1, 0, 0], AddressError::UnknownWellKnownHrp(0xfe)),
            (vec![0x80, 17, 0, 0], AddressError::InvalidWitnessVersion(17)),
            (vec![0x80, 1, 0], AddressError::WitnessProgramTooShort(1)),
            (vec![0xc0, 1, 0, 0], AddressError::WitnessProgramTooShort(2)),
            (vec![0x7f, 0x00, 0x00, 1, 0, 0], AddressError::Base32(base32::Error::HrpTooShort)),
        ];
        for (bytes, want) in cases {
            assert_eq!(Address::unpack(&bytes), Err(want.clone()), "{:x?}", bytes);
            assert_eq!(CompactAddress::from_bytes(&bytes), Err(want), "{:x?}", bytes);
        }

        let mut v0 = vec![0x80, 0];
        v0.extend_from_slice(&[0; 21]);
        assert_eq!(Address::unpack(&v0), Err(AddressError::InvalidSegwitV0ProgramLength(21)));
    }

    #[test]
    fn pack_into_reserved_header() {
        let address = Address::from_str("ex1q7gkeyjut0mrxc3j0kjlt7rmcnvsh0gt45d3fud").unwrap();
        let mut buf = [0xaa; 4 + 22];
        let len = address.pack_into(&mut buf[4..]).unwrap();
        assert_eq!(len, 22);
        assert_eq!(buf[..4], [0xaa; 4]);
        assert_eq!(Address::unpack(&buf[4..4 + len]).unwrap(), address);

        let mut small = [0xaa; 21];
        assert_eq!(
            address.pack_into(&mut small),
            Err(AddressError::BufferInadequate { needed: 22, available: 21 })
        );
        assert_eq!(small, [0xaa; 21]);
    }

    #[test]
    fn write_text_into_short_buffer() {
        let address: Address = SegwitAddress::new("bc", 0, &[7; 20], false).unwrap().into();
        let needed = address.text_len();
        assert_eq!(needed, 42);

        let mut small = vec![0xaa; needed - 1];
        assert_eq!(
            address.write_text_into(&mut small),
            Err(AddressError::BufferInadequate { needed, available: needed - 1 })
        );
        assert_eq!(small, vec![0xaa; needed - 1]);

        let mut buf = vec![0xaa; 2 + needed];
        let len = address.write_text_into(&mut buf[2..]).unwrap();
        assert_eq!(len, needed);
        assert_eq!(buf[..2], [0xaa; 2]);
        assert_eq!(str::from_utf8(&buf[2..]).unwrap(), address.to_string());

        let legacy: Address = LegacyAddress::new(0, &[0; 20]).unwrap().into();
        let mut small = [0xaa; 26];
        assert_eq!(
            legacy.write_text_into(&mut small),
            Err(AddressError::Base58(base58::Error::BufferInadequate { needed: 27, available: 26 }))
        );
        assert_eq!(small, [0xaa; 26]);
    }

    #[test]
    fn oversized_text_rejected() {
        for s in &["2".repeat(20_000), format!("bc1{}", "q".repeat(20_000)), "1".repeat(36)] {
            assert_eq!(CompactAddress::from_str(s), Err(AddressError::InvalidAddress(s.clone())));
        }
        // the longest text a legacy record can come from
        let longest = base58::max_encoded_check_len(1 + LegacyAddress::PAYLOAD_LEN);
        assert_eq!(longest, 35);
        assert!(base58::encode_check(&[0xff; 21]).len() <= longest);
    }

    #[test]
    fn random_round_trips() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for _ in 0..300 {
            let blech = rng.gen::<bool>();
            let family = if blech { Family::Blech32 } else { Family::Bech32 };
            let params = family.params();
            let version = rng.gen_range(0..=MAX_WITNESS_VERSION);
            let len = if version == 0 {
                if rng.gen() { params.pkh_size } else { params.sh_size }
            } else {
                rng.gen_range(params.program_min..=params.program_max)
            };
            let program: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let hrp: String = if rng.gen_range(0..3) == 0 {
                variant::WELL_KNOWN_HRPS[rng.gen_range(0..variant::WELL_KNOWN_HRPS.len())].to_owned()
            } else {
                (0..rng.gen_range(1..=10)).map(|_| char::from(rng.gen_range(33u8..=126))).collect()
            };

            let address: Address = SegwitAddress::new(&hrp, version, &program, blech).unwrap().into();
            let text = address.to_string();
            assert_eq!(text.len(), address.text_len());
            let compact = CompactAddress::from_str(&text).unwrap();
            assert_eq!(compact, address.pack());
            assert_eq!(compact.unpack().unwrap(), address);
            assert!(compact.is_segwit());
        }
    }

    #[test]
    fn error_sources() {
        use std::error::Error;

        let e = AddressError::from(base58::Error::TooShort(1));
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "base58 error");
        assert!(AddressError::CorruptedCompact.source().is_none());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde_compact() {
        use serde_test::{assert_tokens, Configure, Token};

        const ZERO_P2PKH: &[u8] = &[
            0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let compact = CompactAddress::from_str("1111111111111111111114oLvT2").unwrap();
        assert_eq!(compact.as_bytes(), ZERO_P2PKH);
        assert_tokens(&compact.clone().readable(), &[Token::Str("1111111111111111111114oLvT2")]);
        assert_tokens(&compact.clone().compact(), &[Token::Bytes(ZERO_P2PKH)]);

        let compact = CompactAddress::from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
        let bytes = bincode::serialize(&compact).unwrap();
        assert_eq!(bincode::deserialize::<CompactAddress>(&bytes).unwrap(), compact);
        let json = serde_json::to_string(&compact).unwrap();
        assert_eq!(json, "\"bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4\"");
        assert_eq!(serde_json::from_str::<CompactAddress>(&json).unwrap(), compact);

        assert!(serde_json::from_str::<CompactAddress>("\"bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5\"").is_err());
        assert!(bincode::deserialize::<CompactAddress>(&bincode::serialize(&vec![0u8; 3]).unwrap()).is_err());
    }
}
