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

//! # Variants
//!
//! Parameter records for the bech32 family of encodings, and the registry of
//! well-known human-readable parts.
//!

use std::fmt;

use bech32::Checksum;

/// A family of bech32-like encodings sharing a charset, a BCH generator and
/// size bounds. Members of a family differ only in their checksum constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    /// BIP-173/BIP-350 segwit encodings.
    Bech32,
    /// The Elements encodings for blinded (confidential) addresses.
    Blech32,
}

/// The immutable parameters of a [`Family`].
#[derive(Debug, PartialEq, Eq)]
pub struct FamilyParams {
    /// Number of checksum characters.
    pub checksum_len: usize,
    /// Maximum length of an encoded string.
    pub max_size: usize,
    /// Minimum length of the human-readable part.
    pub hrp_min: usize,
    /// Maximum length of the human-readable part.
    pub hrp_max: usize,
    /// Minimum length of a witness program.
    pub program_min: usize,
    /// Maximum length of a witness program.
    pub program_max: usize,
    /// Length of a version 0 pubkey-hash program.
    pub pkh_size: usize,
    /// Length of a version 0 script-hash program.
    pub sh_size: usize,
}

impl FamilyParams {
    /// Minimum length of an encoded string: a one-character HRP, the
    /// separator and the checksum.
    pub const fn min_size(&self) -> usize {
        self.hrp_min + 1 + self.checksum_len
    }
}

const BECH32: FamilyParams = FamilyParams {
    checksum_len: 6,
    max_size: 90,
    hrp_min: 1,
    hrp_max: 83,
    program_min: 2,
    program_max: 40,
    pkh_size: 20,
    sh_size: 32,
};

// Blinded programs carry a 33-byte blinding pubkey in front of the program.
const BLECH32: FamilyParams = FamilyParams {
    checksum_len: 12,
    max_size: 1024,
    hrp_min: 1,
    hrp_max: 1024 - 1 - 12,
    program_min: 33 + 2,
    program_max: 33 + 40,
    pkh_size: 33 + 20,
    sh_size: 33 + 32,
};

const BLECH32_GENERATOR: [u64; 5] = [
    0x7d_52fb_a40b_d886,
    0x5e_8dbf_1a03_950c,
    0x1c_3a3c_7407_2a18,
    0x38_5d72_fa0e_5139,
    0x70_93e5_a608_865b,
];

/// The blech32 checksum algorithm.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Blech32 {}

impl Checksum for Blech32 {
    type MidstateRepr = u64;
    const CHECKSUM_LENGTH: usize = BLECH32.checksum_len;
    const GENERATOR_SH: [u64; 5] = BLECH32_GENERATOR;
    const TARGET_RESIDUE: u64 = 1;

    const CODE_LENGTH: usize = BLECH32.max_size;
}

/// The blech32m checksum algorithm.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Blech32m {}

impl Checksum for Blech32m {
    type MidstateRepr = u64;
    const CHECKSUM_LENGTH: usize = BLECH32.checksum_len;
    const GENERATOR_SH: [u64; 5] = BLECH32_GENERATOR;
    const TARGET_RESIDUE: u64 = 0x455_972a_3350_f7a1;

    const CODE_LENGTH: usize = BLECH32.max_size;
}

impl Family {
    /// The parameter record of this family.
    pub fn params(self) -> &'static FamilyParams {
        match self {
            Family::Bech32 => &BECH32,
            Family::Blech32 => &BLECH32,
        }
    }

    /// The checksum variant a segwit address of the given witness version
    /// must use (BIP-350).
    pub fn for_version(self, version: u8) -> Variant {
        match (self, version) {
            (Family::Bech32, 0) => Variant::Bech32,
            (Family::Bech32, _) => Variant::Bech32m,
            (Family::Blech32, 0) => Variant::Blech32,
            (Family::Blech32, _) => Variant::Blech32m,
        }
    }

    /// Whether this is the blinded family.
    pub fn is_blech(self) -> bool {
        self == Family::Blech32
    }
}

/// A checksum variant: a family together with its checksum constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    /// BIP-173 bech32.
    Bech32,
    /// BIP-350 bech32m.
    Bech32m,
    /// Elements blech32.
    Blech32,
    /// Elements blech32m.
    Blech32m,
}

impl Variant {
    /// The family this variant belongs to.
    pub fn family(self) -> Family {
        match self {
            Variant::Bech32 | Variant::Bech32m => Family::Bech32,
            Variant::Blech32 | Variant::Blech32m => Family::Blech32,
        }
    }

    /// The parameter record of this variant's family.
    pub fn params(self) -> &'static FamilyParams {
        self.family().params()
    }

    /// The residue a valid checksum leaves in the checksum engine.
    pub fn constant(self) -> u64 {
        match self {
            Variant::Bech32 => u64::from(bech32::Bech32::TARGET_RESIDUE),
            Variant::Bech32m => u64::from(bech32::Bech32m::TARGET_RESIDUE),
            Variant::Blech32 => Blech32::TARGET_RESIDUE,
            Variant::Blech32m => Blech32m::TARGET_RESIDUE,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Variant::Bech32 => "bech32",
            Variant::Bech32m => "bech32m",
            Variant::Blech32 => "blech32",
            Variant::Blech32m => "blech32m",
        })
    }
}

/// Human-readable parts stored as a one-byte index in compact addresses.
///
/// Indices are persisted, so this list may only ever be appended to.
pub const WELL_KNOWN_HRPS: &[&str] = &[
    // SLIP-0173
    /* 0 */ "bc", // Bitcoin mainnet
    /* 1 */ "tb", // Bitcoin testnet
    /* 2 */ "bcrt", // Bitcoin regtest
    // Elements
    /* 3 */ "ex", // Liquid
    /* 4 */ "lq", // Liquid, blinded
    /* 5 */ "ert", // Elements regtest
    /* 6 */ "el", // Elements regtest, blinded
    /* 7 */ "tex", // Liquid testnet
    /* 8 */ "tlq", // Liquid testnet, blinded
];

/// Number of well-known HRP slots a compact address can reference.
pub const WELL_KNOWN_HRP_SLOTS: usize = 0x3f;

/// Finds the index of a well-known HRP, ignoring case.
pub fn find_well_known_hrp(hrp: &str) -> Option<usize> {
    WELL_KNOWN_HRPS.iter().position(|known| known.eq_ignore_ascii_case(hrp))
}

/// Looks up a well-known HRP by index.
pub fn well_known_hrp(index: usize) -> Option<&'static str> {
    WELL_KNOWN_HRPS.get(index).copied()
}
