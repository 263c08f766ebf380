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

//! # Rust Compact Address Library
//!
//! Codecs for Bitcoin and Elements address text (Base58Check, bech32,
//! bech32m, blech32 and blech32m) and a compact tagged binary form able to
//! store any of them.
//!
//! ```
//! use compact_address::{Address, CompactAddress};
//!
//! let compact: CompactAddress = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".parse().unwrap();
//! assert_eq!(compact.as_bytes().len(), 22);
//!
//! let address: Address = compact.unpack().unwrap();
//! assert_eq!(address.hrp(), Some("bc"));
//! assert_eq!(address.version(), 0);
//! assert_eq!(address.to_string(), "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
//! ```
//!

// Coding conventions
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(missing_docs)]

#[cfg(feature = "serde")]
extern crate actual_serde as serde;

mod error;
pub mod address;
pub mod base32;
pub mod base58;
pub mod variant;

// export everything at the top level so it can be used as `compact_address::Address` etc.
pub use crate::address::{Address, AddressError, CompactAddress, LegacyAddress, SegwitAddress};
pub use crate::variant::{Family, FamilyParams, Variant};
