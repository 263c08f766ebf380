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

//! Error handling tools shared by the codec modules.

/// Impls std::error::Error for an error type that has no source.
macro_rules! impl_std_error {
    ($type:ty) => {
        impl std::error::Error for $type {}
    };
}
pub(crate) use impl_std_error;

/// Formats an error message that has an underlying source.
///
/// Only the message is written; the source is left to
/// `std::error::Error::source`.
macro_rules! write_err {
    ($writer:expr, $string:literal $(, $args:expr)*; $source:expr) => {
        {
            let _ = &$source;   // Prevents clippy warnings.
            write!($writer, $string $(, $args)*)
        }
    }
}
pub(crate) use write_err;
