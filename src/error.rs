//! Unified error type for key protection operations.

use core::fmt;

/// Why a protect, unprotect or shadow operation failed.
///
/// The parser distinguishes structurally broken input (`InvalidSexp`) from
/// well-formed input it does not recognize (`UnknownSexp`).  The decoder
/// distinguishes "the bytes do not decrypt into a well-formed value"
/// (`BadPassphrase`) from "the value is shaped but the integrity check
/// mismatches" (`CorruptedProtection`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Input is not a well-formed canonical S-expression.
    InvalidSexp,
    /// Well-formed, but not the kind of object the operation expects.
    UnknownSexp,
    /// The key algorithm is not in the protection table.
    UnsupportedAlgorithm,
    /// The protection mode string is not one we can decrypt.
    UnsupportedProtection,
    /// The shadow protocol token is not one we can interpret.
    UnsupportedProtocol,
    /// The protected payload is damaged or fails the integrity check.
    CorruptedProtection,
    /// Decryption produced garbage; almost certainly a wrong passphrase.
    BadPassphrase,
    /// An argument is outside the accepted domain.
    InvalidValue,
    /// Allocation of a working buffer failed.
    OutOfCore,
    /// The crypto backend rejected an operation; carries the failing primitive.
    CryptoBackend(&'static str),
    /// An internal invariant did not hold.
    Bug,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSexp => write!(f, "invalid S-expression"),
            Self::UnknownSexp => write!(f, "unknown S-expression"),
            Self::UnsupportedAlgorithm => write!(f, "unsupported algorithm"),
            Self::UnsupportedProtection => write!(f, "unsupported protection scheme"),
            Self::UnsupportedProtocol => write!(f, "unsupported shadow protocol"),
            Self::CorruptedProtection => write!(f, "corrupted protection"),
            Self::BadPassphrase => write!(f, "bad passphrase"),
            Self::InvalidValue => write!(f, "invalid value"),
            Self::OutOfCore => write!(f, "out of core"),
            Self::CryptoBackend(what) => write!(f, "crypto backend failure: {}", what),
            Self::Bug => write!(f, "internal error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
