//! # Keywarden
//!
//! Passphrase protection and smart-card shadowing for canonical
//! private-key objects.
//!
//! Keys live in the canonical form of a nested-list language
//! (length-prefixed atoms, binary-clean).  This crate transforms such
//! buffers between three shapes: a plaintext `private-key`, a
//! passphrase-encrypted `protected-private-key`, and a
//! `shadowed-private-key` whose secret is held elsewhere.
//!
//! ## Quick Start
//!
//! ```rust
//! use keywarden::{classify, protect, unprotect, KeyKind};
//!
//! let key: &[u8] =
//!     b"(11:private-key(3:rsa(1:n1:x)(1:e1:y)(1:d1:z)(1:p1:a)(1:q1:b)(1:u1:c)))";
//!
//! let sealed = protect(key, "correct horse").unwrap();
//! assert_eq!(classify(&sealed), KeyKind::Protected);
//!
//! let opened = unprotect(&sealed, "correct horse").unwrap();
//! assert_eq!(&opened[..], key);
//! ```
//!
//! ## Security Properties
//!
//! - **Passphrase KDF**: OpenPGP S2K mode 3 (iterated + salted SHA-1)
//! - **Cipher**: AES-128-CBC, format-fixed
//! - **Integrity**: SHA-1 MIC over the exact plaintext bytes, compared in
//!   constant time
//! - **Scrubbing**: derived keys, decrypted buffers and returned plaintext
//!   zeroize on drop
//!
//! ## What's NOT Provided
//!
//! - Key generation
//! - Public-key operations (sign/verify/decrypt)
//! - Key storage or the request/response surface of an agent

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

// ---------------------------------------------------------------------------
// Internal modules
// ---------------------------------------------------------------------------

mod cipher;
mod error;
mod mic;
mod protect;
mod s2k;
mod sexp;
mod shadow;
mod unprotect;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

pub use error::Error;
pub use protect::protect;
pub use s2k::{hash_passphrase, HashAlgo, S2kMode, SALT_LEN};
pub use sexp::canon_len;
pub use shadow::{classify, shadow_info, shadow_key, KeyKind};
pub use unprotect::unprotect;

// Re-exported so callers can name the scrubbing buffer type `unprotect`
// returns without depending on zeroize themselves.
pub use zeroize::Zeroizing;
