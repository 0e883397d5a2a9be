//! OpenPGP string-to-key derivation (S2K, RFC 4880 §3.7).
//!
//! The protected-key format only ever emits mode 3 (iterated + salted,
//! SHA-1, count octet 96), but modes 0 and 1 stay implementable for
//! callers that unwrap foreign material.
//!
//! Key material longer than one digest is produced by re-running the hash
//! with `pass` zero bytes preloaded into the context, one more per pass.

use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::Error;

/// Salt length all salted modes require.
pub const SALT_LEN: usize = 8;

/// S2K variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S2kMode {
    /// Mode 0: hash the passphrase alone.
    Simple,
    /// Mode 1: one pass over salt then passphrase.
    Salted,
    /// Mode 3: iterate over salt and passphrase until the decoded count
    /// of bytes has been fed.
    IteratedSalted,
}

/// Hash the derivation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgo {
    Sha1,
    Sha256,
}

impl HashAlgo {
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

/// Decode an S2K count octet into the number of bytes to hash.
fn decode_count(octet: u8) -> u64 {
    (16u64 + (octet as u64 & 15)) << ((octet >> 4) + 6)
}

/// Derive `key.len()` bytes of key material from a passphrase.
///
/// `salt` is required for the salted modes; `count_octet` is only
/// meaningful in mode 3.  The derivation is a pure function of its
/// inputs.
pub fn hash_passphrase(
    passphrase: &[u8],
    hash: HashAlgo,
    mode: S2kMode,
    salt: Option<&[u8; SALT_LEN]>,
    count_octet: u8,
    key: &mut [u8],
) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidValue);
    }
    match hash {
        HashAlgo::Sha1 => derive::<Sha1>(passphrase, mode, salt, count_octet, key),
        HashAlgo::Sha256 => derive::<Sha256>(passphrase, mode, salt, count_octet, key),
    }
}

fn derive<D: Digest>(
    passphrase: &[u8],
    mode: S2kMode,
    salt: Option<&[u8; SALT_LEN]>,
    count_octet: u8,
    key: &mut [u8],
) -> Result<(), Error> {
    let mut used = 0;
    let mut pass = 0usize;
    while used < key.len() {
        let mut md = D::new();
        // Later passes preload the context with `pass` zero bytes so each
        // pass yields an independent digest.
        for _ in 0..pass {
            md.update([0u8]);
        }

        match mode {
            S2kMode::Simple => md.update(passphrase),
            S2kMode::Salted | S2kMode::IteratedSalted => {
                let salt = salt.ok_or(Error::InvalidValue)?;
                let len2 = passphrase.len() as u64 + SALT_LEN as u64;
                let mut count = len2;
                if mode == S2kMode::IteratedSalted {
                    count = decode_count(count_octet);
                    if count < len2 {
                        count = len2;
                    }
                }
                while count > len2 {
                    md.update(salt);
                    md.update(passphrase);
                    count -= len2;
                }
                // The final partial round must not restart the salt.
                if count < SALT_LEN as u64 {
                    md.update(&salt[..count as usize]);
                } else {
                    md.update(salt);
                    count -= SALT_LEN as u64;
                    md.update(&passphrase[..count as usize]);
                }
            }
        }

        let digest = md.finalize();
        let n = digest.len().min(key.len() - used);
        key[used..used + n].copy_from_slice(&digest[..n]);
        used += n;
        pass += 1;
    }
    Ok(())
}
