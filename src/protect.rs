//! Protect: passphrase-encrypt the secret parameters of a private key.
//!
//! Output format (canonical, one list spliced over the secret parameters):
//!
//!   (protected openpgp-s2k3-sha1-aes-cbc ((sha1 salt count) iv) ciphertext)
//!
//! The encrypted payload is `((<secret parms>)(4:hash4:sha120:<mic>))`
//! followed by one block of random padding; only whole cipher blocks of
//! that are encrypted.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::cipher::{self, BLOCK_LEN, KEY_LEN};
use crate::error::Error;
use crate::mic::{self, MIC_LEN};
use crate::s2k::{self, HashAlgo, S2kMode};
use crate::sexp::Reader;

/// Protection mode string of the wrapped format.
pub(crate) const PROT_MODESTR: &[u8] = b"openpgp-s2k3-sha1-aes-cbc";

/// Fixed S2K count octet written into new protected keys; decodes to
/// 65536 hashed bytes.
const S2K_COUNT_OCTET: u8 = 96;
const S2K_COUNT_ATOM: &[u8] = b"96";

// ---------------------------------------------------------------------------
// Algorithm descriptor table
// ---------------------------------------------------------------------------

/// Static per-algorithm protection descriptor.  `parmlist` holds the
/// single-character parameter names in canonical order; the inclusive
/// index range `prot_from..=prot_to` selects the secret parameters.
pub(crate) struct AlgoInfo {
    pub(crate) algo: &'static [u8],
    pub(crate) parmlist: &'static [u8],
    pub(crate) prot_from: usize,
    pub(crate) prot_to: usize,
}

pub(crate) static PROTECT_INFO: &[AlgoInfo] = &[AlgoInfo {
    algo: b"rsa",
    parmlist: b"nedpqu",
    prot_from: 2,
    prot_to: 5,
}];

pub(crate) fn lookup_algo(name: &[u8]) -> Option<&'static AlgoInfo> {
    PROTECT_INFO.iter().find(|info| info.algo == name)
}

// ---------------------------------------------------------------------------
// Canonical emission helpers
// ---------------------------------------------------------------------------

pub(crate) fn push_decimal(out: &mut Vec<u8>, mut n: usize) {
    let mut digits = [0u8; 20];
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    out.extend_from_slice(&digits[i..]);
}

/// Append `data` as a length-prefixed atom.
pub(crate) fn push_atom(out: &mut Vec<u8>, data: &[u8]) {
    push_decimal(out, data.len());
    out.push(b':');
    out.extend_from_slice(data);
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Transform a plaintext `(private-key ...)` buffer into a
/// `(protected-private-key ...)` buffer under `passphrase`.
///
/// The non-secret parameters are carried over byte-for-byte; the secret
/// range chosen by the algorithm table is replaced by a single
/// `(protected ...)` list.
pub fn protect(plainkey: &[u8], passphrase: &str) -> Result<Vec<u8>, Error> {
    let mut r = Reader::new(plainkey);
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let n = r.next_length()?;
    if r.take(n)? != b"private-key" {
        return Err(Error::UnknownSexp);
    }
    if r.peek() != Some(b'(') {
        return Err(Error::UnknownSexp);
    }
    let hash_begin = r.pos();
    r.bump();
    let n = r.next_length()?;
    let algo = lookup_algo(r.take(n)?).ok_or(Error::UnsupportedAlgorithm)?;

    // Walk the parameter list in table order, recording the byte span of
    // the secret range.
    let mut prot_begin = 0;
    let mut prot_end = 0;
    for (i, &parm) in algo.parmlist.iter().enumerate() {
        if i == algo.prot_from {
            prot_begin = r.pos();
        }
        if r.peek() != Some(b'(') {
            return Err(Error::InvalidSexp);
        }
        r.bump();
        let n = r.next_length()?;
        let name = r.take(n)?;
        if n != 1 || name[0] != parm {
            return Err(Error::InvalidSexp);
        }
        let n = r.next_length()?;
        r.take(n)?;
        if r.peek() != Some(b')') {
            return Err(Error::InvalidSexp);
        }
        if i == algo.prot_to {
            prot_end = r.pos();
        }
        r.bump();
    }
    if r.peek() != Some(b')') {
        return Err(Error::InvalidSexp);
    }
    let hash_end = r.pos();
    r.bump();
    r.skip(1)?;
    let real_end = r.pos() - 1;

    let mic = mic::mic_over_span(&plainkey[hash_begin..=hash_end]);
    let protected = do_encryption(&plainkey[prot_begin..=prot_end], passphrase, &mic)?;

    // Splice: renamed wrapper, unchanged head, protected list, unchanged
    // tail.  The wrapper rename inserts exactly 10 bytes ("protected-").
    let mut result = Vec::new();
    result
        .try_reserve_exact(10 + prot_begin + protected.len() + (real_end - prot_end))
        .map_err(|_| Error::OutOfCore)?;
    result.extend_from_slice(b"(21:protected-private-key");
    result.extend_from_slice(&plainkey[hash_begin..prot_begin]);
    result.extend_from_slice(&protected);
    result.extend_from_slice(&plainkey[prot_end + 1..=real_end]);
    Ok(result)
}

/// Encrypt the secret parameter span and emit the `(protected ...)` list.
fn do_encryption(region: &[u8], passphrase: &str, mic: &[u8; MIC_LEN]) -> Result<Vec<u8>, Error> {
    // ((<region>)(4:hash4:sha120:<mic>)) plus one block of padding; the
    // encrypted length rounds down to whole blocks.
    let outlen = 2 + region.len() + 17 + MIC_LEN + 2 + BLOCK_LEN;
    let enclen = outlen / BLOCK_LEN * BLOCK_LEN;

    // One contiguous random block: IV, pad tail, S2K salt.
    let mut rnd = [0u8; 2 * BLOCK_LEN + s2k::SALT_LEN];
    cipher::random_bytes(&mut rnd)?;
    let (iv, rest) = rnd.split_at(BLOCK_LEN);
    let (pad, salt_bytes) = rest.split_at(BLOCK_LEN);
    let salt: &[u8; s2k::SALT_LEN] = salt_bytes.try_into().map_err(|_| Error::Bug)?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    s2k::hash_passphrase(
        passphrase.as_bytes(),
        HashAlgo::Sha1,
        S2kMode::IteratedSalted,
        Some(salt),
        S2K_COUNT_OCTET,
        key.as_mut_slice(),
    )?;

    let mut workspace = Zeroizing::new(Vec::new());
    workspace
        .try_reserve_exact(outlen)
        .map_err(|_| Error::OutOfCore)?;
    workspace.extend_from_slice(b"((");
    workspace.extend_from_slice(region);
    workspace.extend_from_slice(b")(4:hash4:sha120:");
    workspace.extend_from_slice(mic);
    workspace.extend_from_slice(b"))");
    workspace.extend_from_slice(pad);
    debug_assert_eq!(workspace.len(), outlen);

    cipher::encrypt_in_place(&key, iv, &mut workspace, enclen)?;

    let mut out = Vec::new();
    out.try_reserve(64 + PROT_MODESTR.len() + s2k::SALT_LEN + BLOCK_LEN + enclen)
        .map_err(|_| Error::OutOfCore)?;
    out.push(b'(');
    push_atom(&mut out, b"protected");
    push_atom(&mut out, PROT_MODESTR);
    out.extend_from_slice(b"((");
    push_atom(&mut out, b"sha1");
    push_atom(&mut out, salt);
    push_atom(&mut out, S2K_COUNT_ATOM);
    out.push(b')');
    push_atom(&mut out, iv);
    out.push(b')');
    push_atom(&mut out, &workspace[..enclen]);
    out.push(b')');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] =
        b"(11:private-key(3:rsa(1:n1:x)(1:e1:y)(1:d1:z)(1:p1:a)(1:q1:b)(1:u1:c)))";

    #[test]
    fn table_knows_rsa_only() {
        assert!(lookup_algo(b"rsa").is_some());
        assert!(lookup_algo(b"dsa").is_none());
        assert!(lookup_algo(b"").is_none());
    }

    #[test]
    fn rsa_secret_range_is_d_through_u() {
        let info = lookup_algo(b"rsa").unwrap();
        assert_eq!(info.parmlist, b"nedpqu");
        assert_eq!(info.prot_from, 2);
        assert_eq!(info.prot_to, 5);
    }

    #[test]
    fn push_atom_writes_length_prefix() {
        let mut out = Vec::new();
        push_atom(&mut out, b"protected");
        assert_eq!(out, b"9:protected");
        out.clear();
        push_atom(&mut out, &[0u8; 16]);
        assert_eq!(&out[..3], b"16:");
        assert_eq!(out.len(), 19);
    }

    #[test]
    fn output_keeps_public_parameters_in_place() {
        let out = protect(KEY, "abc").unwrap();
        let head = b"(21:protected-private-key(3:rsa(1:n1:x)(1:e1:y)(9:protected25:openpgp-s2k3-sha1-aes-cbc((4:sha18:";
        assert_eq!(&out[..head.len()], &head[..]);
        assert_eq!(&out[out.len() - 2..], b"))");
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let dsa = b"(11:private-key(3:dsa(1:p1:a)(1:q1:b)(1:g1:c)(1:y1:d)(1:x1:e)))";
        assert_eq!(protect(dsa, "abc"), Err(Error::UnsupportedAlgorithm));
    }

    #[test]
    fn wrong_wrapper_is_unknown() {
        let pk = b"(10:public-key(3:rsa(1:n1:x)(1:e1:y)))";
        assert_eq!(protect(pk, "abc"), Err(Error::UnknownSexp));
    }

    #[test]
    fn out_of_order_parameters_are_rejected() {
        let swapped =
            b"(11:private-key(3:rsa(1:e1:y)(1:n1:x)(1:d1:z)(1:p1:a)(1:q1:b)(1:u1:c)))";
        assert_eq!(protect(swapped, "abc"), Err(Error::InvalidSexp));
    }

    #[test]
    fn truncated_input_is_invalid() {
        assert_eq!(protect(&KEY[..30], "abc"), Err(Error::InvalidSexp));
    }
}
