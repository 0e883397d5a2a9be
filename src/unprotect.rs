//! Unprotect: decrypt a protected private key back to plaintext.
//!
//! The decoder never re-serializes the outer frame: the plaintext result
//! is assembled from byte spans of the protected input and of the
//! decrypted parameter list, so the recomputed integrity hash covers the
//! exact bytes the encoder hashed.

extern crate alloc;
use alloc::vec::Vec;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::cipher::{self, BLOCK_LEN, KEY_LEN};
use crate::error::Error;
use crate::mic::{self, MIC_LEN};
use crate::protect::{lookup_algo, PROT_MODESTR};
use crate::s2k::{self, HashAlgo, S2kMode};
use crate::sexp::{self, Reader};

/// Transform a `(protected-private-key ...)` buffer back into a plaintext
/// `(private-key ...)` buffer.
///
/// The returned buffer holds secret key material and scrubs itself on
/// drop.
pub fn unprotect(protectedkey: &[u8], passphrase: &str) -> Result<Zeroizing<Vec<u8>>, Error> {
    let mut r = Reader::new(protectedkey);
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let n = r.next_length()?;
    if r.take(n)? != b"protected-private-key" {
        return Err(Error::UnknownSexp);
    }
    if r.peek() != Some(b'(') {
        return Err(Error::UnknownSexp);
    }
    r.bump();
    let n = r.next_length()?;
    lookup_algo(r.take(n)?).ok_or(Error::UnsupportedAlgorithm)?;

    // Scan the parameter list for the (protected ...) element; everything
    // else is skipped untouched.
    let prot_begin;
    loop {
        if r.peek() != Some(b'(') {
            return Err(Error::InvalidSexp);
        }
        let candidate = r.pos();
        r.bump();
        let n = r.next_length()?;
        if r.take(n)? == b"protected" {
            prot_begin = candidate;
            break;
        }
        r.skip(1)?;
    }

    let n = r.next_length()?;
    if r.take(n)? != PROT_MODESTR {
        return Err(Error::UnsupportedProtection);
    }
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let n = r.next_length()?;
    if r.take(n)? != b"sha1" {
        return Err(Error::UnsupportedProtection);
    }
    let n = r.next_length()?;
    if n != s2k::SALT_LEN {
        return Err(Error::CorruptedProtection);
    }
    let salt: &[u8; s2k::SALT_LEN] = r.take(n)?.try_into().map_err(|_| Error::Bug)?;
    let n = r.next_length().map_err(|_| Error::CorruptedProtection)?;
    let count_bytes = r.take(n)?;
    if r.peek() != Some(b')') {
        return Err(Error::InvalidSexp);
    }
    let count_octet = parse_count_octet(count_bytes)?;
    r.bump();
    let n = r.next_length()?;
    if n != BLOCK_LEN {
        return Err(Error::CorruptedProtection);
    }
    let iv = r.take(n)?;
    if r.peek() != Some(b')') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let n = r.next_length()?;
    let ciphertext = r.take(n)?;

    let cleartext = do_decryption(ciphertext, passphrase, salt, count_octet, iv)?;
    let (plainkey, stored_mic) = merge_lists(protectedkey, prot_begin, &cleartext)?;

    let calculated_mic = mic::calculate_mic(&plainkey)?;
    if !bool::from(stored_mic[..].ct_eq(&calculated_mic[..])) {
        return Err(Error::CorruptedProtection);
    }
    Ok(plainkey)
}

/// The count atom stores the S2K count octet in decimal.
fn parse_count_octet(bytes: &[u8]) -> Result<u8, Error> {
    let mut value: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return Err(Error::CorruptedProtection);
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as u32);
    }
    if value == 0 || value > u8::MAX as u32 {
        return Err(Error::CorruptedProtection);
    }
    Ok(value as u8)
}

/// Derive the key, decrypt, and validate that the result looks like the
/// two-list value the encoder produced.
fn do_decryption(
    ciphertext: &[u8],
    passphrase: &str,
    salt: &[u8; s2k::SALT_LEN],
    count_octet: u8,
    iv: &[u8],
) -> Result<Zeroizing<Vec<u8>>, Error> {
    if ciphertext.len() < 4 || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(Error::CorruptedProtection);
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    s2k::hash_passphrase(
        passphrase.as_bytes(),
        HashAlgo::Sha1,
        S2kMode::IteratedSalted,
        Some(salt),
        count_octet,
        key.as_mut_slice(),
    )?;

    let mut outbuf = Zeroizing::new(Vec::new());
    outbuf
        .try_reserve_exact(ciphertext.len())
        .map_err(|_| Error::OutOfCore)?;
    outbuf.extend_from_slice(ciphertext);
    cipher::decrypt_in_place(&key, iv, &mut outbuf)?;

    // Quick shape check, then a full structural one: the plaintext must be
    // a well-formed value whose canonical length lies within one block of
    // the ciphertext length (the tail is padding).
    if outbuf[0] != b'(' || outbuf[1] != b'(' {
        return Err(Error::BadPassphrase);
    }
    let len = sexp::canon_len(&outbuf);
    if len == 0 || len > outbuf.len() || len < outbuf.len() - BLOCK_LEN {
        return Err(Error::BadPassphrase);
    }
    Ok(outbuf)
}

/// Reassemble a plaintext key: outer frame from the protected input with
/// the wrapper renamed back, parameter list from the decrypted text.
/// Also extracts the stored MIC from the decrypted trailer.
fn merge_lists(
    protectedkey: &[u8],
    replacepos: usize,
    cleartext: &[u8],
) -> Result<(Zeroizing<Vec<u8>>, [u8; MIC_LEN]), Error> {
    // The head copy below assumes the input started with the fixed
    // "(21:protected-private-key" wrapper.
    if replacepos < 26 {
        return Err(Error::Bug);
    }
    let outer_len = sexp::canon_len(protectedkey);
    let clear_len = sexp::canon_len(cleartext);
    if outer_len == 0 || clear_len == 0 {
        return Err(Error::Bug);
    }

    let mut newlist = Zeroizing::new(Vec::new());
    newlist
        .try_reserve(outer_len + clear_len)
        .map_err(|_| Error::OutOfCore)?;

    // Initial segment, with the wrapper renamed back.
    newlist.extend_from_slice(b"(11:private-key");
    newlist.extend_from_slice(&protectedkey[25..replacepos]);

    // Decrypted parameter list: ((p1 v1)(p2 v2)...)
    let mut c = Reader::new(cleartext);
    if c.peek() != Some(b'(') {
        return Err(Error::Bug);
    }
    c.bump();
    if c.peek() != Some(b'(') {
        return Err(Error::Bug);
    }
    c.bump();
    let startpos = c.pos();
    while c.peek() == Some(b'(') {
        c.bump();
        let n = c.next_length()?;
        c.take(n)?;
        let n = c.next_length()?;
        c.take(n)?;
        if c.peek() != Some(b')') {
            return Err(Error::InvalidSexp);
        }
        c.bump();
    }
    let endpos = c.pos();
    if c.peek() != Some(b')') {
        return Err(Error::InvalidSexp);
    }
    c.bump();

    // Trailer: (hash sha1 <20 bytes>)
    if c.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    c.bump();
    let n = c.next_length()?;
    if c.take(n)? != b"hash" {
        return Err(Error::InvalidSexp);
    }
    let n = c.next_length()?;
    if c.take(n)? != b"sha1" {
        return Err(Error::InvalidSexp);
    }
    let n = c.next_length()?;
    if n != MIC_LEN {
        return Err(Error::InvalidSexp);
    }
    let mut stored_mic = [0u8; MIC_LEN];
    stored_mic.copy_from_slice(c.take(n)?);
    if c.peek() != Some(b')') {
        return Err(Error::InvalidSexp);
    }

    newlist.extend_from_slice(&cleartext[startpos..endpos]);

    // Skip the original (protected ...) element and append everything
    // after it, including the closing parens of the outer frame.
    let mut p = Reader::new(protectedkey);
    p.seek(replacepos);
    if p.peek() != Some(b'(') {
        return Err(Error::Bug);
    }
    p.bump();
    p.skip(1)?;
    let tail_start = p.pos();
    p.skip(2)?;
    let tail_end = p.pos();
    newlist.extend_from_slice(&protectedkey[tail_start..tail_end]);

    Ok((newlist, stored_mic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_atom_must_be_a_nonzero_octet() {
        assert_eq!(parse_count_octet(b"96"), Ok(96));
        assert_eq!(parse_count_octet(b"255"), Ok(255));
        assert_eq!(parse_count_octet(b"0"), Err(Error::CorruptedProtection));
        assert_eq!(parse_count_octet(b"256"), Err(Error::CorruptedProtection));
        assert_eq!(parse_count_octet(b"9x"), Err(Error::CorruptedProtection));
    }

    #[test]
    fn wrapper_must_be_protected_private_key() {
        let plain = b"(11:private-key(3:rsa(1:n1:x)(1:e1:y)(1:d1:z)(1:p1:a)(1:q1:b)(1:u1:c)))";
        assert_eq!(unprotect(plain, "abc").err(), Some(Error::UnknownSexp));
        assert_eq!(unprotect(b"x", "abc").err(), Some(Error::InvalidSexp));
    }

    #[test]
    fn missing_protected_list_is_invalid() {
        let buf = b"(21:protected-private-key(3:rsa(1:n1:x)(1:e1:y)))";
        assert_eq!(unprotect(buf, "abc").err(), Some(Error::InvalidSexp));
    }
}
