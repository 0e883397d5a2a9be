//! Message integrity check over a plaintext private key.
//!
//! The MIC is a SHA-1 digest over the *bytes* of the inner list
//! `(ALGO (p1 v1) ... (pN vN))`, both parens included, exactly as they
//! appear in the canonical plaintext.  It is never computed over a
//! reparsed or re-serialized form, so an unprotect that reassembles the
//! original bytes reproduces it exactly.

use sha1::{Digest, Sha1};

use crate::error::Error;
use crate::sexp::Reader;

pub(crate) const MIC_LEN: usize = 20;

/// Digest an already-located inner-list span.
pub(crate) fn mic_over_span(span: &[u8]) -> [u8; MIC_LEN] {
    Sha1::digest(span).into()
}

/// Compute the MIC of a canonical `(private-key (ALGO (p v) ...))` buffer.
pub(crate) fn calculate_mic(plainkey: &[u8]) -> Result<[u8; MIC_LEN], Error> {
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
    r.take(n)?; // algorithm name

    while r.peek() == Some(b'(') {
        r.bump();
        let n = r.next_length()?;
        r.take(n)?;
        let n = r.next_length()?;
        r.take(n)?;
        if r.peek() != Some(b')') {
            return Err(Error::InvalidSexp);
        }
        r.bump();
    }
    if r.peek() != Some(b')') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let hash_end = r.pos();

    Ok(mic_over_span(&plainkey[hash_begin..hash_end]))
}
