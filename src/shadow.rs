//! Shadowed keys: a public key annotated with an opaque locator for a
//! secret held elsewhere (typically a smart card), plus the key-type
//! classifier.
//!
//! Shadowed format:
//!
//!   (shadowed-private-key (ALGO (p1 v1) ... (shadowed t1-v1 <locator>)))

extern crate alloc;
use alloc::vec::Vec;

use crate::error::Error;
use crate::sexp::{canon_len, Reader};

/// Shadow protocol token understood by this implementation.
const SHADOW_PROTOCOL: &[u8] = b"t1-v1";

/// What kind of key object a canonical buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Not a recognized key wrapper.
    Unknown,
    /// A plaintext `private-key`.
    Plain,
    /// A passphrase-protected `protected-private-key`.
    Protected,
    /// A `shadowed-private-key` whose secret lives elsewhere.
    Shadowed,
}

impl KeyKind {
    /// True for every variant that stands in for a private key.
    pub fn is_private(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// True when using the key requires a passphrase first.
    pub fn needs_passphrase(self) -> bool {
        matches!(self, Self::Protected)
    }
}

/// Rewrite a `(public-key ...)` buffer into a `(shadowed-private-key ...)`
/// buffer embedding `shadow_info`, itself a canonical value.
pub fn shadow_key(pubkey: &[u8], shadow_info: &[u8]) -> Result<Vec<u8>, Error> {
    let pubkey_len = canon_len(pubkey);
    let info_len = canon_len(shadow_info);
    if pubkey_len == 0 || info_len == 0 {
        return Err(Error::InvalidValue);
    }

    let mut r = Reader::new(pubkey);
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let n = r.next_length()?;
    if r.take(n)? != b"public-key" {
        return Err(Error::UnknownSexp);
    }
    if r.peek() != Some(b'(') {
        return Err(Error::UnknownSexp);
    }
    r.bump();
    let n = r.next_length()?;
    r.take(n)?; // algorithm name

    // Walk the (name value) parameter lists; the shadowed element is
    // inserted right before the algorithm list closes.
    loop {
        match r.peek() {
            Some(b')') => break,
            Some(b'(') => {
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
            _ => return Err(Error::InvalidSexp),
        }
    }
    let point = r.pos();

    // The wrapper grows by 10 bytes ("shadowed-..." over "public-key")
    // plus the inserted shadowed list.
    let mut out = Vec::new();
    out.try_reserve_exact(29 + pubkey_len + info_len)
        .map_err(|_| Error::OutOfCore)?;
    out.extend_from_slice(b"(20:shadowed-private-key");
    out.extend_from_slice(&pubkey[14..point]);
    out.extend_from_slice(b"(8:shadowed5:t1-v1");
    out.extend_from_slice(&shadow_info[..info_len]);
    out.push(b')');
    out.extend_from_slice(&pubkey[point..pubkey_len]);
    Ok(out)
}

/// Return the borrowed locator value of a `(shadowed-private-key ...)`
/// buffer, i.e. the bytes originally passed as `shadow_info`.
pub fn shadow_info(shadowkey: &[u8]) -> Result<&[u8], Error> {
    let mut r = Reader::new(shadowkey);
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    r.bump();
    let n = r.next_length()?;
    if r.take(n)? != b"shadowed-private-key" {
        return Err(Error::UnknownSexp);
    }
    if r.peek() != Some(b'(') {
        return Err(Error::UnknownSexp);
    }
    r.bump();
    let n = r.next_length()?;
    r.take(n)?; // algorithm name

    loop {
        match r.peek() {
            // A shadowed key without a shadowed element is not ours.
            Some(b')') => return Err(Error::UnknownSexp),
            Some(b'(') => {
                r.bump();
                let n = r.next_length()?;
                if r.take(n)? == b"shadowed" {
                    break;
                }
                r.skip(1)?;
            }
            _ => return Err(Error::InvalidSexp),
        }
    }

    let n = r.next_length()?;
    if r.take(n)? != SHADOW_PROTOCOL {
        return Err(Error::UnsupportedProtocol);
    }
    if r.peek() != Some(b'(') {
        return Err(Error::InvalidSexp);
    }
    let start = r.pos();
    let len = canon_len(&shadowkey[start..]);
    if len == 0 {
        return Err(Error::InvalidSexp);
    }
    Ok(&shadowkey[start..start + len])
}

/// Report which key wrapper a buffer carries.  Never allocates and never
/// fails; anything unrecognizable is `Unknown`.
pub fn classify(buf: &[u8]) -> KeyKind {
    let mut r = Reader::new(buf);
    if r.peek() != Some(b'(') {
        return KeyKind::Unknown;
    }
    r.bump();
    let Ok(n) = r.next_length() else {
        return KeyKind::Unknown;
    };
    let Ok(name) = r.take(n) else {
        return KeyKind::Unknown;
    };
    match name {
        b"protected-private-key" => KeyKind::Protected,
        b"shadowed-private-key" => KeyKind::Shadowed,
        b"private-key" => KeyKind::Plain,
        _ => KeyKind::Unknown,
    }
}
