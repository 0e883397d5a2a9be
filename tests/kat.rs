//! Known-answer / format-only tests for the wrapped canonical layout.

use keywarden::{canon_len, protect, unprotect, Error};

const KEY: &[u8] = b"(11:private-key(3:rsa(1:n1:x)(1:e1:y)(1:d1:z)(1:p1:a)(1:q1:b)(1:u1:c)))";

/// Deterministic prefix of every protected form of `KEY`, up to the salt.
const HEAD: &[u8] = b"(21:protected-private-key(3:rsa(1:n1:x)(1:e1:y)(9:protected25:openpgp-s2k3-sha1-aes-cbc((4:sha18:";

fn push_atom(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(data);
}

/// Hand-build a protected key with arbitrary protection fields; the
/// surrounding frame matches what `protect` emits for `KEY`.
fn build_protected(
    modestr: &[u8],
    kdf_hash: &[u8],
    salt: &[u8],
    count: &[u8],
    iv: &[u8],
    ct: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"(21:protected-private-key(3:rsa(1:n1:x)(1:e1:y)(9:protected");
    push_atom(&mut out, modestr);
    out.extend_from_slice(b"((");
    push_atom(&mut out, kdf_hash);
    push_atom(&mut out, salt);
    push_atom(&mut out, count);
    out.push(b')');
    push_atom(&mut out, iv);
    out.push(b')');
    push_atom(&mut out, ct);
    out.extend_from_slice(b")))");
    out
}

#[test]
fn wrapped_format_layout() {
    let sealed = protect(KEY, "abc").unwrap();

    // head | salt(8) | "2:96)16:" | iv(16) | ")80:" | ct(80) | ")))"
    assert_eq!(&sealed[..HEAD.len()], HEAD);
    let after_salt = HEAD.len() + 8;
    assert_eq!(&sealed[after_salt..after_salt + 8], b"2:96)16:");
    let after_iv = after_salt + 8 + 16;
    assert_eq!(&sealed[after_iv..after_iv + 4], b")80:");
    assert_eq!(&sealed[after_iv + 4 + 80..], b")))");
    assert_eq!(sealed.len(), HEAD.len() + 8 + 8 + 16 + 4 + 80 + 3);
    assert_eq!(canon_len(&sealed), sealed.len());
}

#[test]
fn hand_built_frame_is_accepted() {
    // A buffer built the same way the encoder builds it must decode; this
    // pins the frame layout independently of `protect`.
    let sealed = protect(KEY, "abc").unwrap();
    let salt = &sealed[HEAD.len()..HEAD.len() + 8];
    let iv_start = HEAD.len() + 8 + 8;
    let iv = &sealed[iv_start..iv_start + 16];
    let ct_start = iv_start + 16 + 4;
    let ct = &sealed[ct_start..ct_start + 80];

    let rebuilt = build_protected(b"openpgp-s2k3-sha1-aes-cbc", b"sha1", salt, b"96", iv, ct);
    assert_eq!(rebuilt, sealed);
    assert_eq!(&unprotect(&rebuilt, "abc").unwrap()[..], KEY);
}

#[test]
fn ciphertext_must_be_block_aligned() {
    let sealed = build_protected(
        b"openpgp-s2k3-sha1-aes-cbc",
        b"sha1",
        &[1u8; 8],
        b"96",
        &[2u8; 16],
        &[3u8; 15],
    );
    assert_eq!(unprotect(&sealed, "abc").err(), Some(Error::CorruptedProtection));
}

#[test]
fn unknown_mode_string_is_unsupported() {
    let sealed = build_protected(
        b"openpgp-s2k5-sha9-des-cbc",
        b"sha1",
        &[1u8; 8],
        b"96",
        &[2u8; 16],
        &[3u8; 16],
    );
    assert_eq!(unprotect(&sealed, "abc").err(), Some(Error::UnsupportedProtection));
}

#[test]
fn unknown_kdf_hash_is_unsupported() {
    let sealed = build_protected(
        b"openpgp-s2k3-sha1-aes-cbc",
        b"sha2",
        &[1u8; 8],
        b"96",
        &[2u8; 16],
        &[3u8; 16],
    );
    assert_eq!(unprotect(&sealed, "abc").err(), Some(Error::UnsupportedProtection));
}

#[test]
fn salt_must_be_eight_bytes() {
    let sealed = build_protected(
        b"openpgp-s2k3-sha1-aes-cbc",
        b"sha1",
        &[1u8; 7],
        b"96",
        &[2u8; 16],
        &[3u8; 16],
    );
    assert_eq!(unprotect(&sealed, "abc").err(), Some(Error::CorruptedProtection));
}

#[test]
fn iv_must_be_one_block() {
    let sealed = build_protected(
        b"openpgp-s2k3-sha1-aes-cbc",
        b"sha1",
        &[1u8; 8],
        b"96",
        &[2u8; 15],
        &[3u8; 16],
    );
    assert_eq!(unprotect(&sealed, "abc").err(), Some(Error::CorruptedProtection));
}

#[test]
fn count_must_be_a_nonzero_decimal() {
    for count in [&b"0"[..], b"aa", b"300"] {
        let sealed = build_protected(
            b"openpgp-s2k3-sha1-aes-cbc",
            b"sha1",
            &[1u8; 8],
            count,
            &[2u8; 16],
            &[3u8; 16],
        );
        assert_eq!(
            unprotect(&sealed, "abc").err(),
            Some(Error::CorruptedProtection),
            "count {:?}",
            count
        );
    }
}

#[test]
fn tampered_public_parameter_breaks_the_mic() {
    // The ciphertext still decrypts, but the reassembled plaintext no
    // longer hashes to the stored MIC.
    let mut sealed = protect(KEY, "abc").unwrap();
    let pos = sealed
        .windows(7)
        .position(|w| w == b"(1:n1:x")
        .unwrap();
    sealed[pos + 6] = b'X';
    assert_eq!(unprotect(&sealed, "abc").err(), Some(Error::CorruptedProtection));
}

#[test]
fn tampered_salt_or_iv_fails_to_open() {
    let sealed = protect(KEY, "abc").unwrap();

    let mut bad_salt = sealed.clone();
    bad_salt[HEAD.len()] ^= 0xFF;
    let err = unprotect(&bad_salt, "abc").err().unwrap();
    assert!(matches!(err, Error::BadPassphrase | Error::CorruptedProtection));

    let mut bad_iv = sealed.clone();
    bad_iv[HEAD.len() + 8 + 8] ^= 0xFF;
    let err = unprotect(&bad_iv, "abc").err().unwrap();
    assert!(matches!(err, Error::BadPassphrase | Error::CorruptedProtection));
}

#[test]
fn protected_element_may_sit_anywhere_in_the_parameter_list() {
    // Decoding scans past leading parameters it does not recognize.
    let sealed = protect(KEY, "abc").unwrap();
    assert!(sealed.windows(12).any(|w| w == b"(9:protected"));
    // The two public parameters precede the protected element.
    let n = sealed.windows(8).position(|w| w == b"(1:n1:x)").unwrap();
    let prot = sealed.windows(12).position(|w| w == b"(9:protected").unwrap();
    assert!(n < prot);
}
