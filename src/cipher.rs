//! Raw AES-128-CBC block transforms and randomness.
//!
//! The protected-key format carries no padding marker: the encoder feeds
//! the cipher a whole number of blocks and the decoder hands back exactly
//! the same count, so both paths run CBC with no padding scheme.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use getrandom::getrandom;

use crate::error::Error;

/// AES block length; also the IV length of the wrapped format.
pub(crate) const BLOCK_LEN: usize = 16;

/// AES-128 key length the KDF must fill.
pub(crate) const KEY_LEN: usize = 16;

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

/// Fill `buf` with random bytes. Used for the IV / pad / salt block.
pub(crate) fn random_bytes(buf: &mut [u8]) -> Result<(), Error> {
    getrandom(buf).map_err(|_| Error::CryptoBackend("rng"))
}

/// Encrypt the first `len` bytes of `buf` in place; `len` must be a whole
/// number of blocks.
pub(crate) fn encrypt_in_place(
    key: &[u8; KEY_LEN],
    iv: &[u8],
    buf: &mut [u8],
    len: usize,
) -> Result<(), Error> {
    let enc =
        Encryptor::new_from_slices(key, iv).map_err(|_| Error::CryptoBackend("aes-cbc setup"))?;
    enc.encrypt_padded_mut::<NoPadding>(&mut buf[..len], len)
        .map_err(|_| Error::CryptoBackend("aes-cbc encrypt"))?;
    Ok(())
}

/// Decrypt all of `buf` in place; the length must be a whole number of
/// blocks (the decoder validates this before calling).
pub(crate) fn decrypt_in_place(
    key: &[u8; KEY_LEN],
    iv: &[u8],
    buf: &mut [u8],
) -> Result<(), Error> {
    let dec =
        Decryptor::new_from_slices(key, iv).map_err(|_| Error::CryptoBackend("aes-cbc setup"))?;
    dec.decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| Error::CryptoBackend("aes-cbc decrypt"))?;
    Ok(())
}
