//! Symmetric AES-GCM encryption.
//!
//! Ciphertexts are laid out as `nonce || ciphertext || tag`, with a fresh
//! random 96-bit nonce per message.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use rand::RngCore;

use crate::error::AuthError;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Nonce length prefixed to every ciphertext
pub const NONCE_LEN: usize = 12;

/// Smallest accepted key
pub const MIN_KEY_LEN: usize = 16;

/// Truncates `key` to the largest AES key size it can fill (16, 24 or 32
/// bytes).
///
/// # Errors
///
/// Returns an encryption error if `key` is shorter than 16 bytes.
pub fn parse_key(key: &[u8]) -> Result<&[u8], AuthError> {
    match key.len() {
        n if n < MIN_KEY_LEN => Err(AuthError::encryption("key length less than 16")),
        n if n < 24 => Ok(&key[..16]),
        n if n < 32 => Ok(&key[..24]),
        _ => Ok(&key[..32]),
    }
}

enum Inner {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM cipher keyed with a 128, 192 or 256-bit key.
pub struct Cipher {
    inner: Inner,
}

impl Cipher {
    /// Creates a cipher, truncating the key as [`parse_key`] does.
    ///
    /// # Errors
    ///
    /// Returns an encryption error if `key` is shorter than 16 bytes.
    pub fn new(key: &[u8]) -> Result<Self, AuthError> {
        let key = parse_key(key)?;
        let invalid = |_| AuthError::encryption("invalid key");
        let inner = match key.len() {
            16 => Inner::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            24 => Inner::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?),
            _ => Inner::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
        };
        Ok(Self { inner })
    }

    /// Key size in bits
    pub fn key_bits(&self) -> usize {
        match self.inner {
            Inner::Aes128(_) => 128,
            Inner::Aes192(_) => 192,
            Inner::Aes256(_) => 256,
        }
    }

    /// Encrypts `data` under a random nonce, returned as the output prefix.
    ///
    /// # Errors
    ///
    /// Returns an encryption error if sealing fails.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = match &self.inner {
            Inner::Aes128(c) => seal(c, &nonce, data),
            Inner::Aes192(c) => seal(c, &nonce, data),
            Inner::Aes256(c) => seal(c, &nonce, data),
        }
        .map_err(|e| AuthError::encryption(format!("AES-GCM encrypt failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Decrypts output of [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns an encryption error for short input or a failed tag check.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, AuthError> {
        if data.len() < NONCE_LEN {
            return Err(AuthError::encryption("ciphertext too short"));
        }
        let (nonce, sealed) = data.split_at(NONCE_LEN);

        match &self.inner {
            Inner::Aes128(c) => open(c, nonce, sealed),
            Inner::Aes192(c) => open(c, nonce, sealed),
            Inner::Aes256(c) => open(c, nonce, sealed),
        }
        .map_err(|_| AuthError::encryption("AES-GCM decrypt failed: authentication failed"))
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("key_bits", &self.key_bits())
            .finish_non_exhaustive()
    }
}

fn seal<C>(cipher: &C, nonce: &[u8], data: &[u8]) -> Result<Vec<u8>, aes_gcm::Error>
where
    C: Aead + AeadCore<NonceSize = U12>,
{
    cipher.encrypt(Nonce::<C>::from_slice(nonce), data)
}

fn open<C>(cipher: &C, nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>, aes_gcm::Error>
where
    C: Aead + AeadCore<NonceSize = U12>,
{
    cipher.decrypt(Nonce::<C>::from_slice(nonce), sealed)
}
