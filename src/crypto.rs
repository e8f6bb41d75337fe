//! Cryptographic functions for pack entries and contents files
//!
//! Every encrypted payload uses AES-256 in CFB mode with 8-bit feedback and no
//! padding. The key is the raw ASCII of a 32-character string and the IV is the
//! first 16 bytes of that same string, so ciphertext is always exactly as long
//! as the plaintext.

use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::error::{Error, Result};

type Aes256Cfb8Enc = cfb8::Encryptor<aes::Aes256>;
type Aes256Cfb8Dec = cfb8::Decryptor<aes::Aes256>;

/// Length of master keys and entry keys, in bytes
pub const KEY_LENGTH: usize = 32;

/// Length of the IV taken from the front of the key
pub const IV_LENGTH: usize = 16;

/// Generate a random 32-character alphanumeric key
pub fn generate_key() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Validate a master key supplied by the user
pub fn check_key(key: &str) -> Result<()> {
    if key.len() != KEY_LENGTH {
        return Err(Error::InvalidArgument(format!(
            "key length must be {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }
    if !key.is_ascii() {
        return Err(Error::InvalidArgument(
            "key must only contain ASCII characters".to_string(),
        ));
    }
    Ok(())
}

fn split_key(key: &str) -> Result<(&[u8], &[u8])> {
    let bytes = key.as_bytes();
    if bytes.len() != KEY_LENGTH {
        return Err(Error::Cipher(format!(
            "key must be {} bytes, got {}",
            KEY_LENGTH,
            bytes.len()
        )));
    }
    Ok((bytes, &bytes[..IV_LENGTH]))
}

/// Encrypt data using AES-256-CFB8 with the given 32-character key
pub fn encrypt_cfb8(data: &[u8], key: &str) -> Result<Vec<u8>> {
    let (key, iv) = split_key(key)?;
    let cipher = Aes256Cfb8Enc::new_from_slices(key, iv)
        .map_err(|e| Error::Cipher(format!("AES init failed: {:?}", e)))?;

    let mut buffer = data.to_vec();
    cipher.encrypt(&mut buffer);
    Ok(buffer)
}

/// Decrypt data using AES-256-CFB8 with the given 32-character key
pub fn decrypt_cfb8(data: &[u8], key: &str) -> Result<Vec<u8>> {
    let (key, iv) = split_key(key)?;
    let cipher = Aes256Cfb8Dec::new_from_slices(key, iv)
        .map_err(|e| Error::Cipher(format!("AES init failed: {:?}", e)))?;

    let mut buffer = data.to_vec();
    cipher.decrypt(&mut buffer);
    Ok(buffer)
}
