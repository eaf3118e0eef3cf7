//! Watermark keys and authenticated encryption
//!
//! A watermark is a user-supplied protective text plus a 16-byte salt. Its
//! PBKDF2-HMAC-SHA256 key encrypts the AUTHOR channel as a Fernet token:
//!
//! ```text
//! 0x80 | timestamp (u64 BE) | IV (16) | AES-128-CBC ciphertext | HMAC-SHA256 (32)
//! ```
//!
//! encoded with the URL-safe base64 alphabet.

use std::io::{Read, Write};

use aes::Aes128;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CassetteError, Result};

pub const SALT_LEN: usize = 16;
pub const PBKDF2_ITERATIONS: u32 = 480_000;

const TOKEN_VERSION: u8 = 0x80;
const IV_LEN: usize = 16;
const MAC_LEN: usize = 32;
const HEADER_LEN: usize = 1 + 8 + IV_LEN;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Protective text and the salt its key is derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    content: String,
    salt: [u8; SALT_LEN],
}

impl Watermark {
    /// Create a watermark with a fresh random salt.
    pub fn new(content: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            content: normalize_newlines(content),
            salt,
        }
    }

    /// Create a watermark with a known salt, which must be 16 bytes long.
    pub fn with_salt(content: &str, salt: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_LEN] = salt
            .try_into()
            .map_err(|_| CassetteError::InvalidSalt { len: salt.len() })?;
        Ok(Self {
            content: normalize_newlines(content),
            salt,
        })
    }

    /// Rebuild from the document's `WATERMARK` lines and base64 `SALT`.
    pub fn from_document(lines: &[String], salt_base64: &str) -> Result<Self> {
        let salt = STANDARD.decode(salt_base64.trim())?;
        Self::with_salt(&lines.join("\n"), &salt)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn salt_base64(&self) -> String {
        STANDARD.encode(self.salt)
    }

    /// Content split into the document's `WATERMARK` lines.
    pub fn lines(&self) -> Vec<String> {
        self.content.split('\n').map(str::to_string).collect()
    }

    /// Derive the 32-byte key.
    pub fn derive_key(&self) -> WatermarkKey {
        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.content.as_bytes(),
            &self.salt,
            PBKDF2_ITERATIONS,
            &mut key,
        );
        WatermarkKey(key)
    }
}

fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Derived key: the first half signs, the second half encrypts.
#[derive(Clone, PartialEq, Eq)]
pub struct WatermarkKey([u8; 32]);

impl std::fmt::Debug for WatermarkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WatermarkKey(..)")
    }
}

impl WatermarkKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn signing_key(&self) -> &[u8] {
        &self.0[..16]
    }

    fn encryption_key(&self) -> &[u8] {
        &self.0[16..]
    }

    fn mac(&self) -> Result<HmacSha256> {
        <HmacSha256 as Mac>::new_from_slice(self.signing_key()).map_err(|e| {
            CassetteError::Decryption {
                reason: e.to_string(),
            }
        })
    }

    /// Encrypt into a token stamped with the current time.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        self.encrypt_with(plaintext, timestamp, iv)
    }

    fn encrypt_with(&self, plaintext: &[u8], timestamp: u64, iv: [u8; IV_LEN]) -> Result<String> {
        let cipher = Aes128CbcEnc::new_from_slices(self.encryption_key(), &iv).map_err(|e| {
            CassetteError::Decryption {
                reason: e.to_string(),
            }
        })?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + MAC_LEN);
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(&iv);
        token.extend_from_slice(&ciphertext);

        let mut mac = self.mac()?;
        mac.update(&token);
        token.extend_from_slice(&mac.finalize().into_bytes());

        Ok(URL_SAFE.encode(token))
    }

    /// Verify and decrypt a token.
    pub fn decrypt(&self, token: &[u8]) -> Result<Vec<u8>> {
        let token = std::str::from_utf8(token).map_err(|_| CassetteError::Decryption {
            reason: "token is not ASCII".to_string(),
        })?;
        let data = URL_SAFE.decode(token.trim())?;

        if data.len() < HEADER_LEN + MAC_LEN || data[0] != TOKEN_VERSION {
            return Err(CassetteError::Decryption {
                reason: "invalid token".to_string(),
            });
        }

        let (signed, tag) = data.split_at(data.len() - MAC_LEN);
        let mut mac = self.mac()?;
        mac.update(signed);
        mac.verify_slice(tag).map_err(|_| CassetteError::Decryption {
            reason: "signature mismatch, wrong watermark?".to_string(),
        })?;

        let iv = &signed[9..HEADER_LEN];
        let ciphertext = &signed[HEADER_LEN..];
        let cipher = Aes128CbcDec::new_from_slices(self.encryption_key(), iv).map_err(|e| {
            CassetteError::Decryption {
                reason: e.to_string(),
            }
        })?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CassetteError::Decryption {
                reason: "invalid padding".to_string(),
            })
    }
}

/// zlib at the best compression level.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CassetteError::MalformedDocument {
            reason: format!("invalid zlib stream: {}", e),
        })?;
    Ok(out)
}
