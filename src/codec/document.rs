//! `.cassette` container documents

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::author::{AuthorData, Custom1Data};
use super::watermark::{deflate, inflate, Watermark, WatermarkKey};
use crate::error::{CassetteError, Result};
use crate::topology::PhoneModel;

pub const DOCUMENT_VERSION: u32 = 1;

/// On-disk JSON container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CassetteDocument {
    #[serde(rename = "VERSION")]
    pub version: u32,
    #[serde(rename = "PHONE_MODEL")]
    pub phone_model: PhoneModel,
    #[serde(rename = "AUTHOR")]
    pub author: Vec<String>,
    #[serde(rename = "CUSTOM1")]
    pub custom1: Vec<String>,
    #[serde(rename = "WATERMARK", default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Vec<String>>,
    #[serde(rename = "SALT", default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// Contents of a decoded document.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCassette {
    pub phone_model: PhoneModel,
    /// Plaintext matrix, decrypted when the document was watermarked.
    pub author: AuthorData,
    pub custom1: Custom1Data,
    pub watermark: Option<Watermark>,
}

impl CassetteDocument {
    /// Build a document, encrypting AUTHOR when a watermark is given.
    pub fn encode(
        author: &AuthorData,
        custom1: &Custom1Data,
        phone_model: PhoneModel,
        watermark: Option<&Watermark>,
    ) -> Result<Self> {
        let (author_lines, watermark_lines, salt) = match watermark {
            Some(watermark) => (
                encrypt_author(author, &watermark.derive_key())?.to_lines(),
                Some(watermark.lines()),
                Some(watermark.salt_base64()),
            ),
            None => (author.to_lines(), None, None),
        };

        Ok(Self {
            version: DOCUMENT_VERSION,
            phone_model,
            author: author_lines,
            custom1: custom1.to_entries(),
            watermark: watermark_lines,
            salt,
        })
    }

    /// Parse the channels back, decrypting AUTHOR if the document is
    /// watermarked.
    pub fn decode(&self) -> Result<DecodedCassette> {
        let author = AuthorData::from_lines(&self.author)?;
        let custom1 = Custom1Data::from_entries(&self.custom1)?;

        let watermark = match self.watermark.as_deref() {
            Some(lines) if !lines.is_empty() => {
                let salt = self.salt.as_deref().ok_or_else(|| CassetteError::MalformedDocument {
                    reason: "WATERMARK without SALT".to_string(),
                })?;
                Some(Watermark::from_document(lines, salt)?)
            }
            _ => None,
        };

        let author = match &watermark {
            Some(watermark) => decrypt_author(&author, &watermark.derive_key())?,
            None => author,
        };

        Ok(DecodedCassette {
            phone_model: self.phone_model,
            author,
            custom1,
            watermark,
        })
    }

    pub fn is_watermarked(&self) -> bool {
        self.watermark.as_ref().map_or(false, |lines| !lines.is_empty())
    }

    /// JSON with 4-space indentation and CRLF line endings.
    pub fn to_json_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        let json = String::from_utf8(buf).map_err(|e| CassetteError::MalformedDocument {
            reason: e.to_string(),
        })?;
        Ok(json.replace('\n', "\r\n"))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CassetteError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

/// Encrypt AUTHOR into a matrix of the same width: cell 0 holds the length
/// of `zlib(token(zlib(text)))`, the following cells hold its bytes.
pub fn encrypt_author(author: &AuthorData, key: &WatermarkKey) -> Result<AuthorData> {
    let text = author.to_lines().join("\r\n");
    let token = key.encrypt(&deflate(text.as_bytes())?)?;
    let packed = deflate(token.as_bytes())?;

    let columns = author.columns().max(1);
    let rows = (packed.len() + 1).div_ceil(columns);
    let mut matrix = AuthorData::zeroed(rows, columns);
    matrix.set(0, 0, packed.len() as u32);
    for (i, byte) in packed.iter().enumerate() {
        let cell = i + 1;
        matrix.set(cell / columns, cell % columns, u32::from(*byte));
    }
    Ok(matrix)
}

/// Reverse [`encrypt_author`].
pub fn decrypt_author(encrypted: &AuthorData, key: &WatermarkKey) -> Result<AuthorData> {
    let mut cells = encrypted.cells();
    let len = cells.next().ok_or_else(|| CassetteError::Decryption {
        reason: "encrypted AUTHOR is empty".to_string(),
    })? as usize;

    let packed = cells
        .take(len)
        .map(|cell| {
            u8::try_from(cell).map_err(|_| CassetteError::Decryption {
                reason: format!("encrypted AUTHOR cell {} is not a byte", cell),
            })
        })
        .collect::<Result<Vec<u8>>>()?;
    if packed.len() != len {
        return Err(CassetteError::Decryption {
            reason: format!("encrypted AUTHOR is truncated ({} of {} bytes)", packed.len(), len),
        });
    }

    let token = inflate(&packed)?;
    let text = inflate(&key.decrypt(&token)?)?;
    let text = String::from_utf8(text).map_err(|e| CassetteError::Decryption {
        reason: e.to_string(),
    })?;
    let lines: Vec<&str> = text.lines().collect();
    AuthorData::from_lines(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (AuthorData, Custom1Data) {
        let author = AuthorData::from_lines(&["0,4095,0,", "2048,0,1,", "0,0,0,"]).unwrap();
        let mut custom1 = Custom1Data::new();
        custom1.push(0, 1);
        (author, custom1)
    }

    #[test]
    fn test_plain_document_json() {
        let (author, custom1) = sample();
        let document = CassetteDocument::encode(&author, &custom1, PhoneModel::Phone2A, None).unwrap();
        let json = document.to_json_string().unwrap();

        assert!(json.starts_with("{\r\n    \"VERSION\": 1,\r\n    \"PHONE_MODEL\": \"PHONE2A\""));
        assert!(!json.contains("WATERMARK"));
        assert!(!json.replace("\r\n", "").contains('\n'));

        let parsed = CassetteDocument::from_json_str(&json).unwrap();
        assert_eq!(parsed, document);
        let decoded = parsed.decode().unwrap();
        assert_eq!(decoded.author, author);
        assert_eq!(decoded.custom1, custom1);
        assert!(decoded.watermark.is_none());
    }

    #[test]
    fn test_author_matrix_encryption() {
        let (author, _) = sample();
        let key = WatermarkKey::from_bytes([5u8; 32]);
        let encrypted = encrypt_author(&author, &key).unwrap();

        assert_eq!(encrypted.columns(), 3);
        let len = encrypted.get(0, 0).unwrap() as usize;
        assert_eq!(encrypted.row_count(), (len + 1).div_ceil(3));
        assert_eq!(decrypt_author(&encrypted, &key).unwrap(), author);
    }

    #[test]
    fn test_watermarked_document() {
        let (author, custom1) = sample();
        let watermark = Watermark::with_salt("made by me\nplease ask", &[4u8; 16]).unwrap();
        let document =
            CassetteDocument::encode(&author, &custom1, PhoneModel::Phone2A, Some(&watermark)).unwrap();

        assert!(document.is_watermarked());
        assert_eq!(
            document.watermark,
            Some(vec!["made by me".to_string(), "please ask".to_string()])
        );
        assert_ne!(document.author, author.to_lines());

        let decoded = document.decode().unwrap();
        assert_eq!(decoded.author, author);
        assert_eq!(decoded.watermark, Some(watermark));
    }

    #[test]
    fn test_bad_salt_rejected_before_decryption() {
        let (author, custom1) = sample();
        let mut document = CassetteDocument::encode(&author, &custom1, PhoneModel::Phone1, None).unwrap();
        document.watermark = Some(vec!["x".to_string()]);
        document.salt = Some(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            [0u8; 15],
        ));

        let err = document.decode().unwrap_err();
        assert!(matches!(err, CassetteError::InvalidSalt { len: 15 }));
    }
}
