//! Database models
//!
//! Rust structs representing persisted records.
//! Two record kinds share the `photos` store; [`StoredRecord`] is the
//! tagged form both are validated into when they cross the storage boundary.

use crate::config::{FALLBACK_MIME_TYPE, STRIP_PHOTO_COUNT};
use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Self-describing image payload: a `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Encode raw bytes as a data URI of the given MIME type.
    ///
    /// Parameters after `;` are dropped. A type that still cannot sit in a
    /// data URI header is replaced by `application/octet-stream`.
    pub fn from_bytes(mime_type: &str, data: &[u8]) -> Self {
        Self(format!(
            "data:{};base64,{}",
            essence_mime_type(mime_type),
            STANDARD.encode(data)
        ))
    }

    /// Wrap an existing data URI, checking that it is base64 encoded
    pub fn from_data_uri(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        match split_data_uri(&uri) {
            Some(_) => Ok(Self(uri)),
            None => Err(AppError::InvalidRecord(format!(
                "not a base64 data URI: {}",
                truncate(&uri, 32)
            ))),
        }
    }

    /// MIME type declared in the URI header
    pub fn mime_type(&self) -> &str {
        split_data_uri(&self.0).map(|(mime, _)| mime).unwrap_or_default()
    }

    /// Decode the payload back into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, payload) = split_data_uri(&self.0)
            .ok_or_else(|| AppError::InvalidRecord("malformed data URI".into()))?;
        STANDARD
            .decode(payload)
            .map_err(|e| AppError::InvalidRecord(format!("invalid base64 payload: {}", e)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EncodedImage {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_data_uri(value)
    }
}

impl From<EncodedImage> for String {
    fn from(image: EncodedImage) -> Self {
        image.0
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split `data:<mime>;base64,<payload>` into mime and payload
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}

/// `type/subtype` part of a MIME string, or the fallback when unusable
fn essence_mime_type(mime_type: &str) -> &str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    let usable = essence
        .split_once('/')
        .is_some_and(|(kind, subtype)| !kind.is_empty() && !subtype.is_empty())
        && !essence
            .chars()
            .any(|c| c == ',' || c.is_whitespace() || c.is_control());
    if usable {
        essence
    } else {
        FALLBACK_MIME_TYPE
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Discriminator stored alongside each record body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "photo")]
    Photo,
    #[serde(rename = "photoStrip")]
    PhotoStrip,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Photo => "photo",
            RecordKind::PhotoStrip => "photoStrip",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(RecordKind::Photo),
            "photoStrip" => Some(RecordKind::PhotoStrip),
            _ => None,
        }
    }
}

/// A single uploaded photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: i64,
    pub photo: EncodedImage,
}

/// A generated strip: three photos in display order, top to bottom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoStripRecord {
    pub id: i64,
    pub photos: Vec<EncodedImage>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

/// Any record held in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRecord {
    Photo(PhotoRecord),
    Strip(PhotoStripRecord),
}

impl StoredRecord {
    pub fn id(&self) -> i64 {
        match self {
            StoredRecord::Photo(record) => record.id,
            StoredRecord::Strip(record) => record.id,
        }
    }
}

/// JSON body of a photo record (the id lives in its own column)
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PhotoBody {
    pub photo: EncodedImage,
}

/// JSON body of a strip record
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PhotoStripBody {
    pub photos: Vec<EncodedImage>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

impl PhotoStripBody {
    /// Build a strip body stamped with the current time
    pub fn new(photos: &[EncodedImage]) -> Result<Self> {
        check_strip_len(photos.len())?;
        Ok(Self {
            photos: photos.to_vec(),
            timestamp: Utc::now(),
            kind: RecordKind::PhotoStrip,
        })
    }
}

fn check_strip_len(len: usize) -> Result<()> {
    if len != STRIP_PHOTO_COUNT {
        return Err(AppError::InvalidRecord(format!(
            "a photo strip holds exactly {} photos, got {}",
            STRIP_PHOTO_COUNT, len
        )));
    }
    Ok(())
}

/// Raw row of the `photos` table
#[derive(Debug, Clone, FromRow)]
pub struct StoreRow {
    pub id: i64,
    pub kind: String,
    pub body: String,
}

impl TryFrom<StoreRow> for StoredRecord {
    type Error = AppError;

    fn try_from(row: StoreRow) -> Result<Self> {
        let kind = RecordKind::parse(&row.kind).ok_or_else(|| {
            AppError::InvalidRecord(format!("record {} has unknown kind '{}'", row.id, row.kind))
        })?;

        match kind {
            RecordKind::Photo => {
                let body: PhotoBody = serde_json::from_str(&row.body)?;
                Ok(StoredRecord::Photo(PhotoRecord {
                    id: row.id,
                    photo: body.photo,
                }))
            }
            RecordKind::PhotoStrip => {
                let body: PhotoStripBody = serde_json::from_str(&row.body)?;
                if body.kind != RecordKind::PhotoStrip {
                    return Err(AppError::InvalidRecord(format!(
                        "record {} is stored as a strip but tagged '{}'",
                        row.id,
                        body.kind.as_str()
                    )));
                }
                check_strip_len(body.photos.len())?;
                Ok(StoredRecord::Strip(PhotoStripRecord {
                    id: row.id,
                    photos: body.photos,
                    timestamp: body.timestamp,
                    kind: body.kind,
                }))
            }
        }
    }
}
