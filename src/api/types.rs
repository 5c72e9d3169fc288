//! Wire types for the ShareVault REST API
//!
//! Plain mirrors of backend resources; the client imposes no invariants
//! beyond the shapes the UI layer needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Users & auth ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Registration payload. `password2` is the backend's confirmation field.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub mfa_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// MFA enrollment material: TOTP secret plus a data-URI QR code image
#[derive(Debug, Clone, Deserialize)]
pub struct MfaSetup {
    pub secret: String,
    pub qr_code: String,
}

// ─── Files ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub file_count: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileVersion {
    pub id: i64,
    pub version_number: i64,
    pub created_by_username: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
}

// ─── Search & preview ────────────────────────────────────────────────────

/// Coarse content-type buckets the backend filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Image,
    Video,
    Audio,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "document" => Ok(FileKind::Document),
            "image" => Ok(FileKind::Image),
            "video" => Ok(FileKind::Video),
            "audio" => Ok(FileKind::Audio),
            other => Err(ApiError::Decode(format!(
                "Invalid file type '{other}' (document, image, video or audio)"
            ))),
        }
    }
}

/// Upload-date window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Week,
    Month,
    /// Explicit bounds; either side may be open
    Custom {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

/// Size buckets: small < 1 MB, medium 1–10 MB, large > 10 MB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRange {
    Small,
    Medium,
    Large,
}

impl SizeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            SizeRange::Small => "small",
            SizeRange::Medium => "medium",
            SizeRange::Large => "large",
        }
    }
}

impl std::str::FromStr for SizeRange {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "small" => Ok(SizeRange::Small),
            "medium" => Ok(SizeRange::Medium),
            "large" => Ok(SizeRange::Large),
            other => Err(ApiError::Decode(format!(
                "Invalid size '{other}' (small, medium or large)"
            ))),
        }
    }
}

/// Sort keys the backend accepts; a leading `-` is descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    UploadedAtDesc,
    UploadedAtAsc,
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::UploadedAtDesc => "-uploaded_at",
            SortOrder::UploadedAtAsc => "uploaded_at",
            SortOrder::NameAsc => "name",
            SortOrder::NameDesc => "-name",
            SortOrder::SizeAsc => "size",
            SortOrder::SizeDesc => "-size",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-uploaded_at" => Ok(SortOrder::UploadedAtDesc),
            "uploaded_at" => Ok(SortOrder::UploadedAtAsc),
            "name" => Ok(SortOrder::NameAsc),
            "-name" => Ok(SortOrder::NameDesc),
            "size" => Ok(SortOrder::SizeAsc),
            "-size" => Ok(SortOrder::SizeDesc),
            other => Err(ApiError::Decode(format!(
                "Invalid sort '{other}' (±uploaded_at, ±name or ±size)"
            ))),
        }
    }
}

/// Search/filter/sort parameters over the file list. Empty means the
/// plain listing; the backend applies its own default sort.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// Substring match against file name or tag name
    pub search: Option<String>,
    /// Repeatable; ORed together server-side
    pub types: Vec<FileKind>,
    pub date_range: Option<DateRange>,
    pub size: Option<SizeRange>,
    pub sort: Option<SortOrder>,
}

impl SearchParams {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.types.is_empty()
            && self.date_range.is_none()
            && self.size.is_none()
            && self.sort.is_none()
    }

    /// Query pairs in the order the backend reads them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        for kind in &self.types {
            pairs.push(("type", kind.as_str().to_string()));
        }
        match &self.date_range {
            Some(DateRange::Today) => pairs.push(("date_range", "today".to_string())),
            Some(DateRange::Week) => pairs.push(("date_range", "week".to_string())),
            Some(DateRange::Month) => pairs.push(("date_range", "month".to_string())),
            Some(DateRange::Custom { start, end }) => {
                pairs.push(("date_range", "custom".to_string()));
                if let Some(start) = start {
                    pairs.push(("start_date", start.to_rfc3339()));
                }
                if let Some(end) = end {
                    pairs.push(("end_date", end.to_rfc3339()));
                }
            }
            None => {}
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.as_str().to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        pairs
    }
}

/// Server-generated preview. The client renders what it gets; preview
/// generation is entirely backend-side.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilePreview {
    /// Thumbnail URL (images, first PDF page)
    Image { url: String },
    /// First-lines excerpt of a text file
    Text { content: String },
    /// Content type has no preview support
    None,
}

// ─── Sharing ─────────────────────────────────────────────────────────────

/// Fixed expiration choices for share links, in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareExpiration {
    Hours24,
    Hours48,
    Days7,
    Days30,
}

impl ShareExpiration {
    pub fn hours(self) -> u32 {
        match self {
            ShareExpiration::Hours24 => 24,
            ShareExpiration::Hours48 => 48,
            ShareExpiration::Days7 => 168,
            ShareExpiration::Days30 => 720,
        }
    }

    pub fn all() -> [ShareExpiration; 4] {
        [
            ShareExpiration::Hours24,
            ShareExpiration::Hours48,
            ShareExpiration::Days7,
            ShareExpiration::Days30,
        ]
    }
}

impl fmt::Display for ShareExpiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareExpiration::Hours24 => write!(f, "24 hours"),
            ShareExpiration::Hours48 => write!(f, "48 hours"),
            ShareExpiration::Days7 => write!(f, "7 days"),
            ShareExpiration::Days30 => write!(f, "30 days"),
        }
    }
}

impl std::str::FromStr for ShareExpiration {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24" => Ok(ShareExpiration::Hours24),
            "48" => Ok(ShareExpiration::Hours48),
            "168" => Ok(ShareExpiration::Days7),
            "720" => Ok(ShareExpiration::Days30),
            other => Err(ApiError::Decode(format!(
                "Invalid expiration '{other}' (choose 24, 48, 168 or 720 hours)"
            ))),
        }
    }
}

/// Share creation payload, one endpoint covering both flows
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShareRequest {
    Link { expiration_hours: u32 },
    User { email: String },
}

/// Link-share creation result. The token/URL is surfaced once; the client
/// does not persist it beyond the current flow.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareLink {
    pub token: String,
    #[serde(default)]
    pub share_link: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Metadata for a token-addressed shared file (unauthenticated landing)
#[derive(Debug, Clone, Deserialize)]
pub struct SharedFileMeta {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_expiration_parses_the_fixed_choices() {
        assert_eq!("24".parse::<ShareExpiration>().unwrap().hours(), 24);
        assert_eq!("168".parse::<ShareExpiration>().unwrap().hours(), 168);
        assert!("12".parse::<ShareExpiration>().is_err());
    }

    #[test]
    fn share_request_serializes_with_type_tag() {
        let link = ShareRequest::Link { expiration_hours: 24 };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["type"], "link");
        assert_eq!(json["expiration_hours"], 24);

        let user = ShareRequest::User { email: "a@b.example".into() };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["email"], "a@b.example");
    }

    #[test]
    fn search_params_build_the_backend_query() {
        let params = SearchParams {
            search: Some("report".to_string()),
            types: vec![FileKind::Document, FileKind::Image],
            date_range: Some(DateRange::Week),
            size: Some(SizeRange::Medium),
            sort: Some(SortOrder::NameAsc),
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("search", "report".to_string()),
                ("type", "document".to_string()),
                ("type", "image".to_string()),
                ("date_range", "week".to_string()),
                ("size", "medium".to_string()),
                ("sort", "name".to_string()),
            ]
        );
        assert!(SearchParams::default().is_empty());
        assert!(SearchParams::default().query_pairs().is_empty());
    }

    #[test]
    fn custom_date_range_emits_its_bounds() {
        let start = "2026-01-01T00:00:00Z".parse().unwrap();
        let params = SearchParams {
            date_range: Some(DateRange::Custom { start: Some(start), end: None }),
            ..SearchParams::default()
        };
        let pairs = params.query_pairs();
        assert_eq!(pairs[0], ("date_range", "custom".to_string()));
        assert_eq!(pairs[1].0, "start_date");
        assert!(pairs[1].1.starts_with("2026-01-01T00:00:00"));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn preview_decodes_each_tagged_shape() {
        let image: FilePreview =
            serde_json::from_str(r#"{"type": "image", "url": "/media/previews/1.preview"}"#)
                .unwrap();
        assert_eq!(image, FilePreview::Image { url: "/media/previews/1.preview".into() });

        let text: FilePreview =
            serde_json::from_str(r#"{"type": "text", "content": "line one\nline two"}"#).unwrap();
        assert_eq!(text, FilePreview::Text { content: "line one\nline two".into() });

        let none: FilePreview = serde_json::from_str(r#"{"type": "none"}"#).unwrap();
        assert_eq!(none, FilePreview::None);
    }

    #[test]
    fn file_record_decodes_with_missing_optionals() {
        let json = r#"{
            "id": "9a0a9d5e-1b1a-4d3c-8d2f-0dd1c4b7a111",
            "name": "report.pdf",
            "size": 2048,
            "uploaded_at": "2026-01-15T10:30:00Z"
        }"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "report.pdf");
        assert!(record.tags.is_empty());
        assert!(record.content_type.is_none());
    }
}
