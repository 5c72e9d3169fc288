//! File, sharing, tag and version operations
//!
//! Each operation maps one-to-one onto a backend endpoint. Inputs pass
//! through unvalidated except the advisory upload size check, which runs
//! before any network I/O. Mutations do not reload the collection; callers
//! re-sync with a fresh `list_files()` / `shared_files()`.

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

use super::types::{
    FilePreview, FileRecord, FileVersion, SearchParams, ShareExpiration, ShareLink, ShareRequest,
    SharedFileMeta, Tag,
};
use super::ApiClient;

/// Advisory upload ceiling, checked client-side before any request is
/// issued. The backend enforces its own limit independently.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Progress callback: (bytes so far, total when known)
pub type ProgressFn = Box<dyn Fn(u64, Option<u64>) + Send>;

impl ApiClient {
    // ─── Listing ─────────────────────────────────────────────────────────

    /// Full list of the caller's files
    pub async fn list_files(&self) -> Result<Vec<FileRecord>, ApiError> {
        let url = self.endpoint("/api/files/")?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    /// Search/filter/sort the caller's files. The parameters become
    /// query-string filters on the list endpoint; an empty set is the
    /// plain listing.
    pub async fn search_files(&self, params: &SearchParams) -> Result<Vec<FileRecord>, ApiError> {
        let mut url = self.endpoint("/api/files/")?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params.query_pairs() {
                query.append_pair(name, &value);
            }
        }
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    /// Files shared with the caller by other users
    pub async fn shared_files(&self) -> Result<Vec<FileRecord>, ApiError> {
        let url = self.endpoint("/api/files/shared/")?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    // ─── Upload / download / delete ──────────────────────────────────────

    /// Upload in-memory content as a named file (multipart)
    pub async fn upload_bytes(&self, name: &str, bytes: Vec<u8>) -> Result<FileRecord, ApiError> {
        let size = bytes.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(ApiError::FileTooLarge { size, limit: MAX_UPLOAD_BYTES });
        }

        let mime = mime_guess::from_path(name).first_or_octet_stream();
        let url = self.endpoint("/api/files/")?;
        let file_name = name.to_string();
        let mime_str = mime.essence_str().to_string();

        // The form is rebuilt per attempt so the 401-refresh retry can
        // re-issue the request.
        let response = self
            .execute(move |http| {
                let part = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(&mime_str)
                    .unwrap_or_else(|_| Part::bytes(bytes.clone()).file_name(file_name.clone()));
                http.post(url.clone()).multipart(Form::new().part("file", part))
            })
            .await?;

        let record: FileRecord = Self::decode_json(response).await?;
        info!("Uploaded {} ({} bytes)", record.name, record.size);
        Ok(record)
    }

    /// Upload a local file. The size check runs on metadata before the
    /// content is read, so an oversize file never touches the network.
    pub async fn upload_file(&self, path: &Path) -> Result<FileRecord, ApiError> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::FileTooLarge { size: meta.len(), limit: MAX_UPLOAD_BYTES });
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        self.upload_bytes(&name, bytes).await
    }

    /// Download a file into memory
    pub async fn download_file_bytes(&self, id: Uuid) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/download/"))?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Stream a file to a local path, reporting progress per chunk
    pub async fn download_file_to(
        &self,
        id: Uuid,
        local_path: &Path,
        on_progress: Option<ProgressFn>,
    ) -> Result<u64, ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/download/"))?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        write_stream_to(response, local_path, on_progress).await
    }

    /// Server-generated preview: a thumbnail URL for images and PDFs, a
    /// text excerpt for plain text, `FilePreview::None` otherwise.
    pub async fn file_preview(&self, id: Uuid) -> Result<FilePreview, ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/preview/"))?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    /// Delete a file. The caller's cached collection is re-synced by the
    /// next full reload; this issues no list refresh itself.
    pub async fn delete_file(&self, id: Uuid) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/"))?;
        self.execute(|http| http.delete(url.clone())).await?;
        debug!("Deleted file {id}");
        Ok(())
    }

    // ─── Sharing ─────────────────────────────────────────────────────────

    /// Create a time-limited share link. The returned token is surfaced
    /// once and not persisted client-side.
    pub async fn create_share_link(
        &self,
        id: Uuid,
        expiration: ShareExpiration,
    ) -> Result<ShareLink, ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/share/"))?;
        let payload = ShareRequest::Link { expiration_hours: expiration.hours() };
        let response = self
            .execute(|http| http.post(url.clone()).json(&payload))
            .await?;
        let link: ShareLink = Self::decode_json(response).await?;
        info!("Share link created for {id}, expires {:?}", link.expires_at);
        Ok(link)
    }

    /// Share with another user by email; the backend resolves the identity.
    pub async fn share_with_user(&self, id: Uuid, email: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/share/"))?;
        let payload = ShareRequest::User { email: email.to_string() };
        self.execute(|http| http.post(url.clone()).json(&payload))
            .await?;
        info!("Shared {id} with {email}");
        Ok(())
    }

    /// Metadata for a token-addressed shared file. Unauthenticated: the
    /// token itself is the credential.
    pub async fn shared_file_by_token(&self, token: &str) -> Result<SharedFileMeta, ApiError> {
        let url = self.endpoint(&format!("/api/sharing/links/{token}/"))?;
        let response = self.execute_public(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    /// Download a token-addressed shared file into memory
    pub async fn download_shared_bytes(&self, token: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&format!("/api/sharing/links/{token}/download/"))?;
        let response = self.execute_public(|http| http.get(url.clone())).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Stream a token-addressed shared file to a local path
    pub async fn download_shared_to(
        &self,
        token: &str,
        local_path: &Path,
        on_progress: Option<ProgressFn>,
    ) -> Result<u64, ApiError> {
        let url = self.endpoint(&format!("/api/sharing/links/{token}/download/"))?;
        let response = self.execute_public(|http| http.get(url.clone())).await?;
        write_stream_to(response, local_path, on_progress).await
    }

    // ─── Versions ────────────────────────────────────────────────────────

    /// Version history for a file, newest first as returned by the backend
    pub async fn file_versions(&self, id: Uuid) -> Result<Vec<FileVersion>, ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/versions/"))?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    /// Restore a file to a previous version by its version number
    pub async fn restore_version(&self, id: Uuid, version_number: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/files/{id}/versions/restore/"))?;
        let payload = serde_json::json!({ "version_number": version_number });
        self.execute(|http| http.post(url.clone()).json(&payload))
            .await?;
        info!("Restored {id} to version {version_number}");
        Ok(())
    }

    // ─── Tags ────────────────────────────────────────────────────────────

    pub async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        let url = self.endpoint("/api/files/tags/")?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    pub async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, ApiError> {
        let url = self.endpoint("/api/files/tags/")?;
        let payload = serde_json::json!({ "name": name, "color": color });
        let response = self
            .execute(|http| http.post(url.clone()).json(&payload))
            .await?;
        Self::decode_json(response).await
    }

    pub async fn delete_tag(&self, tag_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/files/tags/{tag_id}/"))?;
        self.execute(|http| http.delete(url.clone())).await?;
        Ok(())
    }
}

/// Stream a response body to disk chunk by chunk
async fn write_stream_to(
    response: reqwest::Response,
    local_path: &Path,
    on_progress: Option<ProgressFn>,
) -> Result<u64, ApiError> {
    let total = response.content_length();
    let mut file = tokio::fs::File::create(local_path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        if let Some(ref progress) = on_progress {
            progress(written, total);
        }
    }
    file.flush().await?;
    Ok(written)
}
