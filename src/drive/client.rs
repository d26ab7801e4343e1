use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::{fetch_access_token, ServiceAccountKey};
use super::{ArtifactStore, DriveError, UploadReceipt};
use crate::constants::{DRIVE_FILES_URL, DRIVE_UPLOAD_URL, XLSX_MIME_TYPE};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Deserialize)]
struct FileMeta {
    id: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileMeta>,
}

/// Drive v3 client authenticated as a service account.
pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
    account: String,
}

impl DriveClient {
    pub async fn connect(key: &ServiceAccountKey) -> Result<Self, DriveError> {
        let http = reqwest::Client::new();
        let access_token = fetch_access_token(&http, key).await?;
        Ok(Self {
            http,
            access_token,
            account: key.client_email.clone(),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .query(&[("supportsAllDrives", "true")])
    }
}

/// Quote a value for use inside a single-quoted Drive query literal.
pub fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn file_query(folder_id: &str, name: &str) -> String {
    format!(
        "'{}' in parents and name = '{}' and trashed = false",
        escape_query(folder_id),
        escape_query(name)
    )
}

/// A new random boundary for each upload.
pub fn multipart_boundary() -> String {
    format!("nc_pipeline_{}", Uuid::new_v4().simple())
}

/// `multipart/related` body carrying file metadata followed by the content.
pub fn multipart_body(
    boundary: &str,
    metadata: &serde_json::Value,
    content: &[u8],
    content_type: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--").as_bytes());
    body
}

async fn api_error(response: Response) -> DriveError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    DriveError::Api { status, message }
}

impl ArtifactStore for DriveClient {
    async fn check_folder(&self, folder_id: &str) -> Result<(), DriveError> {
        let url = format!("{DRIVE_FILES_URL}/{folder_id}");
        let response = self
            .request(Method::GET, &url)
            .query(&[("fields", "id,mimeType")])
            .send()
            .await?;

        let not_accessible = |details: String| DriveError::FolderNotAccessible {
            folder_id: folder_id.to_string(),
            account: self.account.clone(),
            details,
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(not_accessible(format!("HTTP {status} - {text}")));
        }

        let meta: FileMeta = response.json().await?;
        if meta.mime_type != FOLDER_MIME_TYPE {
            return Err(not_accessible(format!(
                "{} is a {}, not a folder",
                meta.id, meta.mime_type
            )));
        }
        Ok(())
    }

    async fn find_file(&self, folder_id: &str, name: &str) -> Result<Option<String>, DriveError> {
        let query = file_query(folder_id, name);
        let response = self
            .request(Method::GET, DRIVE_FILES_URL)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,mimeType)"),
                ("pageSize", "1"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        let url = format!("{DRIVE_FILES_URL}/{file_id}");
        let response = self
            .request(Method::GET, &url)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        existing: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, DriveError> {
        let (response, created) = match existing {
            Some(file_id) => {
                let url = format!("{DRIVE_UPLOAD_URL}/{file_id}");
                let response = self
                    .request(Method::PATCH, &url)
                    .query(&[("uploadType", "media"), ("fields", "id")])
                    .header(reqwest::header::CONTENT_TYPE, XLSX_MIME_TYPE)
                    .body(bytes)
                    .send()
                    .await?;
                (response, false)
            }
            None => {
                let metadata = serde_json::json!({
                    "name": name,
                    "parents": [folder_id],
                    "mimeType": XLSX_MIME_TYPE,
                });
                let boundary = multipart_boundary();
                let response = self
                    .request(Method::POST, DRIVE_UPLOAD_URL)
                    .query(&[("uploadType", "multipart"), ("fields", "id")])
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={boundary}"),
                    )
                    .body(multipart_body(&boundary, &metadata, &bytes, XLSX_MIME_TYPE))
                    .send()
                    .await?;
                (response, true)
            }
        };

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let meta: FileMeta = response.json().await?;
        Ok(UploadReceipt {
            file_id: meta.id,
            created,
        })
    }
}
