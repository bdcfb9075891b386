//! Third-party image hosting: upload bytes, get back `{url, publicId}`; delete
//! by `publicId`.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("media host rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("media host returned an unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaHost: Send + Sync + 'static {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError>;
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

pub type DynMediaHost = Arc<dyn MediaHost>;

/// Digest used for request signatures. Cloudinary accounts verify SHA-1
/// unless SHA-256 signing is enabled in the account settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Cloudinary upload API client.
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
    base_url: String,
}

#[derive(Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct CloudinaryDestroy {
    result: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        let base_url = format!("https://api.cloudinary.com/v1_1/{}/image", config.cloud_name);
        Self { client: reqwest::Client::new(), config, base_url }
    }

    pub fn into_arc(self) -> DynMediaHost {
        Arc::new(self)
    }

    /// `params` must already be sorted by key.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        match self.config.signature_algorithm {
            SignatureAlgorithm::Sha1 => digest_hex::<Sha1>(&to_sign, &self.config.api_secret),
            SignatureAlgorithm::Sha256 => digest_hex::<Sha256>(&to_sign, &self.config.api_secret),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, MediaError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(MediaError::Rejected { status: status.as_u16(), body })
    }
}

fn digest_hex<D: Digest>(to_sign: &str, secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut signed: Vec<(&str, String)> = Vec::new();
        if let Some(folder) = &self.config.folder {
            signed.push(("folder", folder.clone()));
        }
        signed.push(("timestamp", timestamp));
        let signature = self.sign(&signed);

        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = file.content_type.as_deref() {
            part = part.mime_str(mime)?;
        }
        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (k, v) in signed {
            form = form.text(k, v);
        }

        let resp = self.client.post(format!("{}/upload", self.base_url)).multipart(form).send().await?;
        let uploaded: CloudinaryUpload = Self::check(resp).await?.json().await?;
        Ok(UploadedMedia { url: uploaded.secure_url, public_id: uploaded.public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [("public_id", public_id.to_string()), ("timestamp", timestamp)];
        let signature = self.sign(&signed);

        let mut form: Vec<(&str, String)> = signed.to_vec();
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));

        let resp = self.client.post(format!("{}/destroy", self.base_url)).form(&form).send().await?;
        let destroyed: CloudinaryDestroy = Self::check(resp).await?.json().await?;
        if destroyed.result != "ok" {
            return Err(MediaError::InvalidResponse(format!("destroy {public_id}: {}", destroyed.result)));
        }
        Ok(())
    }
}

/// Keeps uploads in process memory. Used for local runs without Cloudinary
/// credentials and in tests.
#[derive(Default)]
pub struct MemoryMediaHost {
    files: Mutex<HashMap<String, usize>>,
}

impl MemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_arc(self) -> DynMediaHost {
        Arc::new(self)
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.files.lock().contains_key(public_id)
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaHost for MemoryMediaHost {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError> {
        if file.bytes.is_empty() {
            return Err(MediaError::Rejected { status: 400, body: format!("{} is empty", file.file_name) });
        }
        let public_id = format!("blog/{}", Uuid::new_v4().simple());
        self.files.lock().insert(public_id.clone(), file.bytes.len());
        Ok(UploadedMedia { url: format!("memory://{public_id}/{}", file.file_name), public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        match self.files.lock().remove(public_id) {
            Some(_) => Ok(()),
            None => Err(MediaError::InvalidResponse(format!("destroy {public_id}: not found"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_host_round_trips_and_rejects_empty_files() {
        let host = MemoryMediaHost::new();
        let uploaded = host
            .upload(UploadFile { file_name: "a.png".into(), content_type: None, bytes: vec![1, 2, 3] })
            .await
            .unwrap();
        assert!(host.contains(&uploaded.public_id));
        assert!(uploaded.url.ends_with("/a.png"));

        host.delete(&uploaded.public_id).await.unwrap();
        assert!(host.is_empty());
        assert!(host.delete(&uploaded.public_id).await.is_err());

        let empty = host.upload(UploadFile { file_name: "b.png".into(), content_type: None, bytes: Vec::new() }).await;
        assert!(matches!(empty, Err(MediaError::Rejected { status: 400, .. })));
    }

    fn host(api_secret: &str, signature_algorithm: SignatureAlgorithm) -> CloudinaryHost {
        CloudinaryHost::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: api_secret.into(),
            folder: None,
            signature_algorithm,
        })
    }

    #[test]
    fn cloudinary_signs_with_sha1_by_default() {
        // documented example from Cloudinary's signature guide
        let sig = host("abcd", SignatureAlgorithm::default()).sign(&[
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".into()),
            ("public_id", "sample_image".into()),
            ("timestamp", "1315060510".into()),
        ]);
        assert_eq!(sig, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn cloudinary_signature_can_use_sha256() {
        let sig = host("secret", SignatureAlgorithm::Sha256)
            .sign(&[("public_id", "sample".into()), ("timestamp", "1315060510".into())]);
        let expected = hex::encode(Sha256::digest(b"public_id=sample&timestamp=1315060510secret"));
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn signature_algorithm_names() {
        assert_eq!(SignatureAlgorithm::parse("SHA256"), Some(SignatureAlgorithm::Sha256));
        assert_eq!(SignatureAlgorithm::parse(" sha1 "), Some(SignatureAlgorithm::Sha1));
        assert_eq!(SignatureAlgorithm::parse("md5"), None);
    }
}
