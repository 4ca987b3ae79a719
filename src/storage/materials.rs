//! Material file storage using Supabase Storage
//!
//! Handles upload, delete, public and signed URL generation for
//! material PDFs through the Storage REST API.

use serde::Deserialize;

use crate::config::StorageConfig;
use crate::error::AppError;

/// Supabase Storage client bound to one bucket
pub struct MaterialStorage {
    http: reqwest::Client,
    /// Project URL without trailing slash
    base_url: String,
    service_key: String,
    bucket: String,
    signed_url_ttl: u64,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

impl MaterialStorage {
    pub fn new(config: &StorageConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
            signed_url_ttl: config.signed_url_ttl,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body = %error_text, action, "Supabase Storage request failed");
        Err(AppError::Storage(format!("{action} returned {status}")))
    }

    /// Upload a file, replacing any object at `path`
    ///
    /// # Returns
    /// Public URL of the object
    pub async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(self.object_url(path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await?;
        Self::check(response, "upload").await?;

        Ok(self.public_url(path))
    }

    /// Upload a material PDF
    ///
    /// Stores under `materials/{material_id}/`.
    ///
    /// # Returns
    /// (object path, public URL)
    pub async fn upload_material_pdf(
        &self,
        material_id: &str,
        data: Vec<u8>,
    ) -> Result<(String, String), AppError> {
        let path = format!("materials/{}/{}.pdf", material_id, ulid::Ulid::new());
        let url = self.upload(&path, data, "application/pdf").await?;
        Ok((path, url))
    }

    /// Delete an object
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let response = self
            .http
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await?;
        Self::check(response, "delete").await?;

        Ok(())
    }

    /// Public URL of an object in a public bucket
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    /// Short-lived URL for an object in a private bucket
    pub async fn create_signed_url(&self, path: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!(
                "{}/storage/v1/object/sign/{}/{}",
                self.base_url, self.bucket, path
            ))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": self.signed_url_ttl }))
            .send()
            .await?;
        let response = Self::check(response, "sign").await?;

        let signed = response.json::<SignedUrlResponse>().await?;
        if signed.signed_url.starts_with("http") {
            return Ok(signed.signed_url);
        }
        // Relative to the storage API root
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}
