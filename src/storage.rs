//! Object storage client for product photos.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{info, warn};

use crate::auth::Session;
use crate::config::BackendConfig;
use crate::error::{AppError, Result};

/// Client for `{url}/storage/v1` scoped to one bucket.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            bucket: config.storage_bucket.clone(),
        })
    }

    /// Upload `bytes` to `path`. Fails if the object already exists.
    pub async fn upload(
        &self,
        session: Option<&Session>,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!(
            "{base}/storage/v1/object/{bucket}/{path}",
            base = self.base_url,
            bucket = self.bucket,
            path = path.trim_start_matches('/')
        );
        let token = session.map(|s| s.access_token.as_str()).unwrap_or(&self.anon_key);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .bearer_auth(token)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upload of {} failed ({}): {}", path, status, body);
            return Err(AppError::Storage(format!("{status}")));
        }

        info!("Uploaded {} to bucket {}", path, self.bucket);
        Ok(self.public_url(path))
    }

    /// Public URL of an object in the bucket.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{base}/storage/v1/object/public/{bucket}/{path}",
            base = self.base_url,
            bucket = self.bucket,
            path = path.trim_start_matches('/')
        )
    }
}

/// Object path for a product photo: `productos/{codigo}_{millis}.{ext}`.
pub fn product_image_path(codigo: &str, extension: &str) -> String {
    let safe: String = codigo
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let ext = extension.trim_start_matches('.').to_lowercase();
    let ext = if ext.is_empty() { "png".to_string() } else { ext };
    format!("productos/{safe}_{millis}.{ext}", millis = Utc::now().timestamp_millis())
}

/// MIME type for an image file extension.
pub fn image_content_type(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        let config = BackendConfig {
            url: "https://demo.supabase.co/".to_string(),
            ..BackendConfig::default()
        };
        let storage = StorageClient::new(&config).unwrap();
        assert_eq!(
            storage.public_url("productos/123_1.png"),
            "https://demo.supabase.co/storage/v1/object/public/imagenes-productos/productos/123_1.png"
        );
    }

    #[test]
    fn test_product_image_path() {
        let path = product_image_path("7801 23/4", ".JPG");
        assert!(path.starts_with("productos/7801_23_4_"));
        assert!(path.ends_with(".jpg"));

        assert!(product_image_path("123", "").ends_with(".png"));
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("jpeg"), "image/jpeg");
        assert_eq!(image_content_type(".PNG"), "image/png");
        assert_eq!(image_content_type("bmp"), "image/png");
    }
}
