use async_trait::async_trait;
use serde::Deserialize;

use super::GatewayError;

const CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";

/// Image hosting. Takes raw bytes, returns the public URL of the stored copy.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> Result<String, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary unsigned-upload client.
pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
    base_url: String,
}

impl CloudinaryStore {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            base_url: CLOUDINARY_BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> Result<String, GatewayError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!(
                "{}/v1_1/{}/image/upload",
                self.base_url, self.cloud_name
            ))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                service: "cloudinary",
                status: status.as_u16(),
                message,
            });
        }

        let uploaded = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        Ok(uploaded.secure_url)
    }
}
