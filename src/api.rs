// API client module: a small blocking HTTP client for the leaf disease
// inference service. One call per user action, no retries, no caching.

use crate::config::Config;
use crate::error::ApiError;
use crate::model::{HealthStatus, ModelList, ModelName, Prediction};
use crate::session::Predictor;
use anyhow::Context;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Holds a reqwest blocking client and the service configuration.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
}

impl ApiClient {
    /// Build a client for the given configuration. The configured timeout is
    /// applied as-is, so `None` really means no timeout.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(ApiClient { client, config })
    }

    /// Create an ApiClient configured from `LEAFSCAN_*` environment
    /// variables, see `Config::from_env`.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env();
        ApiClient::new(config).context("Failed to build HTTP client")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Upload an image with multipart/form-data to `/predict`.
    ///
    /// The form carries two parts: `file` with the image bytes and
    /// `model_name` with the identifier exactly as the service spells it.
    /// Failures are logged here and handed back untouched; turning them into
    /// something for the user is the caller's job.
    pub fn predict(&self, file_path: &Path, model: ModelName) -> Result<Prediction, ApiError> {
        let url = self.config.endpoint("/predict");
        let result = self.build_predict_form(file_path, model).and_then(|form| {
            log::debug!("POST {} model_name={}", url, model);
            self.send_json(self.client.post(&url).multipart(form))
        });
        if let Err(e) = &result {
            log::error!("Error predicting disease: {}", e);
        }
        result
    }

    /// `GET /health`: overall status and which models the service loaded.
    pub fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.config.endpoint("/health");
        log::debug!("GET {}", url);
        self.send_json(self.client.get(&url)).map_err(|e| {
            log::error!("Health check failed: {}", e);
            e
        })
    }

    /// `GET /models`: the identifiers the service knows about.
    pub fn list_models(&self) -> Result<ModelList, ApiError> {
        let url = self.config.endpoint("/models");
        log::debug!("GET {}", url);
        self.send_json(self.client.get(&url)).map_err(|e| {
            log::error!("Listing models failed: {}", e);
            e
        })
    }

    fn build_predict_form(
        &self,
        file_path: &Path,
        model: ModelName,
    ) -> Result<multipart::Form, ApiError> {
        // Read the whole image up front so the body has a known length.
        let bytes = fs::read(file_path).map_err(|source| ApiError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        let file_name = file_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("leaf.jpg")
            .to_string();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime(file_path))?;
        Ok(multipart::Form::new()
            .part("file", part)
            .text("model_name", model.as_str()))
    }

    fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let res = req.send()?;
        read_json(res)
    }
}

impl Predictor for ApiClient {
    fn predict(&self, image: &Path, model: ModelName) -> Result<Prediction, ApiError> {
        ApiClient::predict(self, image, model)
    }
}

fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let status = res.status();
    let body = res.text()?;
    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }
    serde_json::from_str(&body).map_err(ApiError::Decode)
}

/// MIME type for an image path, judged by extension. Anything we do not
/// recognise goes out as a generic binary.
pub fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime(Path::new("leaf.JPG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("a/b/leaf.jpeg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("leaf.png")), "image/png");
        assert_eq!(image_mime(Path::new("leaf")), "application/octet-stream");
        assert_eq!(image_mime(Path::new("notes.txt")), "application/octet-stream");
    }

    #[test]
    fn unreadable_image_never_reaches_the_network() {
        // Port 9 (discard) is never contacted because reading the file fails first.
        let client = ApiClient::new(Config::default().with_base_url("http://127.0.0.1:9")).unwrap();
        let missing = PathBuf::from("/definitely/not/here/leaf.png");
        match client.predict(&missing, ModelName::Cnn) {
            Err(ApiError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
