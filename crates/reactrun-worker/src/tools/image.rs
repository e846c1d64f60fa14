//! First-party image generation tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reactrun_agent::{Tool, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_QUALITY: &str = "medium";

#[derive(Debug, Error)]
enum ImageError {
    #[error("OPENAI_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Image API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Image API returned no image data")]
    EmptyResponse,

    #[error("Invalid image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct ImageArgs {
    prompt: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    quality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Generates an image from a prompt and saves it in the working directory.
///
/// Returns the saved file's path, which the result inliner later embeds.
/// Failures are returned to the model as text rather than as tool errors.
#[derive(Debug, Clone)]
pub struct CreateImage {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    work_dir: PathBuf,
}

impl CreateImage {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.image_model.clone(),
            config.work_dir.clone(),
        )
    }

    /// Output path for a requested file name, kept inside the working directory.
    fn output_path(&self, filename: Option<&str>) -> PathBuf {
        let name = filename
            .and_then(|f| Path::new(f).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("img_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S")));
        self.work_dir.join(name)
    }

    async fn generate(&self, args: &ImageArgs) -> Result<PathBuf, ImageError> {
        let api_key = self.api_key.as_deref().ok_or(ImageError::MissingApiKey)?;

        let mut body = json!({
            "model": self.model,
            "prompt": args.prompt,
            "size": args.size.as_deref().unwrap_or(DEFAULT_SIZE),
            "quality": args.quality.as_deref().unwrap_or(DEFAULT_QUALITY),
            "n": 1,
        });
        // gpt-image models always answer with base64 and reject the parameter
        if self.model.starts_with("dall-e") {
            body["response_format"] = json!("b64_json");
        }

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let images: ImagesResponse = response.json().await?;
        let encoded = images
            .data
            .into_iter()
            .find_map(|d| d.b64_json)
            .ok_or(ImageError::EmptyResponse)?;
        let bytes = STANDARD.decode(encoded.trim())?;

        let path = self.output_path(args.filename.as_deref());
        tokio::fs::create_dir_all(&self.work_dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        info!(path = %path.display(), bytes = bytes.len(), "Image saved");
        Ok(path)
    }
}

#[async_trait]
impl Tool for CreateImage {
    fn name(&self) -> &str {
        "create_image"
    }

    fn description(&self) -> &str {
        "Create an image from a text prompt. Returns the path of the saved image file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {"type": "string", "description": "Description of the image to create"},
                "filename": {"type": "string", "description": "Optional file name for the saved image"},
                "size": {"type": "string", "default": DEFAULT_SIZE},
                "quality": {"type": "string", "default": DEFAULT_QUALITY}
            },
            "required": ["prompt"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<String, ToolError> {
        let args: ImageArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        match self.generate(&args).await {
            Ok(path) => Ok(path.display().to_string()),
            Err(e) => {
                warn!(error = %e, "Image generation failed");
                Ok(format!("Error generating image: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(api_key: Option<&str>) -> CreateImage {
        CreateImage::new(
            "https://api.openai.com/v1/",
            api_key.map(str::to_string),
            "gpt-image-1",
            "/work",
        )
    }

    #[test]
    fn test_output_path_stays_in_work_dir() {
        let tool = tool(None);
        assert_eq!(
            tool.output_path(Some("cat.png")),
            PathBuf::from("/work/cat.png")
        );
        assert_eq!(
            tool.output_path(Some("../../etc/cat.png")),
            PathBuf::from("/work/cat.png")
        );

        let generated = tool.output_path(None);
        let name = generated.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("img_") && name.ends_with(".png"));
        assert_eq!(generated.parent(), Some(Path::new("/work")));
    }

    #[tokio::test]
    async fn test_missing_api_key_reported_as_text() {
        let output = tool(None)
            .invoke(json!({"prompt": "a cat"}))
            .await
            .unwrap();
        assert_eq!(
            output,
            "Error generating image: OPENAI_API_KEY environment variable is not set"
        );
    }

    #[tokio::test]
    async fn test_missing_prompt_is_invalid() {
        let result = tool(Some("sk-test")).invoke(json!({"size": "512x512"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn test_definition() {
        let definition = tool(None).definition();
        assert_eq!(definition.function.name, "create_image");
        assert_eq!(definition.function.parameters["required"], json!(["prompt"]));
    }
}
