//! Inlining of freshly generated images into a result value.
//!
//! [`inline`] walks a JSON value and replaces every string that names a
//! local image file written since the job started with a markdown image
//! embedding the file as a base64 data URI.
//!
//! This is the one step of result processing that touches the filesystem.
//! All file access goes through [`ArtifactFs`] so tests can stub it.
//!
//! Recency is judged by modification time alone. Two jobs sharing a working
//! directory can therefore pick up each other's images if they overlap.

use std::io;
use std::path::Path;
use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

/// Extensions eligible for inlining (compared lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

const DEFAULT_MIME: &str = "image/png";

/// Filesystem access used by the inliner.
pub trait ArtifactFs: Send + Sync {
    /// Modification time of `path` if it is an existing regular file.
    fn modified(&self, path: &Path) -> Option<SystemTime>;

    /// Full contents of `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ArtifactFs for LocalFs {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        let metadata = std::fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        metadata.modified().ok()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Inline qualifying images found anywhere in `value`, using the local filesystem.
pub fn inline(value: Value, start_time: DateTime<Utc>) -> Value {
    inline_with(&LocalFs, value, start_time)
}

/// Inline qualifying images found anywhere in `value`.
///
/// Object keys and array order are preserved; non-string scalars and strings
/// that do not qualify are returned unchanged. A qualifying file that cannot
/// be read is left as the original string.
pub fn inline_with(fs: &dyn ArtifactFs, value: Value, start_time: DateTime<Utc>) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, inline_with(fs, v, start_time)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| inline_with(fs, v, start_time))
                .collect(),
        ),
        Value::String(s) => match qualify(fs, &s, start_time) {
            Some(mime) => match fs.read(Path::new(&s)) {
                Ok(bytes) => {
                    debug!(path = %s, bytes = bytes.len(), "Inlining generated image");
                    Value::String(markdown_image(&mime, &bytes))
                }
                Err(e) => {
                    warn!(path = %s, error = %e, "Failed to read generated image");
                    Value::String(s)
                }
            },
            None => Value::String(s),
        },
        other => other,
    }
}

/// MIME type of `candidate` if it names an image written at or after `start_time`.
fn qualify(fs: &dyn ArtifactFs, candidate: &str, start_time: DateTime<Utc>) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    let path = Path::new(candidate);

    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    let modified: DateTime<Utc> = fs.modified(path)?.into();
    if modified < start_time {
        return None;
    }

    Some(
        mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string()),
    )
}

fn markdown_image(mime: &str, bytes: &[u8]) -> String {
    format!("![Generated Image](data:{};base64,{})", mime, STANDARD.encode(bytes))
}
