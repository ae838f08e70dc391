// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tidings ask` command implementation.

use std::path::{Path, PathBuf};

use tidings_config::model::TidingsConfig;
use tidings_core::TidingsError;
use tracing::debug;

use crate::reply::{ReplyEnd, stream_reply};

/// Answers one question in a fresh conversation and exits.
///
/// Images given with `--image` are attached before the question is sent.
pub async fn run_ask(
    config: TidingsConfig,
    query: &str,
    model: Option<String>,
    images: &[PathBuf],
) -> Result<(), TidingsError> {
    let assistant = crate::build_assistant(&config).await?;
    let conversation = assistant.conversations().current().await;

    for path in images {
        let bytes = std::fs::read(path).map_err(|e| {
            TidingsError::InvalidRequest(format!("cannot read image {}: {e}", path.display()))
        })?;
        let image = assistant
            .conversations()
            .attach_image(&conversation.id, media_type_for(path), &bytes)
            .await?;
        debug!(image = %image.name, path = %path.display(), "image attached");
    }

    match stream_reply(&assistant, query, model.as_deref()).await {
        ReplyEnd::Completed | ReplyEnd::Stopped => Ok(()),
        ReplyEnd::Failed(message) => Err(TidingsError::Internal(message)),
        ReplyEnd::Rejected(reason) => Err(TidingsError::InvalidRequest(reason)),
    }
}

/// Guesses an image media type from the file extension.
pub(crate) fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(Path::new("cat.PNG")), "image/png");
        assert_eq!(media_type_for(Path::new("a/b/photo.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }
}
