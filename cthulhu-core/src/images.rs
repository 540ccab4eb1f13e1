//! Illustration attachment for finalized scenes.
//!
//! A peripheral step: compose an image prompt from the news summary and
//! the scene text, render it through the image capability, write the PNG
//! to the image directory, and record the bookkeeping on the scene.

use crate::scene::{ImageMeta, Scene};
use std::path::Path;
use textgen::{GenerationError, ImageGenerator};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Errors from the illustration step.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reduce a scene title to a filesystem-safe image name.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// The prompt an illustration is rendered from.
pub fn image_prompt(scene: &Scene) -> String {
    format!(
        "Create a dark retro surrealism image that depicts this alarming news \
         article:\n\n{}\n\n{}",
        scene.news.summary, scene.scene_text
    )
}

/// Render and store one illustration per scene, filling `image_meta`.
pub async fn attach_illustrations(
    scenes: &mut [Scene],
    generator: &dyn ImageGenerator,
    image_dir: &Path,
) -> Result<(), ImageError> {
    fs::create_dir_all(image_dir).await?;

    for scene in scenes.iter_mut() {
        let prompt = image_prompt(scene);
        let image = generator.generate_image(&prompt).await?;
        if let Some(revised) = &image.revised_prompt {
            debug!(scene_number = scene.scene_number, revised_prompt = %revised, "provider revised the image prompt");
        }

        let name = slugify(&scene.scene_title);
        let filename = format!("{name}.png");
        fs::write(image_dir.join(&filename), &image.bytes).await?;

        scene.image_meta = Some(ImageMeta {
            prompt,
            name,
            filename,
            revised_prompt: image.revised_prompt,
        });
    }

    info!(count = scenes.len(), "attached scene illustrations");
    Ok(())
}
