//! Strip rendering
//!
//! Lays three photos into a fixed-size vertical strip, applies the selected
//! filter to every frame and rasterizes the result to a JPEG data URI.
//!
//! Geometry (pixels):
//!
//! ```text
//! +-- border 15 --------------------------+
//! |  padding 16                           |
//! |  +-- frame 300 x 200 --------------+  |
//! |  +---------------------------------+  |
//! |  gap 8                                |
//! |  +-- frame -------------------------+ |
//! |  ...                                  |
//! +---------------------------------------+
//! ```

use crate::config::{
    FRAME_GAP, FRAME_HEIGHT, JPEG_QUALITY, STRIP_BORDER, STRIP_CONTENT_WIDTH,
    STRIP_MIN_CONTENT_HEIGHT, STRIP_PADDING, STRIP_PHOTO_COUNT,
};
use crate::database::EncodedImage;
use crate::error::{AppError, Result};
use crate::services::filters::{apply_filter, ops_for_name, FilterOp, StripFilter};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

const STRIP_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME_BACKGROUND: Rgba<u8> = Rgba([245, 245, 245, 255]);
// rgba(0, 0, 0, 0.1) over the frame background
const FRAME_BORDER: Rgba<u8> = Rgba([221, 221, 221, 255]);

/// Dimensions of the strip container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub content_width: u32,
    pub padding: u32,
    pub border: u32,
    pub frame_height: u32,
    pub frame_gap: u32,
    pub min_content_height: u32,
    pub jpeg_quality: u8,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            content_width: STRIP_CONTENT_WIDTH,
            padding: STRIP_PADDING,
            border: STRIP_BORDER,
            frame_height: FRAME_HEIGHT,
            frame_gap: FRAME_GAP,
            min_content_height: STRIP_MIN_CONTENT_HEIGHT,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl StripLayout {
    fn inset(&self) -> u32 {
        self.border + self.padding
    }

    /// Canvas size for a strip of `frames` photos
    pub fn canvas_size(&self, frames: u32) -> (u32, u32) {
        let stacked = frames * self.frame_height + frames.saturating_sub(1) * self.frame_gap;
        let content_height = stacked.max(self.min_content_height);
        (
            self.content_width + 2 * self.inset(),
            content_height + 2 * self.inset(),
        )
    }

    /// Top-left corner of frame `index`
    pub fn frame_origin(&self, index: u32) -> (u32, u32) {
        (
            self.inset(),
            self.inset() + index * (self.frame_height + self.frame_gap),
        )
    }
}

/// A rasterized strip together with the photos it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedStrip {
    /// JPEG data URI of the whole strip
    pub image: EncodedImage,
    /// Source photos in display order
    pub sources: Vec<EncodedImage>,
    /// Style applied, `None` when the requested name was unknown
    pub filter: Option<StripFilter>,
    pub rendered_at: DateTime<Utc>,
}

/// Rasterizes strips with a fixed layout
#[derive(Debug, Clone, Default)]
pub struct StripRenderer {
    layout: StripLayout,
}

impl StripRenderer {
    pub fn new(layout: StripLayout) -> Self {
        Self { layout }
    }

    /// Render exactly three `images` with the named filter.
    ///
    /// Unknown filter names render without a filter.
    pub async fn render(&self, images: &[EncodedImage], filter_name: &str) -> Result<EncodedImage> {
        if images.len() < STRIP_PHOTO_COUNT {
            return Err(AppError::InsufficientPhotos {
                found: images.len(),
                required: STRIP_PHOTO_COUNT,
            });
        }
        if images.len() > STRIP_PHOTO_COUNT {
            return Err(AppError::RenderFailed(format!(
                "a strip holds exactly {} photos, got {}",
                STRIP_PHOTO_COUNT,
                images.len()
            )));
        }

        let frames = images.to_vec();
        let ops = ops_for_name(filter_name);
        let layout = self.layout;

        tracing::info!(
            "Rendering photo strip with filter '{}' ({})",
            filter_name,
            super::filters::css_expression(ops)
        );

        let jpeg = tokio::task::spawn_blocking(move || rasterize(&layout, &frames, ops))
            .await
            .map_err(|e| AppError::RenderFailed(format!("render task failed: {}", e)))??;

        tracing::debug!("Rendered photo strip ({} bytes)", jpeg.len());

        Ok(EncodedImage::from_bytes("image/jpeg", &jpeg))
    }

    /// Render and keep the source photos alongside the result
    pub async fn compose(&self, images: &[EncodedImage], filter_name: &str) -> Result<ComposedStrip> {
        let image = self.render(images, filter_name).await?;
        Ok(ComposedStrip {
            image,
            sources: images.to_vec(),
            filter: StripFilter::from_name(filter_name),
            rendered_at: Utc::now(),
        })
    }
}

/// Draw the strip and encode it as JPEG
fn rasterize(layout: &StripLayout, frames: &[EncodedImage], ops: &[FilterOp]) -> Result<Vec<u8>> {
    let (width, height) = layout.canvas_size(frames.len() as u32);
    let mut canvas = RgbaImage::from_pixel(width, height, STRIP_BACKGROUND);

    for (index, source) in frames.iter().enumerate() {
        let (x, y) = layout.frame_origin(index as u32);
        draw_frame(&mut canvas, layout, x, y);

        let bytes = source
            .decode()
            .map_err(|e| AppError::RenderFailed(format!("photo {}: {}", index + 1, e)))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| AppError::RenderFailed(format!("photo {}: {}", index + 1, e)))?;

        // Photo covers the frame inside its 1px border
        let inner_width = layout.content_width.saturating_sub(2).max(1);
        let inner_height = layout.frame_height.saturating_sub(2).max(1);
        let mut photo = decoded
            .resize_to_fill(inner_width, inner_height, FilterType::Lanczos3)
            .to_rgba8();
        apply_filter(&mut photo, ops);

        imageops::overlay(&mut canvas, &photo, i64::from(x) + 1, i64::from(y) + 1);
    }

    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, layout.jpeg_quality)
        .encode_image(&rgb)
        .map_err(|e| AppError::RenderFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(jpeg)
}

fn draw_frame(canvas: &mut RgbaImage, layout: &StripLayout, x: u32, y: u32) {
    let right = x + layout.content_width;
    let bottom = y + layout.frame_height;

    for py in y..bottom.min(canvas.height()) {
        for px in x..right.min(canvas.width()) {
            let on_edge = px == x || px + 1 == right || py == y || py + 1 == bottom;
            let color = if on_edge { FRAME_BORDER } else { FRAME_BACKGROUND };
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(color: [u8; 3], width: u32, height: u32) -> EncodedImage {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        EncodedImage::from_bytes("image/png", &buf.into_inner())
    }

    fn rgb_photos() -> Vec<EncodedImage> {
        vec![
            png([255, 0, 0], 64, 48),
            png([0, 255, 0], 40, 80),
            png([0, 0, 255], 30, 30),
        ]
    }

    fn decode(image: &EncodedImage) -> RgbImage {
        image::load_from_memory(&image.decode().unwrap())
            .unwrap()
            .to_rgb8()
    }

    fn close_to(actual: &Rgb<u8>, expected: [u8; 3]) -> bool {
        actual
            .0
            .iter()
            .zip(expected)
            .all(|(a, e)| (i16::from(*a) - i16::from(e)).abs() <= 40)
    }

    #[test]
    fn test_layout_geometry() {
        let layout = StripLayout::default();
        assert_eq!(layout.canvas_size(3), (362, 678));
        assert_eq!(layout.frame_origin(0), (31, 31));
        assert_eq!(layout.frame_origin(2), (31, 447));
        // A short strip still honours the minimum content height
        assert_eq!(layout.canvas_size(1), (362, 662));
    }

    #[tokio::test]
    async fn test_render_produces_jpeg_in_display_order() {
        let renderer = StripRenderer::default();

        let strip = renderer.render(&rgb_photos(), "modern").await.unwrap();
        assert_eq!(strip.mime_type(), "image/jpeg");

        let pixels = decode(&strip);
        assert_eq!(pixels.dimensions(), (362, 678));

        assert!(close_to(pixels.get_pixel(181, 131), [255, 0, 0]));
        assert!(close_to(pixels.get_pixel(181, 339), [0, 255, 0]));
        assert!(close_to(pixels.get_pixel(181, 547), [0, 0, 255]));
        assert!(close_to(pixels.get_pixel(5, 5), [255, 255, 255]));
    }

    #[tokio::test]
    async fn test_vintage_render_is_reproducible() {
        let renderer = StripRenderer::default();

        let first = renderer.render(&rgb_photos(), "vintage").await.unwrap();
        let second = renderer.render(&rgb_photos(), "vintage").await.unwrap();
        let plain = renderer.render(&rgb_photos(), "modern").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, plain);
    }

    #[tokio::test]
    async fn test_unknown_filter_renders_unfiltered() {
        let renderer = StripRenderer::default();

        let unknown = renderer.render(&rgb_photos(), "polaroid").await.unwrap();
        let modern = renderer.render(&rgb_photos(), "modern").await.unwrap();

        assert_eq!(unknown, modern);
    }

    #[tokio::test]
    async fn test_undecodable_photo_fails_render() {
        let renderer = StripRenderer::default();

        let mut photos = rgb_photos();
        photos[1] = EncodedImage::from_bytes("image/png", b"not an image");

        let result = renderer.render(&photos, "retro").await;
        assert!(matches!(result, Err(AppError::RenderFailed(_))));
    }

    #[tokio::test]
    async fn test_render_needs_three_photos() {
        let renderer = StripRenderer::default();

        let result = renderer.render(&rgb_photos()[..2], "retro").await;
        assert!(matches!(
            result,
            Err(AppError::InsufficientPhotos { found: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_render_rejects_surplus_photos() {
        let renderer = StripRenderer::default();
        let mut photos = rgb_photos();
        photos.push(png([9, 9, 9], 8, 8));

        let result = renderer.render(&photos, "retro").await;
        assert!(matches!(result, Err(AppError::RenderFailed(_))));

        let result = renderer.compose(&photos, "retro").await;
        assert!(matches!(result, Err(AppError::RenderFailed(_))));
    }

    #[tokio::test]
    async fn test_compose_keeps_sources() {
        let renderer = StripRenderer::default();
        let photos = rgb_photos();

        let composed = renderer.compose(&photos, "classic").await.unwrap();

        assert_eq!(composed.sources, photos);
        assert_eq!(composed.filter, Some(StripFilter::Classic));
    }
}
