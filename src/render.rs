//! Off-screen prose rendering
//!
//! The PDF path needs the block tree rasterized the way a review screen
//! would paint it: a fixed-width column of typographic prose. That
//! capability sits behind two small traits so the pagination logic stays
//! independent of the rendering backend:
//!
//! - [`Rasterizer::materialize`] builds an off-screen [`Surface`] from the
//!   block tree (layout happens here),
//! - [`Surface::rasterize`] consumes the surface and produces the bitmap.
//!
//! Consuming the surface is the scoped-resource guarantee: whether
//! rasterization succeeds or fails, the surface is destroyed before the
//! exporter returns.
//!
//! The production implementation, [`ProseRasterizer`], draws wrapped text
//! with a system TrueType font and embeds already-inlined images. Images
//! that were never inlined (no `data:` URI) are dropped from rendering,
//! since without the embedded bytes there is nothing to paint.

use std::path::PathBuf;
use std::sync::Arc;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use thiserror::Error;

use crate::blocks::Block;

/// Error type for surface construction and rasterization.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no usable font found (set COURSEFORGE_FONT); tried: {0}")]
    FontNotFound(String),

    #[error("font file unusable: {0}")]
    FontInvalid(String),

    #[error("surface has no drawable content")]
    EmptySurface,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for the off-screen surface.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Logical surface width.
    pub width: u32,
    /// Padding on every edge.
    pub padding: u32,
    /// Pixel density multiplier applied at rasterization.
    pub scale: u32,
    /// Body text size in logical units.
    pub font_size: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            padding: 20,
            scale: 2,
            font_size: 18.0,
        }
    }
}

/// Heading text sizes by level (h1..h6), logical units.
const HEADING_SIZES: [f32; 6] = [34.0, 30.0, 26.0, 22.0, 20.0, 18.0];
const LINE_FACTOR: f32 = 1.4;
const HEADING_GAP_ABOVE: f32 = 12.0;
const HEADING_GAP_BELOW: f32 = 8.0;
const PARAGRAPH_GAP: f32 = 10.0;
const IMAGE_GAP: f32 = 12.0;

/// Something that can materialize a block tree into an off-screen surface.
pub trait Rasterizer {
    type Surface: Surface;

    fn materialize(
        &self,
        blocks: &[Block],
        options: &RenderOptions,
    ) -> Result<Self::Surface, RenderError>;
}

/// An off-screen surface, consumed by rasterization.
pub trait Surface {
    /// Rasterize and destroy the surface. The surface is gone afterwards on
    /// every path, success or error.
    fn rasterize(self) -> Result<RgbaImage, RenderError>;
}

/// One drawing instruction, in logical units.
enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        text: String,
    },
    Image {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
        image: DynamicImage,
    },
}

/// Prose renderer backed by a TrueType font.
pub struct ProseRasterizer {
    font: Arc<FontVec>,
}

impl ProseRasterizer {
    /// Construct with an automatically discovered system font.
    pub fn new() -> Result<Self, RenderError> {
        let path = discover_font()?;
        Self::with_font_path(&path)
    }

    /// Construct with an explicit font file.
    pub fn with_font_path(path: &std::path::Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| RenderError::FontInvalid(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            font: Arc::new(font),
        })
    }

    fn text_width(&self, size: f32, text: &str) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        text.chars()
            .map(|c| scaled.h_advance(self.font.glyph_id(c)))
            .sum()
    }
}

impl Rasterizer for ProseRasterizer {
    type Surface = ProseSurface;

    fn materialize(
        &self,
        blocks: &[Block],
        options: &RenderOptions,
    ) -> Result<ProseSurface, RenderError> {
        let measure = |size: f32, text: &str| self.text_width(size, text);
        let (ops, height) = layout_blocks(blocks, options, &measure);
        Ok(ProseSurface {
            ops,
            width: options.width,
            height,
            scale: options.scale.max(1),
            font: Arc::clone(&self.font),
        })
    }
}

/// The laid-out off-screen surface of the prose renderer.
pub struct ProseSurface {
    ops: Vec<DrawOp>,
    width: u32,
    height: u32,
    scale: u32,
    font: Arc<FontVec>,
}

impl Surface for ProseSurface {
    fn rasterize(self) -> Result<RgbaImage, RenderError> {
        if self.ops.is_empty() || self.height == 0 {
            return Err(RenderError::EmptySurface);
        }

        let scale = self.scale;
        let mut canvas = RgbaImage::from_pixel(
            self.width * scale,
            self.height * scale,
            Rgba([255, 255, 255, 255]),
        );
        let ink = Rgba([17, 17, 17, 255]);

        for op in &self.ops {
            match op {
                DrawOp::Text { x, y, size, text } => {
                    draw_text_mut(
                        &mut canvas,
                        ink,
                        (x * scale as f32) as i32,
                        (y * scale as f32) as i32,
                        PxScale::from(size * scale as f32),
                        self.font.as_ref(),
                        text,
                    );
                }
                DrawOp::Image {
                    x,
                    y,
                    width,
                    height,
                    image,
                } => {
                    let resized = image::imageops::resize(
                        image,
                        width * scale,
                        height * scale,
                        image::imageops::FilterType::Triangle,
                    );
                    image::imageops::overlay(
                        &mut canvas,
                        &resized,
                        (*x * scale as f32) as i64,
                        (*y * scale as f32) as i64,
                    );
                }
            }
        }

        Ok(canvas)
    }
}

/// Lay out the block tree into drawing instructions, returning the total
/// surface height. Pure over the `measure` function so tests can supply
/// fixed metrics.
fn layout_blocks(
    blocks: &[Block],
    options: &RenderOptions,
    measure: &dyn Fn(f32, &str) -> f32,
) -> (Vec<DrawOp>, u32) {
    let content_width = (options.width.saturating_sub(options.padding * 2)) as f32;
    let x = options.padding as f32;
    let mut y = options.padding as f32;
    let mut ops = Vec::new();

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = HEADING_SIZES[(*level).clamp(1, 6) as usize - 1];
                y += HEADING_GAP_ABOVE;
                for line in wrap_text(text, content_width, &|t| measure(size, t)) {
                    ops.push(DrawOp::Text {
                        x,
                        y,
                        size,
                        text: line,
                    });
                    y += size * LINE_FACTOR;
                }
                y += HEADING_GAP_BELOW;
            }
            Block::Paragraph { text } => {
                let size = options.font_size;
                for line in wrap_text(text, content_width, &|t| measure(size, t)) {
                    ops.push(DrawOp::Text {
                        x,
                        y,
                        size,
                        text: line,
                    });
                    y += size * LINE_FACTOR;
                }
                y += PARAGRAPH_GAP;
            }
            Block::Image { src, .. } => {
                let Some(image) = decode_data_uri(src) else {
                    log::debug!("dropping non-inlined image from rendering");
                    continue;
                };
                let (native_w, native_h) = (image.width(), image.height());
                if native_w == 0 || native_h == 0 {
                    continue;
                }
                let draw_w = (native_w as f32).min(content_width);
                let draw_h = draw_w * native_h as f32 / native_w as f32;
                ops.push(DrawOp::Image {
                    x,
                    y,
                    width: draw_w as u32,
                    height: draw_h.max(1.0) as u32,
                    image,
                });
                y += draw_h + IMAGE_GAP;
            }
        }
    }

    let height = if ops.is_empty() {
        0
    } else {
        (y + options.padding as f32).ceil() as u32
    };
    (ops, height)
}

/// Greedy word wrap against a measured width.
fn wrap_text(text: &str, max_width: f32, measure: &dyn Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure(&candidate) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Decode a `data:<mime>;base64,<payload>` URI into an image.
fn decode_data_uri(src: &str) -> Option<DynamicImage> {
    let payload = src.strip_prefix("data:")?.split_once("base64,")?.1;
    let bytes = BASE64.decode(payload.as_bytes()).ok()?;
    image::load_from_memory(&bytes).ok()
}

/// Candidate font locations, tried in order. `COURSEFORGE_FONT` wins.
fn discover_font() -> Result<PathBuf, RenderError> {
    if let Ok(explicit) = std::env::var("COURSEFORGE_FONT") {
        return Ok(PathBuf::from(explicit));
    }

    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    for candidate in CANDIDATES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(RenderError::FontNotFound(CANDIDATES.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10 units per character, independent of size.
    fn char_measure(_size: f32, text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    fn options() -> RenderOptions {
        RenderOptions {
            width: 140,
            padding: 20,
            scale: 1,
            font_size: 18.0,
        }
    }

    #[test]
    fn test_wrap_text_breaks_on_width() {
        let measure = |t: &str| t.chars().count() as f32 * 10.0;
        let lines = wrap_text("one two three four", 90.0, &measure);
        // "one two" is 70 units, adding " three" overflows.
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_wrap_text_never_drops_overlong_word() {
        let measure = |t: &str| t.chars().count() as f32 * 10.0;
        let lines = wrap_text("supercalifragilistic", 50.0, &measure);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }

    #[test]
    fn test_layout_skips_non_inlined_images() {
        let blocks = vec![
            Block::Paragraph {
                text: "body".into(),
            },
            Block::Image {
                src: "https://example.com/a.png".into(),
                alt: None,
            },
        ];
        let (ops, height) = layout_blocks(&blocks, &options(), &char_measure);
        assert_eq!(ops.len(), 1);
        assert!(height > 0);
    }

    #[test]
    fn test_layout_empty_tree_is_zero_height() {
        let (ops, height) = layout_blocks(&[], &options(), &char_measure);
        assert!(ops.is_empty());
        assert_eq!(height, 0);
    }

    #[test]
    fn test_heading_lines_stack_downward() {
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Title".into(),
            },
            Block::Paragraph {
                text: "body".into(),
            },
        ];
        let (ops, _) = layout_blocks(&blocks, &options(), &char_measure);
        let ys: Vec<f32> = ops
            .iter()
            .map(|op| match op {
                DrawOp::Text { y, .. } => *y,
                DrawOp::Image { y, .. } => *y,
            })
            .collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_decode_data_uri_round_trip() {
        let mut png = Vec::new();
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        DynamicImage::ImageRgba8(source)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uri = format!("data:image/png;base64,{}", BASE64.encode(&png));

        let decoded = decode_data_uri(&uri).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_decode_data_uri_rejects_remote_and_garbage() {
        assert!(decode_data_uri("https://example.com/a.png").is_none());
        assert!(decode_data_uri("data:image/png;base64,@@@@").is_none());
    }

    #[test]
    fn test_layout_embeds_inlined_image_scaled_to_column() {
        let mut png = Vec::new();
        let source = RgbaImage::from_pixel(400, 100, Rgba([0, 0, 0, 255]));
        DynamicImage::ImageRgba8(source)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uri = format!("data:image/png;base64,{}", BASE64.encode(&png));

        let blocks = vec![Block::Image { src: uri, alt: None }];
        // Content width is 140 - 2*20 = 100; the 400px image scales to 100x25.
        let (ops, _) = layout_blocks(&blocks, &options(), &char_measure);
        match &ops[0] {
            DrawOp::Image { width, height, .. } => {
                assert_eq!((*width, *height), (100, 25));
            }
            other => panic!("expected image op, got text {:?}", matches!(other, DrawOp::Text { .. })),
        }
    }
}
