//! Paginated rasterized PDF export
//!
//! The block tree is rendered off-screen as one tall bitmap, the bitmap is
//! scaled to the page width, and consecutive page-height windows of it are
//! placed on successive pages by shifting the same image upward. Content
//! that fits one page yields one page; content exactly `k` pages tall
//! yields exactly `k` pages, never a trailing blank.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};

use crate::blocks::Block;
use crate::export::{sanitize_topic, ExportError};
use crate::render::{ProseRasterizer, Rasterizer, RenderOptions, Surface};

/// A4 portrait.
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// Result of a PDF export.
#[derive(Debug)]
pub struct PdfExport {
    pub path: PathBuf,
    pub pages: usize,
}

/// The PDF exporter, generic over the rendering backend.
pub struct PdfExporter<R: Rasterizer> {
    rasterizer: R,
    options: RenderOptions,
}

impl PdfExporter<ProseRasterizer> {
    /// Exporter with the system-font prose renderer and default surface
    /// geometry.
    pub fn new() -> Result<Self, ExportError> {
        Ok(Self {
            rasterizer: ProseRasterizer::new()?,
            options: RenderOptions::default(),
        })
    }
}

impl<R: Rasterizer> PdfExporter<R> {
    pub fn with_rasterizer(rasterizer: R, options: RenderOptions) -> Self {
        Self {
            rasterizer,
            options,
        }
    }

    /// Export `blocks` as `<sanitized topic>.pdf` under `out_dir`.
    pub fn export(
        &self,
        blocks: &[Block],
        topic: &str,
        out_dir: &Path,
    ) -> Result<PdfExport, ExportError> {
        // The surface is consumed by rasterize(): destroyed on success and
        // on failure alike before this function returns.
        let surface = self.rasterizer.materialize(blocks, &self.options)?;
        let bitmap = surface.rasterize()?;

        let (px_width, px_height) = bitmap.dimensions();
        let image_height_mm = px_height as f64 * PAGE_WIDTH_MM / px_width as f64;
        let offsets = page_offsets(image_height_mm, PAGE_HEIGHT_MM);

        // Scale so the bitmap's width spans exactly the page width.
        let dpi = px_width as f64 * 25.4 / PAGE_WIDTH_MM;
        let raw_rgb = DynamicImage::ImageRgba8(bitmap).to_rgb8().into_raw();

        let (doc, first_page, first_layer) = PdfDocument::new(
            topic,
            Mm(PAGE_WIDTH_MM as f32),
            Mm(PAGE_HEIGHT_MM as f32),
            "content",
        );

        for (index, offset) in offsets.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "content");
                doc.get_page(page).get_layer(layer)
            };

            let xobject = ImageXObject {
                width: Px(px_width as usize),
                height: Px(px_height as usize),
                color_space: ColorSpace::Rgb,
                bits_per_component: ColorBits::Bit8,
                interpolate: true,
                image_data: raw_rgb.clone(),
                image_filter: None,
                smask: None,
                clipping_bbox: None,
            };

            // PDF user space is bottom-up: shifting the image's bottom edge
            // down by the cumulative offset exposes the next window.
            let translate_y = PAGE_HEIGHT_MM - image_height_mm + offset;
            Image::from(xobject).add_to_layer(
                layer,
                ImageTransform {
                    translate_x: Some(Mm(0.0)),
                    translate_y: Some(Mm(translate_y as f32)),
                    dpi: Some(dpi as f32),
                    ..Default::default()
                },
            );
        }

        let path = out_dir.join(format!("{}.pdf", sanitize_topic(topic)));
        let file = File::create(&path)?;
        if let Err(e) = doc.save(&mut BufWriter::new(file)) {
            // No partial file survives a failed save.
            let _ = std::fs::remove_file(&path);
            return Err(ExportError::Pdf(e.to_string()));
        }

        Ok(PdfExport {
            path,
            pages: offsets.len(),
        })
    }
}

/// Vertical window offsets for slicing an image of `total_height` into
/// pages of `page_height`: one entry per emitted page, each the cumulative
/// upward shift. Strictly-positive remaining height drives the loop, so an
/// exact multiple never yields a trailing blank page.
pub fn page_offsets(total_height: f64, page_height: f64) -> Vec<f64> {
    let mut offsets = vec![0.0];
    let mut offset = 0.0;
    let mut remaining = total_height - page_height;
    while remaining > 0.0 {
        offset += page_height;
        offsets.push(offset);
        remaining -= page_height;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, Surface};
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_page_offsets_short_content_single_page() {
        assert_eq!(page_offsets(100.0, 297.0), vec![0.0]);
    }

    #[test]
    fn test_page_offsets_exact_multiple_no_trailing_blank() {
        let offsets = page_offsets(297.0 * 3.0, 297.0);
        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets, vec![0.0, 297.0, 594.0]);
    }

    #[test]
    fn test_page_offsets_partial_last_page() {
        let offsets = page_offsets(297.0 * 2.0 + 1.0, 297.0);
        assert_eq!(offsets.len(), 3);
    }

    #[test]
    fn test_page_offsets_exactly_one_page() {
        assert_eq!(page_offsets(297.0, 297.0).len(), 1);
    }

    /// Backend stub: a blank surface of fixed pixel height.
    struct StubRasterizer {
        height: u32,
    }
    struct StubSurface {
        height: u32,
    }

    impl Rasterizer for StubRasterizer {
        type Surface = StubSurface;
        fn materialize(
            &self,
            _blocks: &[Block],
            _options: &RenderOptions,
        ) -> Result<StubSurface, RenderError> {
            Ok(StubSurface {
                height: self.height,
            })
        }
    }

    impl Surface for StubSurface {
        fn rasterize(self) -> Result<RgbaImage, RenderError> {
            if self.height == 0 {
                return Err(RenderError::EmptySurface);
            }
            Ok(RgbaImage::from_pixel(
                1600,
                self.height,
                Rgba([255, 255, 255, 255]),
            ))
        }
    }

    fn export_with_height(height: u32) -> PdfExport {
        let tmpdir = tempfile::tempdir().unwrap();
        let exporter =
            PdfExporter::with_rasterizer(StubRasterizer { height }, RenderOptions::default());
        let result = exporter
            .export(&[], "Stub Course", tmpdir.path())
            .unwrap();
        assert!(result.path.exists());
        result
    }

    #[test]
    fn test_export_single_page() {
        // 1600px wide surface: one page is 1600 * 297/210 ≈ 2263px tall.
        let result = export_with_height(1000);
        assert_eq!(result.pages, 1);
        assert!(result.path.ends_with("Stub_Course.pdf"));
    }

    #[test]
    fn test_export_multi_page() {
        let result = export_with_height(5000);
        assert_eq!(result.pages, 3);
    }

    #[test]
    fn test_export_empty_surface_fails_cleanly() {
        let tmpdir = tempfile::tempdir().unwrap();
        let exporter =
            PdfExporter::with_rasterizer(StubRasterizer { height: 0 }, RenderOptions::default());
        let err = exporter.export(&[], "Stub Course", tmpdir.path()).unwrap_err();
        assert!(matches!(err, ExportError::Render(RenderError::EmptySurface)));
        // No partial file was created.
        assert!(!tmpdir.path().join("Stub_Course.pdf").exists());
    }
}
