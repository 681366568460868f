//! Structural PPTX export
//!
//! Walks the block tree in document order and greedily packs blocks onto
//! fixed-height slides: a running vertical cursor advances by a fixed
//! allowance per block kind, and a new slide starts when the cursor has
//! passed the overflow threshold *before* the next block is placed. No
//! text is measured; the fixed allowances trade layout precision for
//! determinism.
//!
//! The packed deck is then serialized as a self-contained OOXML package:
//! presentation, master, layout and theme parts, one slide part per packed
//! slide, and media parts decoded from the inlined `data:` image URIs.

use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use quick_xml::escape::escape;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::blocks::Block;
use crate::export::{sanitize_topic, ExportError};

/// English Metric Units per inch.
const EMU_PER_INCH: f64 = 914_400.0;

/// Wide layout: 13.333in x 7.5in, in canonical EMU.
const SLIDE_WIDTH_EMU: i64 = 12_192_000;
const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

/// Packing thresholds and allowances, in inches. The defaults reproduce
/// the review screen's deck geometry; tests tighten them to force
/// overflow with little content.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Cursor position at the top of a fresh slide.
    pub cursor_start: f64,
    /// Past this cursor position, the next block starts a new slide.
    pub overflow_limit: f64,
    /// Past this cursor position, the next *image* starts a new slide.
    pub image_limit: f64,
    pub heading_advance: f64,
    pub paragraph_advance: f64,
    pub image_advance: f64,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            cursor_start: 0.5,
            overflow_limit: 6.0,
            image_limit: 3.5,
            heading_advance: 1.0,
            paragraph_advance: 0.75,
            image_advance: 5.0,
        }
    }
}

/// One placed element on a content slide. Positions are inches from the
/// slide's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideElement {
    Text {
        text: String,
        y: f64,
        bold: bool,
        /// Font size in points.
        size: u32,
    },
    Picture {
        data_uri: String,
        y: f64,
    },
}

/// A packed content slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideSpec {
    pub elements: Vec<SlideElement>,
}

/// Greedily pack blocks onto content slides.
///
/// The overflow check runs before each block is placed, so a block that
/// would overflow lands at the top of a fresh slide rather than past the
/// bottom of the current one. Images carry an earlier threshold of their
/// own. Images that were never inlined have no bytes to embed and are
/// dropped from packing without consuming any cursor allowance.
pub fn pack_blocks(blocks: &[Block], options: &PackOptions) -> Vec<SlideSpec> {
    let mut slides = Vec::new();
    let mut current = SlideSpec::default();
    let mut cursor = options.cursor_start;

    for block in blocks {
        if cursor > options.overflow_limit {
            slides.push(std::mem::take(&mut current));
            cursor = options.cursor_start;
        }
        match block {
            Block::Heading { text, .. } => {
                current.elements.push(SlideElement::Text {
                    text: text.clone(),
                    y: cursor,
                    bold: true,
                    size: 24,
                });
                cursor += options.heading_advance;
            }
            Block::Paragraph { text } => {
                current.elements.push(SlideElement::Text {
                    text: text.clone(),
                    y: cursor,
                    bold: false,
                    size: 16,
                });
                cursor += options.paragraph_advance;
            }
            Block::Image { src, .. } => {
                if !src.starts_with("data:") {
                    log::debug!("dropping non-inlined image from deck");
                    continue;
                }
                if cursor > options.image_limit {
                    slides.push(std::mem::take(&mut current));
                    cursor = options.cursor_start;
                }
                current.elements.push(SlideElement::Picture {
                    data_uri: src.clone(),
                    y: cursor,
                });
                cursor += options.image_advance;
            }
        }
    }
    slides.push(current);

    slides
}

/// Result of a PPTX export.
#[derive(Debug)]
pub struct PptxExport {
    pub path: PathBuf,
    /// Total slides, title slide included.
    pub slides: usize,
}

/// The PPTX exporter.
#[derive(Debug, Default)]
pub struct PptxExporter {
    pack: PackOptions,
}

impl PptxExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(pack: PackOptions) -> Self {
        Self { pack }
    }

    /// Export `blocks` as `<sanitized topic>.pptx` under `out_dir`: a title
    /// slide followed by the packed content slides. On any serialization
    /// failure the partially written file is removed; no partial deck
    /// survives.
    pub fn export(
        &self,
        blocks: &[Block],
        topic: &str,
        out_dir: &Path,
    ) -> Result<PptxExport, ExportError> {
        let packed = pack_blocks(blocks, &self.pack);
        let path = out_dir.join(format!("{}.pptx", sanitize_topic(topic)));

        match write_deck(&path, topic, &packed) {
            Ok(()) => Ok(PptxExport {
                path,
                slides: packed.len() + 1,
            }),
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }
}

/// Decoded media part waiting to be written under `ppt/media/`.
struct MediaPart {
    file_name: String,
    bytes: Vec<u8>,
}

/// Everything a slide part needs besides its own XML.
struct SlidePart {
    xml: String,
    rels: String,
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_OFFICE_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Serialize the full deck to `path`. Parts are assembled in memory first,
/// so a failure during assembly leaves no file at all.
fn write_deck(path: &Path, topic: &str, packed: &[SlideSpec]) -> Result<(), ExportError> {
    let mut media: Vec<MediaPart> = Vec::new();
    let mut slide_parts: Vec<SlidePart> = Vec::new();

    slide_parts.push(title_slide_part(topic));
    for spec in packed {
        slide_parts.push(content_slide_part(spec, &mut media));
    }

    let file = std::fs::File::create(path)?;
    let mut zip = ZipWriter::new(std::io::BufWriter::new(file));
    let zip_options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let put = |zip: &mut ZipWriter<_>, name: &str, body: &[u8]| -> Result<(), ExportError> {
        zip.start_file(name, zip_options)
            .map_err(|e| ExportError::Deck(e.to_string()))?;
        zip.write_all(body)?;
        Ok(())
    };

    put(&mut zip, "[Content_Types].xml", content_types(slide_parts.len(), &media).as_bytes())?;
    put(&mut zip, "_rels/.rels", root_rels().as_bytes())?;
    put(&mut zip, "ppt/presentation.xml", presentation_xml(slide_parts.len()).as_bytes())?;
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(slide_parts.len()).as_bytes(),
    )?;
    put(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master_xml().as_bytes())?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        slide_master_rels().as_bytes(),
    )?;
    put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout_xml().as_bytes())?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        slide_layout_rels().as_bytes(),
    )?;
    put(&mut zip, "ppt/theme/theme1.xml", theme_xml().as_bytes())?;

    for (index, part) in slide_parts.iter().enumerate() {
        put(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", index + 1),
            part.xml.as_bytes(),
        )?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", index + 1),
            part.rels.as_bytes(),
        )?;
    }

    for part in &media {
        put(
            &mut zip,
            &format!("ppt/media/{}", part.file_name),
            &part.bytes,
        )?;
    }

    let mut inner = zip.finish().map_err(|e| ExportError::Deck(e.to_string()))?;
    inner.flush()?;
    Ok(())
}

/// Title slide: the topic, large, bold, centered.
fn title_slide_part(topic: &str) -> SlidePart {
    let mut shapes = String::new();
    shapes.push_str(&text_shape_xml(
        2,
        topic,
        0.5,
        2.5,
        12.0,
        1.0,
        44,
        true,
        true,
    ));
    SlidePart {
        xml: slide_xml(&shapes),
        rels: slide_rels(&[]),
    }
}

/// A packed content slide: text boxes and pictures at their cursor
/// positions. Pictures whose payload cannot be decoded are dropped here,
/// with a warning; a broken image never sinks the whole deck.
fn content_slide_part(spec: &SlideSpec, media: &mut Vec<MediaPart>) -> SlidePart {
    let mut shapes = String::new();
    let mut image_targets: Vec<String> = Vec::new();
    let mut shape_id = 2u32;

    for element in &spec.elements {
        match element {
            SlideElement::Text {
                text,
                y,
                bold,
                size,
            } => {
                let height = if *bold { 1.0 } else { 0.75 };
                shapes.push_str(&text_shape_xml(
                    shape_id, text, 0.5, *y, 12.0, height, *size, *bold, false,
                ));
                shape_id += 1;
            }
            SlideElement::Picture { data_uri, y } => {
                let Some((bytes, extension)) = decode_media(data_uri) else {
                    log::warn!("dropping undecodable image from deck");
                    continue;
                };
                let Some((cx, cy, x_off, y_off)) = contain_box(&bytes) else {
                    log::warn!("dropping unreadable image from deck");
                    continue;
                };
                let file_name = format!("image{}.{}", media.len() + 1, extension);
                media.push(MediaPart {
                    file_name: file_name.clone(),
                    bytes,
                });
                // rId1 is the layout; images start at rId2.
                let r_id = format!("rId{}", image_targets.len() + 2);
                image_targets.push(format!("../media/{}", file_name));
                shapes.push_str(&picture_xml(
                    shape_id,
                    &r_id,
                    1.0 + x_off,
                    *y + y_off,
                    cx,
                    cy,
                ));
                shape_id += 1;
            }
        }
    }

    SlidePart {
        xml: slide_xml(&shapes),
        rels: slide_rels(&image_targets),
    }
}

/// Split a `data:` URI into payload bytes and a media file extension.
fn decode_media(data_uri: &str) -> Option<(Vec<u8>, &'static str)> {
    let rest = data_uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = BASE64.decode(payload.as_bytes()).ok()?;
    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/gif" => "gif",
        _ => return None,
    };
    Some((bytes, extension))
}

/// "Contain" an image inside the fixed 8in x 4.5in box: scale to fit while
/// preserving aspect, centered. Returns (width, height, x offset, y offset)
/// in inches.
fn contain_box(bytes: &[u8]) -> Option<(f64, f64, f64, f64)> {
    const BOX_W: f64 = 8.0;
    const BOX_H: f64 = 4.5;

    let (px_w, px_h) = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    if px_w == 0 || px_h == 0 {
        return None;
    }

    let scale = (BOX_W / px_w as f64).min(BOX_H / px_h as f64);
    let w = px_w as f64 * scale;
    let h = px_h as f64 * scale;
    Some((w, h, (BOX_W - w) / 2.0, (BOX_H - h) / 2.0))
}

#[allow(clippy::too_many_arguments)]
fn text_shape_xml(
    id: u32,
    text: &str,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    size_pt: u32,
    bold: bool,
    centered: bool,
) -> String {
    let bold_attr = if bold { " b=\"1\"" } else { "" };
    let p_pr = if centered { "<a:pPr algn=\"ctr\"/>" } else { "" };
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"TextBox {id}\"/>\
         <p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
         <p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
         <p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"/><a:lstStyle/>\
         <a:p>{p_pr}<a:r><a:rPr lang=\"en-US\" sz=\"{sz}\"{bold_attr} dirty=\"0\"/>\
         <a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>",
        id = id,
        x = emu(x),
        y = emu(y),
        cx = emu(w),
        cy = emu(h),
        sz = size_pt * 100,
        bold_attr = bold_attr,
        p_pr = p_pr,
        text = escape(text),
    )
}

fn picture_xml(id: u32, r_id: &str, x: f64, y: f64, w: f64, h: f64) -> String {
    format!(
        "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"Picture {id}\"/>\
         <p:cNvPicPr/><p:nvPr/></p:nvPicPr>\
         <p:blipFill><a:blip r:embed=\"{r_id}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>\
         <p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>",
        id = id,
        r_id = r_id,
        x = emu(x),
        y = emu(y),
        cx = emu(w),
        cy = emu(h),
    )
}

fn slide_xml(shapes: &str) -> String {
    format!(
        "{XML_DECL}<p:sld xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
         <p:cSld><p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
         <a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
         {shapes}\
         </p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
    )
}

fn slide_rels(image_targets: &[String]) -> String {
    let mut rels = String::from(XML_DECL);
    rels.push_str(
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    rels.push_str(&format!(
        "<Relationship Id=\"rId1\" Type=\"{REL_LAYOUT}\" Target=\"../slideLayouts/slideLayout1.xml\"/>"
    ));
    for (index, target) in image_targets.iter().enumerate() {
        rels.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{REL_IMAGE}\" Target=\"{}\"/>",
            index + 2,
            escape(target),
        ));
    }
    rels.push_str("</Relationships>");
    rels
}

fn content_types(slide_count: usize, media: &[MediaPart]) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str(
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    );
    let mut extensions: Vec<&str> = media.iter().map(|m| ext_of(&m.file_name)).collect();
    extensions.sort_unstable();
    extensions.dedup();
    for extension in extensions {
        let mime = match extension {
            "png" => "image/png",
            "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            _ => continue,
        };
        out.push_str(&format!(
            "<Default Extension=\"{extension}\" ContentType=\"{mime}\"/>"
        ));
    }
    out.push_str(
        "<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
         <Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
         <Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
         <Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>",
    );
    for index in 1..=slide_count {
        out.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{index}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        ));
    }
    out.push_str("</Types>");
    out
}

fn ext_of(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or("")
}

fn root_rels() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{REL_OFFICE_DOC}\" Target=\"ppt/presentation.xml\"/>\
         </Relationships>"
    )
}

fn presentation_xml(slide_count: usize) -> String {
    let mut slide_ids = String::new();
    for index in 0..slide_count {
        // rId1 is the master; slides follow.
        slide_ids.push_str(&format!(
            "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
            256 + index,
            index + 2
        ));
    }
    format!(
        "{XML_DECL}<p:presentation xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
         <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
         <p:sldIdLst>{slide_ids}</p:sldIdLst>\
         <p:sldSz cx=\"{SLIDE_WIDTH_EMU}\" cy=\"{SLIDE_HEIGHT_EMU}\"/>\
         <p:notesSz cx=\"6858000\" cy=\"9144000\"/></p:presentation>"
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut rels = String::from(XML_DECL);
    rels.push_str(
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    rels.push_str(&format!(
        "<Relationship Id=\"rId1\" Type=\"{REL_MASTER}\" Target=\"slideMasters/slideMaster1.xml\"/>"
    ));
    for index in 0..slide_count {
        rels.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{REL_SLIDE}\" Target=\"slides/slide{}.xml\"/>",
            index + 2,
            index + 1
        ));
    }
    rels.push_str("</Relationships>");
    rels
}

fn slide_master_xml() -> String {
    format!(
        "{XML_DECL}<p:sldMaster xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
         <p:cSld><p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr/></p:spTree></p:cSld>\
         <p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" \
         accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" \
         accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
         <p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>\
         </p:sldMaster>"
    )
}

fn slide_master_rels() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{REL_LAYOUT}\" Target=\"../slideLayouts/slideLayout1.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"{REL_THEME}\" Target=\"../theme/theme1.xml\"/>\
         </Relationships>"
    )
}

fn slide_layout_xml() -> String {
    format!(
        "{XML_DECL}<p:sldLayout xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" \
         type=\"blank\" preserve=\"1\">\
         <p:cSld name=\"Blank\"><p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr/></p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
    )
}

fn slide_layout_rels() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{REL_MASTER}\" Target=\"../slideMasters/slideMaster1.xml\"/>\
         </Relationships>"
    )
}

fn theme_xml() -> String {
    format!(
        "{XML_DECL}<a:theme xmlns:a=\"{NS_A}\" name=\"Office\"><a:themeElements>\
         <a:clrScheme name=\"Office\">\
         <a:dk1><a:sysClr val=\"windowText\" lastClr=\"000000\"/></a:dk1>\
         <a:lt1><a:sysClr val=\"window\" lastClr=\"FFFFFF\"/></a:lt1>\
         <a:dk2><a:srgbClr val=\"44546A\"/></a:dk2><a:lt2><a:srgbClr val=\"E7E6E6\"/></a:lt2>\
         <a:accent1><a:srgbClr val=\"4472C4\"/></a:accent1>\
         <a:accent2><a:srgbClr val=\"ED7D31\"/></a:accent2>\
         <a:accent3><a:srgbClr val=\"A5A5A5\"/></a:accent3>\
         <a:accent4><a:srgbClr val=\"FFC000\"/></a:accent4>\
         <a:accent5><a:srgbClr val=\"5B9BD5\"/></a:accent5>\
         <a:accent6><a:srgbClr val=\"70AD47\"/></a:accent6>\
         <a:hlink><a:srgbClr val=\"0563C1\"/></a:hlink>\
         <a:folHlink><a:srgbClr val=\"954F72\"/></a:folHlink>\
         </a:clrScheme>\
         <a:fontScheme name=\"Office\">\
         <a:majorFont><a:latin typeface=\"Calibri Light\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
         <a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
         </a:fontScheme>\
         <a:fmtScheme name=\"Office\">\
         <a:fillStyleLst><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
         <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
         <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:fillStyleLst>\
         <a:lnStyleLst>\
         <a:ln w=\"6350\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
         <a:ln w=\"12700\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
         <a:ln w=\"19050\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
         </a:lnStyleLst>\
         <a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle>\
         <a:effectStyle><a:effectLst/></a:effectStyle>\
         <a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>\
         <a:bgFillStyleLst><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
         <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
         <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:bgFillStyleLst>\
         </a:fmtScheme></a:themeElements></a:theme>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn paragraph(text: &str) -> Block {
        Block::Paragraph { text: text.into() }
    }

    fn tight_options() -> PackOptions {
        PackOptions {
            cursor_start: 0.5,
            overflow_limit: 2.0,
            image_limit: 1.0,
            heading_advance: 1.0,
            paragraph_advance: 0.75,
            image_advance: 5.0,
        }
    }

    fn png_data_uri(width: u32, height: u32) -> String {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([5, 5, 5, 255])))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(&png))
    }

    #[test]
    fn test_pack_overflow_starts_slide_before_block() {
        // Cursor after heading + 3 paragraphs: 0.5+1.0+0.75*3 = 3.75 > 3.0,
        // so the fourth paragraph must open slide 2.
        let options = PackOptions {
            overflow_limit: 3.0,
            ..tight_options()
        };
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Intro".into(),
            },
            paragraph("one"),
            paragraph("two"),
            paragraph("three"),
            paragraph("four"),
        ];
        let slides = pack_blocks(&blocks, &options);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].elements.len(), 4);
        match &slides[1].elements[0] {
            SlideElement::Text { text, y, .. } => {
                assert_eq!(text, "four");
                assert_eq!(*y, 0.5);
            }
            other => panic!("expected text at top of slide 2, got {:?}", other),
        }
    }

    #[test]
    fn test_pack_image_threshold_forces_new_slide_early() {
        // Cursor after two paragraphs is 0.5+0.75*2 = 2.0: below the generic
        // limit, past the image limit.
        let options = PackOptions {
            overflow_limit: 6.0,
            image_limit: 1.5,
            ..tight_options()
        };
        let blocks = vec![
            paragraph("one"),
            paragraph("two"),
            Block::Image {
                src: "data:image/png;base64,AAAA".into(),
                alt: None,
            },
        ];
        let slides = pack_blocks(&blocks, &options);
        assert_eq!(slides.len(), 2);
        assert!(matches!(
            slides[1].elements[0],
            SlideElement::Picture { .. }
        ));
    }

    #[test]
    fn test_pack_drops_non_inlined_images_without_cursor_cost() {
        let blocks = vec![
            paragraph("one"),
            Block::Image {
                src: "https://example.com/a.png".into(),
                alt: None,
            },
            paragraph("two"),
        ];
        let slides = pack_blocks(&blocks, &PackOptions::default());
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].elements.len(), 2);
        match &slides[0].elements[1] {
            SlideElement::Text { y, .. } => assert_eq!(*y, 0.5 + 0.75),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_pack_empty_tree_yields_one_empty_slide() {
        let slides = pack_blocks(&[], &PackOptions::default());
        assert_eq!(slides.len(), 1);
        assert!(slides[0].elements.is_empty());
    }

    #[test]
    fn test_contain_box_centers_wide_image() {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(800, 100, Rgba([0, 0, 0, 255])))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let (w, h, x_off, y_off) = contain_box(&png).unwrap();
        assert!((w - 8.0).abs() < 1e-9);
        assert!((h - 1.0).abs() < 1e-9);
        assert!((x_off - 0.0).abs() < 1e-9);
        assert!((y_off - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_export_writes_well_formed_package() {
        let tmpdir = tempfile::tempdir().unwrap();
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Rust & Safety".into(),
            },
            paragraph("Ownership prevents data races."),
            Block::Image {
                src: png_data_uri(16, 16),
                alt: Some("tiny".into()),
            },
        ];
        let result = PptxExporter::new()
            .export(&blocks, "Rust Basics", tmpdir.path())
            .unwrap();
        assert_eq!(result.slides, 2);
        assert!(result.path.ends_with("Rust_Basics.pptx"));

        let file = std::fs::File::open(&result.path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/media/image1.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {}", name);
        }
    }

    #[test]
    fn test_export_escapes_markup_in_text() {
        let tmpdir = tempfile::tempdir().unwrap();
        let blocks = vec![paragraph("a < b && b > c")];
        let result = PptxExporter::new()
            .export(&blocks, "Operators", tmpdir.path())
            .unwrap();

        let file = std::fs::File::open(&result.path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut xml = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("ppt/slides/slide2.xml").unwrap(),
            &mut xml,
        )
        .unwrap();
        assert!(xml.contains("a &lt; b &amp;&amp; b &gt; c"));
    }

    #[test]
    fn test_tightened_thresholds_split_demo_shaped_content() {
        // One heading, three paragraphs and an image, with thresholds set so
        // the paragraphs alone exceed capacity: at least two content slides
        // plus the title slide.
        let tmpdir = tempfile::tempdir().unwrap();
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Intro".into(),
            },
            paragraph("one"),
            paragraph("two"),
            paragraph("three"),
            Block::Image {
                src: png_data_uri(8, 8),
                alt: None,
            },
        ];
        let result = PptxExporter::with_options(tight_options())
            .export(&blocks, "Split Course", tmpdir.path())
            .unwrap();
        assert!(result.slides >= 3, "expected >= 2 content slides, got {}", result.slides - 1);
    }
}
