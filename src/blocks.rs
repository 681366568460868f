//! Restricted rich-text block model
//!
//! Lesson content travels as a restricted HTML subset: a flat sequence of
//! headings (`h1`..`h6`), paragraphs and images. This module parses that
//! subset into a block tree and serializes it back. The parser is tolerant
//! the way the content producers are sloppy: unclosed `<img>` tags, raw `&`
//! in attribute values and unknown inline markup are all accepted; inline
//! tags inside a heading or paragraph contribute their text content only.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A top-level block of lesson content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Image { src: String, alt: Option<String> },
}

impl Block {
    /// True for image blocks whose source is already a self-contained
    /// `data:` URI.
    pub fn is_inlined_image(&self) -> bool {
        matches!(self, Block::Image { src, .. } if src.starts_with("data:"))
    }
}

/// Parse lesson content into its block sequence.
///
/// Never fails: markup errors end the scan and whatever parsed so far is
/// returned, matching the always-renderable contract of the review screen.
pub fn parse_blocks(html: &str) -> Vec<Block> {
    let mut reader = Reader::from_str(html);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut blocks = Vec::new();
    // Some(level) while inside a heading, Some(0) while inside a paragraph.
    let mut open_block: Option<u8> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" => {
                        flush(&mut blocks, &mut open_block, &mut text);
                        open_block = Some(name[1] - b'0');
                    }
                    b"p" => {
                        flush(&mut blocks, &mut open_block, &mut text);
                        open_block = Some(0);
                    }
                    b"img" => {
                        flush(&mut blocks, &mut open_block, &mut text);
                        // An image without a source cannot be rendered or
                        // inlined; skip it rather than carry a hollow block.
                        if let Some(src) = attr_value(e, b"src") {
                            blocks.push(Block::Image {
                                src,
                                alt: attr_value(e, b"alt"),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if open_block.is_some() {
                    let chunk = match e.unescape() {
                        Ok(t) => t.into_owned(),
                        // Keep the raw bytes when strict unescaping fails.
                        Err(_) => String::from_utf8_lossy(e).into_owned(),
                    };
                    if !text.is_empty() && !chunk.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(chunk.trim());
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" | b"p" => {
                        flush(&mut blocks, &mut open_block, &mut text);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("content markup error, keeping blocks parsed so far: {}", e);
                break;
            }
            _ => {}
        }
    }
    flush(&mut blocks, &mut open_block, &mut text);

    blocks
}

/// Serialize a block sequence back to the restricted HTML subset.
pub fn to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                out.push_str(&format!(
                    "<h{level}>{}</h{level}>\n",
                    quick_xml::escape::escape(text)
                ));
            }
            Block::Paragraph { text } => {
                out.push_str(&format!("<p>{}</p>\n", quick_xml::escape::escape(text)));
            }
            Block::Image { src, alt } => match alt {
                Some(alt) => out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\" />\n",
                    quick_xml::escape::escape(src),
                    quick_xml::escape::escape(alt)
                )),
                None => out.push_str(&format!(
                    "<img src=\"{}\" />\n",
                    quick_xml::escape::escape(src)
                )),
            },
        }
    }
    out
}

fn flush(blocks: &mut Vec<Block>, open_block: &mut Option<u8>, text: &mut String) {
    if let Some(level) = open_block.take() {
        let content = std::mem::take(text);
        let content = content.trim().to_string();
        if !content.is_empty() {
            if level == 0 {
                blocks.push(Block::Paragraph { text: content });
            } else {
                blocks.push(Block::Heading {
                    level,
                    text: content,
                });
            }
        }
    } else {
        text.clear();
    }
}

/// Read an attribute value without entity strictness: values are taken raw
/// and the standard named entities decoded by hand, so a `src` URL holding
/// unescaped `&` separators survives.
fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref().eq_ignore_ascii_case(key) {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            return Some(decode_entities(&raw));
        }
    }
    None
}

/// Decode the named entities the restricted subset can produce. `&amp;` is
/// decoded last so already-decoded sequences are not decoded twice.
fn decode_entities(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headings_paragraphs_images() {
        let html = "<h1>Title</h1><p>First paragraph.</p>\
                    <img src=\"https://example.com/a.png\" alt=\"A\" />\
                    <h2>Chapter</h2><p>Second.</p>";
        let blocks = parse_blocks(html);
        assert_eq!(blocks.len(), 5);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Title".into()
            }
        );
        assert_eq!(
            blocks[2],
            Block::Image {
                src: "https://example.com/a.png".into(),
                alt: Some("A".into())
            }
        );
        assert_eq!(
            blocks[4],
            Block::Paragraph {
                text: "Second.".into()
            }
        );
    }

    #[test]
    fn test_parse_tolerates_raw_ampersand_in_src() {
        let html = r#"<img src="https://images.example.com/photo?w=1974&q=80&fit=crop" alt="x" />"#;
        let blocks = parse_blocks(html);
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Image { src, .. } => {
                assert_eq!(src, "https://images.example.com/photo?w=1974&q=80&fit=crop");
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_decodes_escaped_ampersand_once() {
        let html = r#"<img src="https://e.com/?a=1&amp;b=2" />"#;
        let blocks = parse_blocks(html);
        match &blocks[0] {
            Block::Image { src, .. } => assert_eq!(src, "https://e.com/?a=1&b=2"),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unclosed_img() {
        let html = "<p>before</p><img src=\"x.png\"><p>after</p>";
        let blocks = parse_blocks(html);
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[1], Block::Image { .. }));
    }

    #[test]
    fn test_inline_markup_contributes_text_only() {
        let html = "<p>plain <strong>bold</strong> tail</p>";
        let blocks = parse_blocks(html);
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                text: "plain bold tail".into()
            }]
        );
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let original = vec![
            Block::Heading {
                level: 1,
                text: "A & B".into(),
            },
            Block::Paragraph {
                text: "Some text.".into(),
            },
            Block::Image {
                src: "data:image/png;base64,AAAA".into(),
                alt: None,
            },
        ];
        let reparsed = parse_blocks(&to_html(&original));
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_is_inlined_image() {
        let inlined = Block::Image {
            src: "data:image/png;base64,AAAA".into(),
            alt: None,
        };
        let remote = Block::Image {
            src: "https://example.com/a.png".into(),
            alt: None,
        };
        assert!(inlined.is_inlined_image());
        assert!(!remote.is_inlined_image());
        assert!(!Block::Paragraph { text: "x".into() }.is_inlined_image());
    }

    #[test]
    fn test_uppercase_tags_accepted() {
        let blocks = parse_blocks("<H1>Loud</H1><P>quiet</P>");
        assert_eq!(blocks.len(), 2);
    }
}
