//! Image inliner
//!
//! Rewrites image blocks so their `src` is a self-contained `data:` URI,
//! fetching the bytes through a CORS-bypass proxy. Every fetch is issued
//! before any is awaited; the join waits for all outcomes. A failed fetch
//! is logged and leaves that image's `src` unchanged; one slow or broken
//! image never blocks the rest, and never fails the inlining step.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::future::join_all;
use thiserror::Error;

use crate::blocks::Block;
use crate::services::Services;

/// Per-image failures. Internal to the inliner: they are logged, never
/// propagated.
#[derive(Debug, Error)]
enum InlineError {
    #[error("bad proxy URL: {0}")]
    ProxyUrl(String),

    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("proxy returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// The image inliner.
pub struct ImageInliner<'a> {
    services: &'a Services,
}

impl<'a> ImageInliner<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Inline every remote image in `blocks`. Block count and order are
    /// preserved; only `src` fields of image blocks are rewritten.
    pub async fn inline(&self, mut blocks: Vec<Block>) -> Vec<Block> {
        let pending: Vec<(usize, String)> = blocks
            .iter()
            .enumerate()
            .filter_map(|(idx, block)| match block {
                Block::Image { src, .. } if !src.starts_with("data:") => {
                    Some((idx, src.clone()))
                }
                _ => None,
            })
            .collect();

        if pending.is_empty() {
            return blocks;
        }

        let fetches = pending.into_iter().map(|(idx, src)| async move {
            let outcome = self.fetch_data_uri(&src).await;
            (idx, src, outcome)
        });

        for (idx, src, outcome) in join_all(fetches).await {
            match outcome {
                Ok(data_uri) => {
                    if let Block::Image { src, .. } = &mut blocks[idx] {
                        *src = data_uri;
                    }
                }
                Err(e) => {
                    log::warn!("failed to inline image {}: {}", src, e);
                }
            }
        }

        blocks
    }

    /// Fetch one image through the proxy and encode it as a `data:` URI.
    async fn fetch_data_uri(&self, src: &str) -> Result<String, InlineError> {
        let url = self.proxy_url(src)?;
        let response = self.services.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InlineError::Status(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response.bytes().await?;

        // Trust the proxy's Content-Type when it names an image; sniff the
        // magic bytes otherwise (the proxy passes some origins through as
        // application/octet-stream).
        let mime = content_type
            .filter(|c| c.starts_with("image/"))
            .unwrap_or_else(|| sniff_mime(&bytes).to_string());

        Ok(format!("data:{};base64,{}", mime, BASE64.encode(&bytes)))
    }

    fn proxy_url(&self, src: &str) -> Result<reqwest::Url, InlineError> {
        let mut url = reqwest::Url::parse(&self.services.config.proxy_base)
            .map_err(|e| InlineError::ProxyUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("url", src);
        Ok(url)
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn offline_services(dir: &std::path::Path) -> Services {
        // Port 9 (discard) refuses connections; fetches fail fast without
        // touching the network.
        let config = AppConfig {
            endpoint: None,
            proxy_base: "http://127.0.0.1:9/raw".into(),
            state_path: dir.join("state.json"),
        };
        Services::with_config(config)
    }

    fn sample_blocks() -> Vec<Block> {
        vec![
            Block::Heading {
                level: 1,
                text: "Title".into(),
            },
            Block::Image {
                src: "https://example.com/a.png".into(),
                alt: Some("A".into()),
            },
            Block::Paragraph {
                text: "Body".into(),
            },
            Block::Image {
                src: "data:image/png;base64,AAAA".into(),
                alt: None,
            },
        ]
    }

    #[tokio::test]
    async fn test_failed_fetch_preserves_src_and_order() {
        let tmpdir = tempfile::tempdir().unwrap();
        let services = offline_services(tmpdir.path());
        let blocks = ImageInliner::new(&services).inline(sample_blocks()).await;

        assert_eq!(blocks, sample_blocks());
    }

    #[tokio::test]
    async fn test_already_inlined_images_skip_network() {
        let tmpdir = tempfile::tempdir().unwrap();
        let services = offline_services(tmpdir.path());
        let input = vec![Block::Image {
            src: "data:image/png;base64,AAAA".into(),
            alt: None,
        }];
        let blocks = ImageInliner::new(&services).inline(input.clone()).await;
        assert_eq!(blocks, input);
    }

    #[test]
    fn test_proxy_url_percent_encodes() {
        let tmpdir = tempfile::tempdir().unwrap();
        let services = offline_services(tmpdir.path());
        let inliner = ImageInliner::new(&services);
        let url = inliner
            .proxy_url("https://example.com/a.png?w=1974&q=80")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/raw?url=https%3A%2F%2Fexample.com%2Fa.png%3Fw%3D1974%26q%3D80"
        );
    }

    #[test]
    fn test_sniff_mime_png() {
        let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(sniff_mime(&png_magic), "image/png");
        assert_eq!(sniff_mime(b"not an image"), "application/octet-stream");
    }
}
