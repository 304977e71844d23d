//! Fetch listing photos and re-encode them as inline data URLs.
//!
//! Some providers fetch image URLs from their own servers, which listing sites
//! block via robots.txt. For those, photos are downloaded here with a browser
//! user agent and sent inline as base64.

use base64::Engine;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SUPPORTED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

const SUPPORTED_DATA_PREFIXES: &[&str] = &[
    "data:image/jpeg",
    "data:image/png",
    "data:image/gif",
    "data:image/webp",
];

/// Image CDNs that serve photos from extension-less URLs.
const KNOWN_IMAGE_HOSTS: &[&str] = &["zillowstatic.com", "rdcpix.com", "googleapis.com"];

/// Whether a URL plausibly points at a raster image we can send.
///
/// Rejects SVG, unsupported data URLs, and listing pages that ended up in a
/// photo array.
pub fn is_supported_image_url(url: &str) -> bool {
    if url.starts_with("data:") {
        return SUPPORTED_DATA_PREFIXES.iter().any(|p| url.starts_with(p));
    }

    let lower = url.split('?').next().unwrap_or(url).to_ascii_lowercase();
    if lower.ends_with(".svg") {
        return false;
    }
    if SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }

    match Url::parse(&lower).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => KNOWN_IMAGE_HOSTS
            .iter()
            .any(|known| host == *known || host.ends_with(&format!(".{known}"))),
        None => false,
    }
}

/// Downloads photos and turns them into `data:` URLs.
#[derive(Clone)]
pub struct ImageInliner {
    client: reqwest::Client,
}

impl Default for ImageInliner {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl ImageInliner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: image_client(timeout, BROWSER_USER_AGENT),
        }
    }

    /// Fetch one photo as a data URL, or `None` if it can't be used.
    pub async fn fetch_data_url(&self, url: &str) -> Option<String> {
        if !is_supported_image_url(url) {
            debug!(url = %truncate(url, 80), "Skipping unsupported image URL");
            return None;
        }
        if url.starts_with("data:") {
            return Some(url.to_string());
        }

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %truncate(url, 80), error = %e, "Failed to fetch image");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = %truncate(url, 80), status = %status, "Image fetch returned non-success status");
            return None;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());
        let mime = match resolve_image_mime(content_type.as_deref()) {
            Some(mime) => mime,
            None => {
                warn!(
                    url = %truncate(url, 80),
                    content_type = content_type.as_deref().unwrap_or(""),
                    "Image fetch returned non-image content"
                );
                return None;
            }
        };

        match response.bytes().await {
            Ok(bytes) => Some(encode_data_url(&mime, &bytes)),
            Err(e) => {
                warn!(url = %truncate(url, 80), error = %e, "Failed to read image body");
                None
            }
        }
    }

    /// Inline every usable photo, keeping input order.
    ///
    /// Returns `(original_url, data_url)` pairs for the photos that survived.
    pub async fn inline_all(&self, urls: &[String]) -> Vec<(String, String)> {
        let mut inlined = Vec::with_capacity(urls.len());
        for url in urls {
            if let Some(data_url) = self.fetch_data_url(url).await {
                inlined.push((url.clone(), data_url));
            }
        }
        inlined
    }
}

fn image_client(timeout: Duration, user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build image client, using defaults");
            reqwest::Client::new()
        })
}

/// Missing content type is assumed JPEG; anything that isn't a raster image
/// is rejected.
fn resolve_image_mime(content_type: Option<&str>) -> Option<String> {
    match content_type {
        None | Some("") => Some("image/jpeg".to_string()),
        Some(ct) if ct.starts_with("image/svg") => None,
        Some(ct) if ct.starts_with("image/") => Some(ct.to_string()),
        Some(_) => None,
    }
}

fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{b64}")
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::http_stub::{closed_port_url, StubResponse, StubServer};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nroom";

    async fn photo_server() -> StubServer {
        StubServer::start(|path, _| match path {
            "/missing.jpg" => StubResponse::new(404, "text/plain", "not found"),
            "/listing.jpg" => StubResponse::new(200, "text/html; charset=utf-8", "<html></html>"),
            "/blocked.jpg" => StubResponse::new(403, "text/html", "robots"),
            "/living.png" => StubResponse::new(200, "image/png", PNG),
            "/bedroom.jpg" => StubResponse::new(200, "", b"jpeg-bytes".to_vec()),
            _ => StubResponse::new(500, "text/plain", "unexpected"),
        })
        .await
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image_url("https://cdn.example.com/a.jpg"));
        assert!(is_supported_image_url("https://cdn.example.com/a.JPEG?w=800"));
        assert!(is_supported_image_url("https://cdn.example.com/a.webp"));
        assert!(!is_supported_image_url("https://cdn.example.com/logo.svg"));
        assert!(!is_supported_image_url("https://cdn.example.com/logo.svg?v=2"));
    }

    #[test]
    fn test_listing_pages_rejected() {
        assert!(!is_supported_image_url("https://www.example.com/rentals/123"));
        assert!(!is_supported_image_url("not a url"));
    }

    #[test]
    fn test_known_cdn_hosts_allowed_without_extension() {
        assert!(is_supported_image_url("https://photos.zillowstatic.com/fp/abc123-cc_ft_960"));
        assert!(is_supported_image_url("https://ap.rdcpix.com/xyz"));
        assert!(is_supported_image_url("https://maps.googleapis.com/maps/api/streetview?size=600"));
        assert!(!is_supported_image_url("https://evilzillowstatic.com.example.org/abc"));
    }

    #[test]
    fn test_data_urls() {
        assert!(is_supported_image_url("data:image/png;base64,AAAA"));
        assert!(!is_supported_image_url("data:image/svg+xml;base64,AAAA"));
        assert!(!is_supported_image_url("data:text/html;base64,AAAA"));
    }

    #[test]
    fn test_resolve_image_mime() {
        assert_eq!(resolve_image_mime(None).as_deref(), Some("image/jpeg"));
        assert_eq!(resolve_image_mime(Some("image/png")).as_deref(), Some("image/png"));
        assert_eq!(resolve_image_mime(Some("image/svg+xml")), None);
        assert_eq!(resolve_image_mime(Some("text/html")), None);
    }

    #[test]
    fn test_encode_data_url() {
        assert_eq!(encode_data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[tokio::test]
    async fn test_unsupported_urls_skip_without_network() {
        let inliner = ImageInliner::default();
        let urls = vec![
            "https://cdn.example.com/floorplan.svg".to_string(),
            "data:image/gif;base64,R0lG".to_string(),
        ];
        let inlined = inliner.inline_all(&urls).await;
        assert_eq!(
            inlined,
            vec![("data:image/gif;base64,R0lG".to_string(), "data:image/gif;base64,R0lG".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_fetches_dropped_in_order() {
        let server = photo_server().await;
        let urls = vec![
            server.url("/missing.jpg"),
            server.url("/living.png"),
            closed_port_url("/down.jpg").await,
            server.url("/listing.jpg"),
            server.url("/bedroom.jpg"),
        ];

        let inlined = ImageInliner::new(Duration::from_secs(5)).inline_all(&urls).await;

        let originals: Vec<&str> = inlined.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(originals, vec![urls[1].as_str(), urls[4].as_str()]);
        assert_eq!(inlined[0].1, encode_data_url("image/png", PNG));
        assert_eq!(inlined[1].1, encode_data_url("image/jpeg", b"jpeg-bytes"));
    }

    #[tokio::test]
    async fn test_fetch_data_url_rejects_error_status_and_html() {
        let server = photo_server().await;
        let inliner = ImageInliner::default();

        assert!(inliner.fetch_data_url(&server.url("/blocked.jpg")).await.is_none());
        assert!(inliner.fetch_data_url(&server.url("/listing.jpg")).await.is_none());
        assert!(inliner
            .fetch_data_url(&closed_port_url("/down.jpg").await)
            .await
            .is_none());
        assert!(inliner.fetch_data_url(&server.url("/living.png")).await.is_some());
    }

    #[tokio::test]
    async fn test_invalid_user_agent_falls_back_to_default_client() {
        let server = photo_server().await;
        let inliner = ImageInliner {
            client: image_client(Duration::from_secs(5), "bad\nagent"),
        };

        let data_url = inliner.fetch_data_url(&server.url("/living.png")).await;
        assert_eq!(data_url, Some(encode_data_url("image/png", PNG)));
    }
}
