//! Remote cover reachability check
//!
//! The cover host answers unknown ISBNs with a tiny placeholder image rather
//! than an error, so a 200 response alone does not mean a cover exists.

use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("book-catalog/", env!("CARGO_PKG_VERSION"));

/// Decides whether a remote cover URL is worth showing
///
/// Implementations must never panic or block longer than their own timeout;
/// any failure simply means "not available".
pub trait RemoteProbe: Send + Sync {
    fn is_available(&self, url: &str) -> bool;
}

/// Probe that downloads the image and checks it is a real cover
#[derive(Debug, Clone)]
pub struct HttpProbe {
    timeout: Duration,
    min_bytes: u64,
}

impl HttpProbe {
    pub fn new(timeout: Duration, min_bytes: u64) -> Self {
        Self { timeout, min_bytes }
    }
}

impl RemoteProbe for HttpProbe {
    /// Blocking; call it from a blocking context (e.g. `spawn_blocking`)
    fn is_available(&self, url: &str) -> bool {
        // The blocking client owns a runtime, so it lives only for this call
        let client = match reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                debug!("Cover probe client unavailable: {}", e);
                return false;
            }
        };

        let response = match client.get(url).send() {
            Ok(response) => response,
            Err(e) => {
                debug!("Cover probe failed for {}: {}", url, e);
                return false;
            }
        };

        if !response.status().is_success() {
            debug!("Cover probe got {} for {}", response.status(), url);
            return false;
        }

        match response.bytes() {
            Ok(body) => looks_like_cover(&body, self.min_bytes),
            Err(e) => {
                debug!("Cover probe could not read body of {}: {}", url, e);
                false
            }
        }
    }
}

/// Whether a downloaded body is a real cover image
///
/// Rejects bodies under `min_bytes`, data that is not a recognizable image,
/// and images 1 pixel wide or tall.
pub fn looks_like_cover(body: &[u8], min_bytes: u64) -> bool {
    if (body.len() as u64) < min_bytes {
        return false;
    }

    let dimensions = image::ImageReader::new(Cursor::new(body))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    matches!(dimensions, Some((width, height)) if width > 1 && height > 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        RgbImage::new(width, height)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_real_image_looks_like_cover() {
        assert!(looks_like_cover(&png(8, 12), 0));
    }

    #[test]
    fn test_single_pixel_is_rejected() {
        assert!(!looks_like_cover(&png(1, 1), 0));
    }

    #[test]
    fn test_small_body_is_rejected() {
        let body = png(8, 12);
        assert!(!looks_like_cover(&body, body.len() as u64 + 1));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(!looks_like_cover(b"<html>not found</html>", 0));
    }

    #[test]
    fn test_unreachable_host_is_a_miss() {
        let probe = HttpProbe::new(Duration::from_millis(500), 0);
        assert!(!probe.is_available("http://127.0.0.1:9/cover.jpg"));
        assert!(!probe.is_available("not a url"));
    }
}
