/// Image prefetching
///
/// Downloads one image slot and decides whether it counts as loaded: the
/// body must come back with a success status and decode as an image.
/// Failures are never errors here, only a different outcome.

use tokio::task;
use tracing::trace;

/// Result of one image load attempt
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    /// Decodable image bytes
    Loaded(Vec<u8>),
    /// Anything else, with a reason for the logs
    Failed(String),
}

impl ImageOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ImageOutcome::Loaded(_))
    }
}

/// Load an image from a URL
pub async fn load_image(client: reqwest::Client, url: String) -> ImageOutcome {
    let bytes = match fetch_bytes(&client, &url).await {
        Ok(bytes) => bytes,
        Err(reason) => {
            trace!(%url, %reason, "Image download failed");
            return ImageOutcome::Failed(reason);
        }
    };

    // Decoding is CPU-bound, keep it off the executor threads
    task::spawn_blocking(move || verify_image(bytes))
        .await
        .unwrap_or_else(|e| ImageOutcome::Failed(format!("Task join error: {}", e)))
}

async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("status {}", response.status().as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("body read failed: {}", e))?;

    Ok(bytes.to_vec())
}

/// Decode check, the equivalent of an image element's load/error event
fn verify_image(bytes: Vec<u8>) -> ImageOutcome {
    match image::load_from_memory(&bytes) {
        Ok(_) => ImageOutcome::Loaded(bytes),
        Err(e) => ImageOutcome::Failed(format!("not a decodable image: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::catalog::build_client;
    use std::io::Cursor;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([59, 130, 246, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!verify_image(b"definitely not an image".to_vec()).is_loaded());
        assert!(verify_image(tiny_png()).is_loaded());
    }

    #[tokio::test]
    async fn test_load_image_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken.png"))
            .respond_with(ResponseTemplate::new(200).set_body_string("oops"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5));
        let ok = load_image(client.clone(), format!("{}/ok.png", server.uri())).await;
        let broken = load_image(client.clone(), format!("{}/broken.png", server.uri())).await;
        let missing = load_image(client, format!("{}/missing.png", server.uri())).await;

        assert!(ok.is_loaded());
        assert!(!broken.is_loaded());
        match missing {
            ImageOutcome::Failed(reason) => assert_eq!(reason, "status 404"),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
