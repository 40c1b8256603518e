// src/enrich/image.rs
use super::{EnrichError, ImageProbe};
use crate::constants::{FETCH_USER_AGENT, IMAGE_PROBE_MAX_BYTES, UNFURL_TIMEOUT};
use crate::model::Dimensions;
use reqwest::{header, Client};

/// Reads image dimensions from the first bytes of the file.
///
/// Asks for a byte range and stops reading as soon as the header decodes, so
/// large images cost a few kilobytes rather than a full download.
#[derive(Clone)]
pub struct HttpImageProbe {
    client: Client,
    max_bytes: usize,
}

impl HttpImageProbe {
    pub fn new() -> Result<Self, EnrichError> {
        let client = Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .timeout(UNFURL_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            max_bytes: IMAGE_PROBE_MAX_BYTES,
        })
    }
}

fn decode(buf: &[u8]) -> Option<Dimensions> {
    let size = imagesize::blob_size(buf).ok()?;
    Some(Dimensions {
        width: u32::try_from(size.width).ok()?,
        height: u32::try_from(size.height).ok()?,
    })
}

#[async_trait::async_trait]
impl ImageProbe for HttpImageProbe {
    async fn dimensions(&self, url: &str) -> Result<Dimensions, EnrichError> {
        let mut response = self
            .client
            .get(url)
            .header(header::RANGE, format!("bytes=0-{}", self.max_bytes - 1))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);
            if let Some(dim) = decode(&buf) {
                log::trace!("Probed {} after {} bytes", url, buf.len());
                return Ok(dim);
            }
            if buf.len() >= self.max_bytes {
                break;
            }
        }

        Err(EnrichError::UndecodableImage {
            url: url.to_string(),
        })
    }
}
