//! Builders for release service responses
//!
//! The release types only deserialize, so responses are built as JSON the
//! way the service sends them.

use mosic_update::digest::sha256_hex;
use serde_json::{json, Value};

/// Builder for one release object
#[derive(Debug, Clone)]
pub struct ReleaseJsonBuilder {
    tag_name: String,
    assets: Vec<Value>,
}

impl ReleaseJsonBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            assets: Vec::new(),
        }
    }

    /// Add an asset with a raw digest string (or `None` for a null digest)
    pub fn asset(mut self, name: &str, url: &str, digest: Option<&str>) -> Self {
        self.assets.push(json!({
            "name": name,
            "browser_download_url": url,
            "digest": digest,
        }));
        self
    }

    /// Add an asset whose SHA-256 digest is computed from `content`
    pub fn asset_for(self, name: &str, url: &str, content: &[u8]) -> Self {
        let digest = sha256_digest(content);
        self.asset(name, url, Some(&digest))
    }

    /// Add an asset without any digest field
    pub fn asset_without_digest(mut self, name: &str, url: &str) -> Self {
        self.assets.push(json!({
            "name": name,
            "browser_download_url": url,
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "tag_name": self.tag_name,
            "name": self.tag_name,
            "assets": self.assets,
        })
    }
}

/// The service's digest notation for `content`
pub fn sha256_digest(content: &[u8]) -> String {
    format!("sha256:{}", sha256_hex(content))
}
