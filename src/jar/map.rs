use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{CookieJar, CookieOptions, Result};

/// Legacy jar over a raw name/value mapping
///
/// Names are unescaped once at construction. Options, including `expires`,
/// are ignored: every cookie lives until it is expired explicitly.
#[derive(Debug, Default)]
pub struct MapJar {
    cookies: Mutex<HashMap<String, String>>,
}

impl MapJar {
    pub fn new(map: HashMap<String, String>) -> Self {
        let cookies = map
            .into_iter()
            .map(|(name, value)| (percent_decode_str(&name).decode_utf8_lossy().into_owned(), value))
            .collect();

        Self {
            cookies: Mutex::new(cookies),
        }
    }

    /// Copy of the current mapping
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.cookies.lock().await.clone()
    }
}

#[async_trait]
impl CookieJar for MapJar {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.cookies.lock().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: &str, _options: &CookieOptions) -> Result<()> {
        self.cookies
            .lock()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn expire(&self, name: &str) -> Result<()> {
        self.cookies.lock().await.remove(name);
        Ok(())
    }
}
