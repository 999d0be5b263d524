//! Cookie jar capability and its backing stores
//!
//! The storage adapter talks to cookies only through [`CookieJar`], a narrow
//! three-method capability. Each backing store gets its own implementation:
//!
//! - [`MemoryJar`] - in-memory jar with per-entry expiry timers
//! - [`MapJar`] - plain name/value mapping, no TTL support
//! - [`HttpCookieJar`] - bound to one HTTP request/response pair

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::humanize::Ttl;

mod http;
mod map;
mod memory;

pub use http::HttpCookieJar;
pub use map::MapJar;
pub use memory::MemoryJar;

#[derive(Debug, Error)]
pub enum JarError {
    #[error("cookie '{name}' could not be decoded: {reason}")]
    Decode { name: String, reason: String },

    #[error("invalid cookie header: {0}")]
    InvalidHeader(String),

    #[error("cookie backend failure: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, JarError>;

/// `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes passed through to the jar on every `set` call.
///
/// The storage adapter never interprets these, apart from filling in
/// `expires` from its expiration policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<Ttl>,
}

impl CookieOptions {
    /// Copy of these options with `expires` overridden when `ttl` is truthy.
    ///
    /// A `None` or zero TTL leaves the options as they are, so the cookie
    /// stays a session cookie unless the base options already carry an expiry.
    pub fn with_expiry(&self, ttl: Option<Ttl>) -> Self {
        let mut options = self.clone();
        if let Some(ttl) = ttl.filter(|ttl| !ttl.is_session()) {
            options.expires = Some(ttl);
        }
        options
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Raw cookie capability consumed by the storage adapter
#[async_trait]
pub trait CookieJar: Send + Sync {
    /// Read a cookie value, `None` if the cookie is absent
    async fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write a cookie with the given attributes
    async fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()>;

    /// Delete a cookie. Deleting an absent cookie is not an error.
    async fn expire(&self, name: &str) -> Result<()>;
}

#[async_trait]
impl<J: CookieJar + ?Sized> CookieJar for Arc<J> {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        (**self).get(name).await
    }

    async fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        (**self).set(name, value, options).await
    }

    async fn expire(&self, name: &str) -> Result<()> {
        (**self).expire(name).await
    }
}
