use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;
use time::{OffsetDateTime, macros::format_description};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CookieJar, CookieOptions, JarError, Result};

/// Bytes escaped in cookie names: everything outside the RFC 6265 token
/// characters a browser cookie library leaves alone
const NAME_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'^')
    .remove(b'`')
    .remove(b'|');

/// Bytes escaped in cookie values: anything that is not a cookie-octet
const VALUE_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\');

const EXPIRED: &str = "Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT";

pub(crate) fn encode_name(name: &str) -> String {
    utf8_percent_encode(name, NAME_ENCODE).to_string()
}

pub(crate) fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, VALUE_ENCODE).to_string()
}

#[derive(Debug, Clone)]
struct PendingCookie {
    name: String,
    /// Decoded value, `None` once the cookie has been expired
    value: Option<String>,
    header: String,
}

/// Cookie jar bound to a single HTTP request/response pair
///
/// Reads come from the request `Cookie` headers, overlaid with whatever was
/// written during this request. Writes are collected as `Set-Cookie` lines
/// and copied onto the response with [`HttpCookieJar::write_to`].
#[derive(Debug, Default)]
pub struct HttpCookieJar {
    request: HashMap<String, String>,
    pending: Mutex<Vec<PendingCookie>>,
}

impl HttpCookieJar {
    /// Bind to the cookies of an incoming request
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let mut request = HashMap::new();

        for value in headers.get_all(header::COOKIE) {
            let value = value
                .to_str()
                .map_err(|e| JarError::InvalidHeader(e.to_string()))?;
            parse_cookie_header(value, &mut request);
        }

        debug!(count = request.len(), "Bound cookie jar to request");

        Ok(Self {
            request,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Bind to a raw `Cookie` header value, e.g. `a=1; b=2`
    pub fn from_cookie_header(value: &str) -> Self {
        let mut request = HashMap::new();
        parse_cookie_header(value, &mut request);

        Self {
            request,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// `Set-Cookie` lines produced so far, one per cookie name
    pub async fn set_cookie_headers(&self) -> Vec<String> {
        self.pending
            .lock()
            .await
            .iter()
            .map(|cookie| cookie.header.clone())
            .collect()
    }

    /// Append the pending `Set-Cookie` headers to a response
    pub async fn write_to(&self, headers: &mut HeaderMap) -> Result<()> {
        for line in self.set_cookie_headers().await {
            let value = HeaderValue::from_str(&line)
                .map_err(|e| JarError::InvalidHeader(e.to_string()))?;
            headers.append(header::SET_COOKIE, value);
        }
        Ok(())
    }

    async fn record(&self, cookie: PendingCookie) {
        let mut pending = self.pending.lock().await;
        pending.retain(|existing| existing.name != cookie.name);
        pending.push(cookie);
    }
}

fn parse_cookie_header(value: &str, cookies: &mut HashMap<String, String>) {
    for pair in value.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        // Browsers send the most specific cookie first
        cookies
            .entry(name.to_string())
            .or_insert_with(|| value.trim().to_string());
    }
}

fn render_attributes(options: &CookieOptions) -> Result<String> {
    let mut attributes = String::new();

    if let Some(path) = &options.path {
        attributes.push_str("; Path=");
        attributes.push_str(path);
    }
    if let Some(domain) = &options.domain {
        attributes.push_str("; Domain=");
        attributes.push_str(domain);
    }
    if let Some(ttl) = options.expires.filter(|ttl| !ttl.is_session()) {
        attributes.push_str(&format!("; Max-Age={}", ttl.as_secs()));

        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| OffsetDateTime::now_utc().checked_add(time::Duration::seconds(secs)));
        if let Some(expires_at) = expires_at {
            let formatted = expires_at
                .format(format_description!(
                    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
                ))
                .map_err(|e| JarError::Backend(e.to_string()))?;
            attributes.push_str("; Expires=");
            attributes.push_str(&formatted);
        }
    }
    if options.secure {
        attributes.push_str("; Secure");
    }
    if options.http_only {
        attributes.push_str("; HttpOnly");
    }
    if let Some(same_site) = options.same_site {
        attributes.push_str("; SameSite=");
        attributes.push_str(same_site.as_str());
    }

    Ok(attributes)
}

#[async_trait]
impl CookieJar for HttpCookieJar {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        let encoded = encode_name(name);

        if let Some(cookie) = self
            .pending
            .lock()
            .await
            .iter()
            .find(|cookie| cookie.name == encoded)
        {
            return Ok(cookie.value.clone());
        }

        match self.request.get(&encoded) {
            Some(raw) if !raw.is_empty() => {
                let value = percent_decode_str(raw)
                    .decode_utf8()
                    .map_err(|e| JarError::Decode {
                        name: name.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(value.into_owned()))
            }
            _ => Ok(None),
        }
    }

    async fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        let encoded = encode_name(name);
        let header = format!(
            "{}={}{}",
            encoded,
            encode_value(value),
            render_attributes(options)?
        );
        debug!(name, "Queued Set-Cookie");

        self.record(PendingCookie {
            name: encoded,
            value: Some(value.to_string()),
            header,
        })
        .await;
        Ok(())
    }

    async fn expire(&self, name: &str) -> Result<()> {
        let encoded = encode_name(name);
        let header = format!("{}=; {}", encoded, EXPIRED);
        debug!(name, "Queued expired Set-Cookie");

        self.record(PendingCookie {
            name: encoded,
            value: None,
            header,
        })
        .await;
        Ok(())
    }
}
