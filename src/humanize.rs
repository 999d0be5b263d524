//! Human-readable TTL formatting and parsing utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid TTL format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Cookie time-to-live in seconds.
///
/// Zero is "falsy": a cookie resolved to a zero TTL is written as a session
/// cookie, without any expiry attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Ttl(pub u64);

impl Ttl {
    pub const SESSION: Ttl = Ttl(0);

    pub fn from_secs(secs: u64) -> Self {
        Ttl(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn is_session(&self) -> bool {
        self.0 == 0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }

    pub fn to_human_readable(&self) -> String {
        const UNITS: &[(&str, u64)] = &[
            ("s", 1),
            ("m", 60),
            ("h", 60 * 60),
            ("d", 24 * 60 * 60),
            ("w", 7 * 24 * 60 * 60),
        ];

        if self.0 == 0 {
            return "session".to_string();
        }

        // Largest unit that divides evenly, so the output parses back to the same value
        for &(unit, divisor) in UNITS.iter().rev() {
            if self.0 % divisor == 0 {
                return format!("{}{}", self.0 / divisor, unit);
            }
        }

        format!("{}s", self.0)
    }
}

impl From<Duration> for Ttl {
    fn from(value: Duration) -> Self {
        Ttl(value.as_secs())
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TtlVisitor;

        impl<'de> serde::de::Visitor<'de> for TtlVisitor {
            type Value = Ttl;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a TTL as string (e.g., \"30m\", \"7d\", \"session\") or seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ttl(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(Ttl)
                    .map_err(|_| E::custom(format!("TTL must not be negative: {v}")))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<Ttl>().map_err(serde::de::Error::custom)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ttl::SESSION)
            }
        }

        deserializer.deserialize_any(TtlVisitor)
    }
}

impl FromStr for Ttl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        if s == "session" || s == "none" {
            return Ok(Ttl::SESSION);
        }

        // Try to parse as plain number of seconds first
        if let Ok(num) = s.parse::<u64>() {
            return Ok(Ttl(num));
        }

        let (num_str, unit) = if let Some(pos) = s.find(|c: char| !c.is_ascii_digit()) {
            (&s[..pos], &s[pos..])
        } else {
            return Err(ParseError::InvalidFormat(s.to_string()));
        };

        if num_str.is_empty() {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }

        let num: u64 = num_str.parse()?;

        let multiplier = match unit.trim() {
            "s" | "sec" | "secs" => 1,
            "m" | "min" | "mins" => 60,
            "h" | "hr" | "hrs" => 60 * 60,
            "d" | "day" | "days" => 24 * 60 * 60,
            "w" | "wk" | "weeks" => 7 * 24 * 60 * 60,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        num.checked_mul(multiplier)
            .map(Ttl)
            .ok_or_else(|| ParseError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}
