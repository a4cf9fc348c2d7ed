//! Durations in the protobuf JSON form (`"1s"`, `"0.200s"`).

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

use crate::path::FieldPath;
use crate::validate::rules::HasValue;
use crate::validate::{Report, Validate};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A non-negative duration written as decimal seconds with an `s` suffix.
///
/// Up to nine fractional digits are accepted. Serializes back in the
/// shortest of the 0, 3, 6 or 9 digit forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(pub std::time::Duration);

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Self(std::time::Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(std::time::Duration::from_millis(millis))
    }

    pub const fn into_inner(self) -> std::time::Duration {
        self.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Self(d)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(d: Duration) -> Self {
        d.0
    }
}

/// The text was not a protobuf JSON duration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration {0:?}")]
pub struct InvalidDuration(pub String);

impl FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDuration(s.to_string());
        let body = s.strip_suffix('s').ok_or_else(invalid)?;
        let (secs, frac) = match body.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (body, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if secs.is_empty() || !all_digits(secs) || !all_digits(frac) || frac.len() > 9 {
            return Err(invalid());
        }
        if body.ends_with('.') {
            return Err(invalid());
        }
        let secs: u64 = secs.parse().map_err(|_| invalid())?;
        let nanos = if frac.is_empty() {
            0
        } else {
            let scale = 10_u32.pow(9 - frac.len() as u32);
            frac.parse::<u32>().map_err(|_| invalid())? * scale
        };
        Ok(Self(std::time::Duration::new(secs, nanos)))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let nanos = self.0.subsec_nanos();
        if nanos == 0 {
            write!(f, "{secs}s")
        } else if nanos % 1_000_000 == 0 {
            write!(f, "{secs}.{:03}s", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            write!(f, "{secs}.{:06}s", nanos / 1_000)
        } else {
            write!(f, "{secs}.{nanos:09}s")
        }
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration string such as \"1.5s\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

impl Validate for Duration {
    fn validate_into(&self, _path: &FieldPath, _report: &mut Report) {}
}

impl HasValue for Duration {
    fn has_value(&self) -> bool {
        !self.0.is_zero()
    }
}
