//! Topic naming for filtered streams
//!
//! A stream owns one base channel. Sub-partitions of it are addressed by
//! a key, and the backend topic for a key is `"{base}.{key}"`.

use crate::error::{Result, SseError};
use std::fmt;

/// Sub-partition key of a base channel
///
/// `Subchannel::base()` (the default) addresses the base channel itself.
/// Any string or integer key converts via `From`, and so does an
/// `Option` of one, where `None` means the base channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Subchannel(Option<String>);

impl Subchannel {
    /// The base channel, without a sub-partition key
    pub const fn base() -> Self {
        Self(None)
    }

    /// A sub-partition addressed by any displayable key
    pub fn key(key: impl fmt::Display) -> Self {
        Self(Some(key.to_string()))
    }

    /// The key, or `None` for the base channel
    pub fn as_key(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether this addresses the base channel
    pub fn is_base(&self) -> bool {
        self.0.is_none()
    }

    /// Check that the key names exactly one backend topic
    ///
    /// Keys may contain `.` between non-empty segments, so `"a.b"` is the
    /// topic `"{base}.a.b"`. Wildcard characters (`*`, `>`), whitespace and
    /// control characters are rejected, as are empty segments.
    pub fn validate(&self) -> Result<()> {
        let Some(key) = self.as_key() else {
            return Ok(());
        };

        let reason = if key.is_empty() {
            "must not be empty"
        } else if key.split('.').any(str::is_empty) {
            "must not contain empty '.'-separated segments"
        } else if key.contains(['*', '>']) {
            "must not contain '*' or '>'"
        } else if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            "must not contain whitespace or control characters"
        } else {
            return Ok(());
        };

        Err(SseError::InvalidSubchannel {
            key: key.to_string(),
            reason,
        })
    }
}

impl fmt::Display for Subchannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(key) => f.write_str(key),
            None => f.write_str("<base>"),
        }
    }
}

macro_rules! subchannel_from_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Subchannel {
                fn from(key: $ty) -> Self {
                    Self::key(key)
                }
            }
        )*
    };
}

subchannel_from_key!(&str, String, &String, i32, i64, u32, u64, usize, uuid::Uuid);

impl<T: Into<Subchannel>> From<Option<T>> for Subchannel {
    fn from(key: Option<T>) -> Self {
        key.map(Into::into).unwrap_or_default()
    }
}

/// Build the backend topic for a sub-partition of `base`
pub fn create_channel_name(base: &str, subchannel: &Subchannel) -> String {
    match subchannel.as_key() {
        Some(key) => format!("{}.{}", base, key),
        None => base.to_string(),
    }
}
