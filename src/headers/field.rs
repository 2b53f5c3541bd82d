use std::fmt;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};

/// HPACK indexing hint attached to a header field.
///
/// `NeverIndexed` forbids the encoder from inserting the field into its
/// dynamic table, keeping credentials out of compression contexts where
/// they would be open to guessing attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// The encoder may index the field as it sees fit.
    Default,
    /// The field must be emitted as never-indexed.
    NeverIndexed,
}

impl Default for Sensitivity {
    fn default() -> Sensitivity {
        Sensitivity::Default
    }
}

/// A single (name, value) pair of a header block.
///
/// Names are logically ASCII and compared as octets; values are opaque
/// octets. Text-typed sources are converted at this boundary so that no
/// comparison downstream depends on locale-sensitive case folding.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: Bytes,
    value: Bytes,
    sensitivity: Sensitivity,
}

impl HeaderField {
    /// Creates a header field with default sensitivity.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> HeaderField {
        HeaderField {
            name: name.into(),
            value: value.into(),
            sensitivity: Sensitivity::Default,
        }
    }

    /// Creates a header field the HPACK encoder must never index.
    pub fn never_indexed(name: impl Into<Bytes>, value: impl Into<Bytes>) -> HeaderField {
        HeaderField {
            name: name.into(),
            value: value.into(),
            sensitivity: Sensitivity::NeverIndexed,
        }
    }

    /// Creates a header field from borrowed text, copying both parts.
    pub fn text(name: &str, value: &str) -> HeaderField {
        HeaderField::new(
            Bytes::copy_from_slice(name.as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        )
    }

    /// The header name octets.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The header value octets.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The field's HPACK emission hint.
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Returns true if the field must be emitted as never-indexed.
    pub fn is_sensitive(&self) -> bool {
        self.sensitivity == Sensitivity::NeverIndexed
    }

    /// Returns true if the name marks a pseudo-header.
    pub fn is_pseudo(&self) -> bool {
        self.name.first() == Some(&b':')
    }

    /// Converts into `http` types, `None` if the name is not a legal
    /// `HeaderName` (pseudo-header names are not). Sensitivity carries
    /// over to [`HeaderValue::set_sensitive`].
    pub fn to_http(&self) -> Option<(HeaderName, HeaderValue)> {
        let name = HeaderName::from_bytes(&self.name).ok()?;
        let mut value = HeaderValue::from_maybe_shared(self.value.clone()).ok()?;
        if self.is_sensitive() {
            value.set_sensitive(true);
        }
        Some((name, value))
    }

    pub(crate) fn name_bytes(&self) -> &Bytes {
        &self.name
    }

    pub(crate) fn value_bytes(&self) -> &Bytes {
        &self.value
    }

    pub(crate) fn set_name(&mut self, name: Bytes) {
        self.name = name;
    }

    pub(crate) fn set_value(&mut self, value: Bytes) {
        self.value = value;
    }

    pub(crate) fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.sensitivity = sensitivity;
    }
}

impl From<(&'static str, &'static str)> for HeaderField {
    fn from((name, value): (&'static str, &'static str)) -> HeaderField {
        HeaderField::new(
            Bytes::from_static(name.as_bytes()),
            Bytes::from_static(value.as_bytes()),
        )
    }
}

impl From<(Bytes, Bytes)> for HeaderField {
    fn from((name, value): (Bytes, Bytes)) -> HeaderField {
        HeaderField::new(name, value)
    }
}

impl From<(Vec<u8>, Vec<u8>)> for HeaderField {
    fn from((name, value): (Vec<u8>, Vec<u8>)) -> HeaderField {
        HeaderField::new(name, value)
    }
}

impl From<(&HeaderName, &HeaderValue)> for HeaderField {
    fn from((name, value): (&HeaderName, &HeaderValue)) -> HeaderField {
        let sensitivity = if value.is_sensitive() {
            Sensitivity::NeverIndexed
        } else {
            Sensitivity::Default
        };
        HeaderField {
            name: Bytes::copy_from_slice(name.as_str().as_bytes()),
            value: Bytes::copy_from_slice(value.as_bytes()),
            sensitivity,
        }
    }
}

impl From<(HeaderName, HeaderValue)> for HeaderField {
    fn from((name, value): (HeaderName, HeaderValue)) -> HeaderField {
        HeaderField::from((&name, &value))
    }
}

// Sensitive values stay out of logs, mirroring `HeaderValue`'s Debug.
impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("HeaderField");
        d.field("name", &self.name);
        if self.is_sensitive() {
            d.field("value", &"Sensitive");
        } else {
            d.field("value", &self.value);
        }
        d.finish()
    }
}
