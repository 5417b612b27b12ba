//! Fixture resolution.
//!
//! A [`Fixture`] is a predetermined byte payload used either as the body an
//! inbound request must match or as the canned body written back. Every
//! fixture is resolved exactly once, when it is constructed:
//!
//! - literal bytes or text are taken as-is,
//! - files are read synchronously with [`std::fs::read`],
//! - readers are drained to end of input,
//! - structured values are encoded to JSON or XML.
//!
//! Resolution failures are kept inside the fixture instead of being raised,
//! and are reported when the owning route is bound.
//!
//! # Example
//!
//! ```
//! use decoy_core::Fixture;
//! use serde_json::json;
//!
//! let fixture = Fixture::json(&json!({"Version": "1.10.1"}));
//! assert_eq!(fixture.payload(), Some(&br#"{"Version":"1.10.1"}"#[..]));
//! ```

use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{FixtureError, FixtureResult};

/// Encoding applied to a structured fixture value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Compact JSON via `serde_json`.
    #[default]
    Json,
    /// XML via `quick-xml`, rooted at the value's type name.
    Xml,
}

/// A resolved fixture payload, or the error that prevented resolution.
#[derive(Debug)]
pub struct Fixture {
    payload: FixtureResult<Bytes>,
}

impl Fixture {
    /// Creates an empty fixture.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            payload: Ok(Bytes::new()),
        }
    }

    /// Creates a fixture from literal bytes.
    pub fn literal(bytes: impl Into<Bytes>) -> Self {
        Self {
            payload: Ok(bytes.into()),
        }
    }

    /// Creates a fixture from a literal string.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            payload: Ok(Bytes::from(text.into())),
        }
    }

    /// Creates a fixture from the contents of a file.
    ///
    /// The file is read immediately; later changes to it are not observed.
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let payload = std::fs::read(path)
            .map(Bytes::from)
            .map_err(|source| FixtureError::Io {
                path: path.to_path_buf(),
                source,
            });
        Self { payload }
    }

    /// Creates a fixture by draining a reader.
    pub fn reader(mut reader: impl Read) -> Self {
        let mut buf = Vec::new();
        let payload = reader
            .read_to_end(&mut buf)
            .map(|_| Bytes::from(buf))
            .map_err(|source| FixtureError::Read { source });
        Self { payload }
    }

    /// Creates a fixture from the compact JSON encoding of `value`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        let payload = serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(FixtureError::from);
        Self { payload }
    }

    /// Creates a fixture from the XML encoding of `value`.
    ///
    /// The root element is named after the value's type, so this works for
    /// structs and enums. Use [`Fixture::xml_with_root`] for maps and other
    /// anonymous values.
    pub fn xml<T: Serialize + ?Sized>(value: &T) -> Self {
        let payload = quick_xml::se::to_string(value)
            .map(Bytes::from)
            .map_err(|e| FixtureError::Xml(e.to_string()));
        Self { payload }
    }

    /// Creates a fixture from the XML encoding of `value` under an explicit
    /// root element.
    pub fn xml_with_root<T: Serialize + ?Sized>(root: &str, value: &T) -> Self {
        let payload = quick_xml::se::to_string_with_root(root, value)
            .map(Bytes::from)
            .map_err(|e| FixtureError::Xml(e.to_string()));
        Self { payload }
    }

    /// Creates a fixture by encoding `value` with the given encoding.
    pub fn encoded<T: Serialize + ?Sized>(value: &T, encoding: Encoding) -> Self {
        match encoding {
            Encoding::Json => Self::json(value),
            Encoding::Xml => Self::xml(value),
        }
    }

    /// Returns `true` if the fixture resolved to a payload.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.payload.is_ok()
    }

    /// Returns the resolved payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_ref().ok().map(Bytes::as_ref)
    }

    /// Returns the resolution error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&FixtureError> {
        self.payload.as_ref().err()
    }

    /// Consumes the fixture, returning the payload or the resolution error.
    pub fn into_bytes(self) -> FixtureResult<Bytes> {
        self.payload
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::empty()
    }
}
