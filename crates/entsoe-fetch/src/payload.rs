//! Successful response bodies.

use bytes::Bytes;

use entsoe_types::Result;

use crate::archive;

/// Encoding of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// A single XML market document.
    Xml,
    /// A ZIP archive of XML documents.
    Zip,
}

impl PayloadKind {
    /// Returns the kind as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Zip => "zip",
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw bytes of a successful response, tagged with their encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    kind: PayloadKind,
    body: Bytes,
}

impl Payload {
    /// Wraps a response body, detecting ZIP archives by their signature.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let kind = if archive::is_zip(&body) {
            PayloadKind::Zip
        } else {
            PayloadKind::Xml
        };
        Self { kind, body }
    }

    /// Returns the encoding.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the XML documents carried by the payload.
    ///
    /// A plain XML payload yields itself; an archive yields its XML members.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read.
    pub fn documents(&self) -> Result<Vec<Vec<u8>>> {
        match self.kind {
            PayloadKind::Xml => Ok(vec![self.body.to_vec()]),
            PayloadKind::Zip => Ok(archive::xml_members(&self.body)?
                .into_iter()
                .map(|(_, content)| content)
                .collect()),
        }
    }
}
