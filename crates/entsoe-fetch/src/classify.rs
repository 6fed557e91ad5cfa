//! Classification of provider error and acknowledgement documents.

use entsoe_types::EntsoeError;

use crate::xml::Element;

/// What a provider message means for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The query legitimately returned nothing.
    NoData,
    /// The request would return too many items and must be narrowed.
    PaginationRequired {
        /// Documents the request would have produced, if stated.
        requested: Option<u64>,
        /// Documents allowed per request, if stated.
        allowed: Option<u64>,
    },
    /// The combination of parameters is rejected.
    InvalidBusinessParameter(String),
    /// A parameter is not valid for the requested area.
    InvalidParameterForArea(String),
    /// Any other message.
    Unclassified,
}

/// Returns the reason text of an error payload.
///
/// Joins every `<text>` element of an acknowledgement document; falls back to
/// the raw body when there is none.
#[must_use]
pub fn reason_text(body: &str) -> String {
    let texts = Element::parse(body.as_bytes())
        .map(|root| {
            root.find_all("text")
                .into_iter()
                .map(|e| e.text().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if texts.is_empty() {
        body.trim().to_string()
    } else {
        texts.join(" ")
    }
}

/// Maps a reason text to an [`ErrorKind`], ignoring case.
#[must_use]
pub fn classify(text: &str) -> ErrorKind {
    let lower = text.to_lowercase();
    if lower.contains("no matching data found") {
        ErrorKind::NoData
    } else if lower.contains("amount of requested data exceeds allowed limit")
        || lower.contains("exceeds the allowed limit")
    {
        let numbers = integers(text);
        let mut tail = numbers.iter().rev();
        let allowed = tail.next().copied();
        let requested = tail.next().copied();
        ErrorKind::PaginationRequired { requested, allowed }
    } else if lower.contains("check you request against dependency tables") {
        ErrorKind::InvalidBusinessParameter(text.to_string())
    } else if lower.contains("is not valid for this area") {
        ErrorKind::InvalidParameterForArea(text.to_string())
    } else {
        ErrorKind::Unclassified
    }
}

/// Converts a non-success response into the matching error.
#[must_use]
pub fn into_error(status: u16, body: &str) -> EntsoeError {
    match classify(&reason_text(body)) {
        ErrorKind::NoData => EntsoeError::NoData,
        ErrorKind::PaginationRequired { requested, allowed } => {
            EntsoeError::PaginationRequired { requested, allowed }
        }
        ErrorKind::InvalidBusinessParameter(text) => EntsoeError::InvalidBusinessParameter(text),
        ErrorKind::InvalidParameterForArea(text) => EntsoeError::InvalidParameterForArea(text),
        ErrorKind::Unclassified => EntsoeError::Http {
            status,
            body: body.to_string(),
        },
    }
}

/// Checks a successful XML payload for an acknowledgement document.
///
/// The provider sometimes answers 200 with an acknowledgement instead of data;
/// such a payload is an error, never a result.
#[must_use]
pub fn acknowledgement(status: u16, body: &[u8]) -> Option<EntsoeError> {
    let head = &body[..body.len().min(512)];
    if !String::from_utf8_lossy(head).contains("Acknowledgement_MarketDocument") {
        return None;
    }
    Some(into_error(status, &String::from_utf8_lossy(body)))
}

fn integers(text: &str) -> Vec<u64> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter_map(|token| token.parse().ok())
        .collect()
}
