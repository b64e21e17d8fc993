//!
//! HTTP message model and the canonical string the signature is computed over
//!

use crate::{Error, Result, DIGEST_HEADER, PSU_PREFIX};
use http::HeaderMap;

mod request;
mod response;

pub use self::request::HttpRequestData;
pub use self::response::HttpResponseData;

/// Pseudo-header carrying the lower-cased method and the path with query
pub const REQUEST_TARGET: &str = "(request-target)";

/// Pseudo-header carrying the numeric status code
pub const RESPONSE_STATUS: &str = "(response-status)";

/// Whether a header has to be present for the message to be signed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Necessity {
    /// Signing fails if the header is absent
    Mandatory,

    /// Signed only if present
    IfPresent,
}

/// Message direction
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageKind {
    Request,
    Response,
}

/// Components of the canonical string
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureComponent<'a> {
    /// `(request-target)`
    RequestTarget,

    /// `(response-status)`
    ResponseStatus,

    /// Regular header
    Header(&'a str),
}

impl<'a> SignatureComponent<'a> {
    fn from_str(raw: &'a str) -> Self {
        if raw.eq_ignore_ascii_case(REQUEST_TARGET) {
            Self::RequestTarget
        } else if raw.eq_ignore_ascii_case(RESPONSE_STATUS) {
            Self::ResponseStatus
        } else {
            Self::Header(raw)
        }
    }
}

/// Message that can be signed and verified
pub trait HttpMessage {
    /// Fixed list of headers taken into the signature, in signing order
    const NECESSARY_HEADERS: &'static [(&'static str, Necessity)];

    /// Pseudo-header this message kind synthesizes
    const PSEUDO_HEADER: &'static str;

    const KIND: MessageKind;

    fn headers(&self) -> &HeaderMap;

    fn body(&self) -> &[u8];

    /// Value of [`Self::PSEUDO_HEADER`]
    fn pseudo_header_value(&self) -> String;

    /// Value of the header, with repeated values joined by `", "`
    fn header_value(&self, name: &str) -> Result<Option<String>> {
        let mut values = self.headers().get_all(name).iter().peekable();
        if values.peek().is_none() {
            return Ok(None);
        }

        let values = values
            .map(|value| value.to_str())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(values.join(", ")))
    }

    /// Names of the headers to sign, in signing order
    ///
    /// The pseudo-header and `digest` are always listed, the digest being injected during signing.
    /// Every `psu-*` header of the message follows the fixed list.
    fn list_signable_header_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(Self::NECESSARY_HEADERS.len());

        for (name, necessity) in Self::NECESSARY_HEADERS {
            let always_signed = *name == Self::PSEUDO_HEADER || *name == DIGEST_HEADER;
            if always_signed || self.headers().contains_key(*name) {
                names.push((*name).to_string());
            } else if *necessity == Necessity::Mandatory {
                return Err(Error::HeaderMissing((*name).to_string()));
            }
        }

        names.extend(
            self.headers()
                .keys()
                .map(http::HeaderName::as_str)
                .filter(|name| {
                    name.get(..PSU_PREFIX.len())
                        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PSU_PREFIX))
                })
                .map(str::to_ascii_lowercase),
        );

        Ok(names)
    }

    /// Make sure every mandatory header is present
    ///
    /// Pseudo-headers are always derivable and therefore skipped
    fn check_mandatory_headers(&self) -> Result<()> {
        Self::NECESSARY_HEADERS
            .iter()
            .filter(|(name, necessity)| {
                *necessity == Necessity::Mandatory && *name != Self::PSEUDO_HEADER
            })
            .find(|(name, _)| !self.headers().contains_key(*name))
            .map_or(Ok(()), |(name, _)| {
                Err(Error::HeaderMissing((*name).to_string()))
            })
    }

    /// Build the canonical string for the given header names
    ///
    /// Values missing from the message are looked up in `extra_values`
    fn compose_canonical_string<S>(&self, names: &[S], extra_values: &[(&str, &str)]) -> Result<String>
    where
        S: AsRef<str>,
    {
        let lines = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let value = match (SignatureComponent::from_str(name), Self::KIND) {
                    (SignatureComponent::RequestTarget, MessageKind::Request)
                    | (SignatureComponent::ResponseStatus, MessageKind::Response) => {
                        self.pseudo_header_value()
                    }
                    _ => match self.header_value(name)? {
                        Some(value) => value,
                        None => extra_values
                            .iter()
                            .find(|(extra_name, _)| extra_name.eq_ignore_ascii_case(name))
                            .map(|(_, value)| (*value).to_string())
                            .ok_or_else(|| Error::HeaderMissing(name.to_string()))?,
                    },
                };

                Ok(format!("{}: {value}", name.to_ascii_lowercase()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(lines.join("\n"))
    }
}
