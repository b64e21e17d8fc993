//!
//! Wire form of the detached signature: `<protected header>..<signature>`
//!

use crate::{Error, Result, SIGNATURE_SEPARATOR};
use std::{fmt, str::FromStr};

/// Both Base64url encoded parts of a detached signature
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureEnvelope {
    pub encoded_protected_header: String,
    pub encoded_signature: String,
}

impl SignatureEnvelope {
    /// Assemble an envelope from the encoded protected header and the raw signature bytes
    #[must_use]
    pub fn new(encoded_protected_header: String, signature: &[u8]) -> Self {
        Self {
            encoded_protected_header,
            encoded_signature: base64_simd::URL_SAFE_NO_PAD.encode_to_string(signature),
        }
    }

    /// Split a header value on the separator
    ///
    /// Exactly two non-empty parts are accepted
    pub fn parse(value: &str) -> Result<Self> {
        let mut parts = value.split(SIGNATURE_SEPARATOR);
        let (Some(protected_header), Some(signature), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::MalformedSignatureHeader);
        };

        if protected_header.is_empty() || signature.is_empty() {
            return Err(Error::MalformedSignatureHeader);
        }

        Ok(Self {
            encoded_protected_header: protected_header.to_string(),
            encoded_signature: signature.to_string(),
        })
    }

    /// Decode the raw signature bytes
    pub fn signature(&self) -> Result<Vec<u8>> {
        let signature = base64_simd::URL_SAFE_NO_PAD
            .decode_to_vec(self.encoded_signature.trim_end_matches('='))?;
        Ok(signature)
    }
}

impl FromStr for SignatureEnvelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SignatureEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SIGNATURE_SEPARATOR}{}",
            self.encoded_protected_header, self.encoded_signature
        )
    }
}
