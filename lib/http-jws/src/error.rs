#![allow(missing_docs)]

use crate::chain::ChainStatusList;
use http::header::{InvalidHeaderValue, ToStrError};
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    #[error("Certificate chain validation failed: {0}")]
    CertificateValidationFailed(ChainStatusList),

    /// Resolution failure shared between concurrent callers waiting on the same chain
    ///
    /// The source holds the error of the underlying resolver
    #[error("Failed to resolve certificate chain")]
    ChainResolution(#[source] Arc<Error>),

    #[error("Digest mismatch")]
    DigestMismatch,

    #[error("Header '{0}' is missing")]
    HeaderMissing(String),

    #[error(transparent)]
    HttpHeaderToStr(#[from] ToStrError),

    #[error(transparent)]
    InvalidHeaderValue(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    KeyRejected(#[from] ring::error::KeyRejected),

    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("Malformed digest")]
    MalformedDigest,

    #[error("Malformed signature header")]
    MalformedSignatureHeader,

    #[error("Private key is missing")]
    MissingPrivateKey,

    #[error("No certificates in 'x5c' field")]
    NoCertificatesPresent,

    #[error("Signer is not configured: '{0}' is not set")]
    NotConfigured(&'static str),

    #[error("Organization identifier of the signer certificate doesn't match the claimed one")]
    OrganizationIdentifierMismatch,

    #[error(transparent)]
    P521(#[from] p521::ecdsa::signature::Error),

    #[error(transparent)]
    Pkcs8(#[from] pkcs8::Error),

    #[error(transparent)]
    Pkcs8Der(#[from] pkcs8::der::Error),

    #[error(transparent)]
    RingUnspecified(#[from] ring::error::Unspecified),

    #[error("Can't verify signature")]
    SignatureInvalid,

    #[error("Signing time is outside of the accepted window ({offset_ms} ms relative to check time)")]
    SignatureTimeInvalid { offset_ms: i128 },

    #[error("Unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

impl From<x509_parser::nom::Err<x509_parser::error::X509Error>> for Error {
    fn from(value: x509_parser::nom::Err<x509_parser::error::X509Error>) -> Self {
        Self::MalformedCertificate(value.to_string())
    }
}

impl From<x509_parser::error::X509Error> for Error {
    fn from(value: x509_parser::error::X509Error) -> Self {
        Self::MalformedCertificate(value.to_string())
    }
}

impl From<x509_parser::nom::Err<x509_parser::error::PEMError>> for Error {
    fn from(value: x509_parser::nom::Err<x509_parser::error::PEMError>) -> Self {
        Self::MalformedCertificate(value.to_string())
    }
}
