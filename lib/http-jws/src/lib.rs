//!
//! Detached JWS signatures for HTTP messages
//!
//! Signs a fixed set of headers, the `psu-*` headers and the body digest of requests and responses,
//! and verifies them including the certificate chain of the signer.
//!

pub mod algorithm;
pub mod certificate;
pub mod chain;
pub mod config;
pub mod digest;
pub mod envelope;
pub mod locator;
pub mod message;
pub mod protected_header;
pub mod signer;
pub mod verifier;

mod error;

pub use self::error::Error;
pub use self::message::{HttpMessage, HttpRequestData, HttpResponseData};
pub use self::signer::{HttpSigner, SignatureOutput};
pub use self::verifier::{HttpVerifier, VerifiedSignature};

/// Result type with the error defaulting to [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Header carrying the detached signature
pub const SIGNATURE_HEADER: &str = "x-jws-signature";

/// Header carrying the body digest
pub const DIGEST_HEADER: &str = "digest";

/// Header carrying the organization identifier the requesting party claims
pub const ORGANIZATION_IDENTIFIER_HEADER: &str = "x-organization-identifier";

/// Separator between the protected header and the signature
pub const SIGNATURE_SEPARATOR: &str = "..";

/// Prefix of the PSU headers that are always signed
pub const PSU_PREFIX: &str = "psu-";
