//!
//! Body digests in the `Digest` header format (`<PREFIX>=<base64(hash)>`)
//!

use crate::{Error, Result};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Hash algorithm used for body digests and as the message digest of the signature algorithms
#[derive(AsRefStr, Clone, Copy, Debug, Default, Display, EnumString, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    #[strum(serialize = "SHA-256")]
    Sha256,

    /// SHA-384
    #[strum(serialize = "SHA-384")]
    Sha384,

    /// SHA-512
    #[strum(serialize = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    /// Hash the data
    #[must_use]
    pub fn hash(&self, data: impl AsRef<[u8]>) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Size of the hash output in bits
    #[must_use]
    pub fn bit_size(&self) -> u16 {
        match self {
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }
}

/// Compute the value of the `Digest` header for the body
#[must_use]
pub fn compute(algorithm: HashAlgorithm, body: &[u8]) -> String {
    let encoded_hash = base64_simd::STANDARD.encode_to_string(algorithm.hash(body));
    format!("{}={encoded_hash}", algorithm.as_ref())
}

/// Determine which hash algorithm a `Digest` header value was computed with
///
/// The prefix is matched case-sensitively against the supported prefixes
pub fn parse(value: &str) -> Result<HashAlgorithm> {
    let (prefix, _hash) = value.split_once('=').ok_or(Error::MalformedDigest)?;
    HashAlgorithm::from_str(prefix.trim()).map_err(|_| Error::MalformedDigest)
}

/// Recompute the digest over the body with the algorithm named by the header value and compare both byte-by-byte
pub fn verify(value: &str, body: &[u8]) -> Result<()> {
    let algorithm = parse(value)?;
    if compute(algorithm, body) == value {
        Ok(())
    } else {
        Err(Error::DigestMismatch)
    }
}
