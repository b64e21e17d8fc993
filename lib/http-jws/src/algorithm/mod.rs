//!
//! Signature algorithms addressable by their JWS identifier
//!

use crate::{
    certificate::{Certificate, SigningCertificate},
    digest::HashAlgorithm,
    Error, Result,
};

mod sign;
mod verify;

pub use self::sign::AlgorithmSigner;
pub use self::verify::AlgorithmVerifier;

/// Signature scheme family
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    /// RSASSA-PKCS1-v1_5
    RsaPkcs1,

    /// RSASSA-PSS
    RsaPss,

    /// ECDSA over the NIST curve matching the hash size
    Ecdsa,
}

/// Static description of a registered algorithm
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AlgorithmSpec {
    /// JWS identifier (`alg`)
    pub name: &'static str,

    /// Message digest used by the scheme
    pub hash: HashAlgorithm,

    /// Scheme family
    pub family: Family,
}

macro_rules! algorithm {
    ($name:literal, $hash:ident, $family:ident) => {
        AlgorithmSpec {
            name: $name,
            hash: HashAlgorithm::$hash,
            family: Family::$family,
        }
    };
}

/// Every supported algorithm
pub static REGISTRY: &[AlgorithmSpec] = &[
    algorithm!("RS256", Sha256, RsaPkcs1),
    algorithm!("RS384", Sha384, RsaPkcs1),
    algorithm!("RS512", Sha512, RsaPkcs1),
    algorithm!("PS256", Sha256, RsaPss),
    algorithm!("PS384", Sha384, RsaPss),
    algorithm!("PS512", Sha512, RsaPss),
    algorithm!("ES256", Sha256, Ecdsa),
    algorithm!("ES384", Sha384, Ecdsa),
    algorithm!("ES512", Sha512, Ecdsa),
];

/// Look up an algorithm by its identifier
///
/// The lookup ignores ASCII case
pub fn lookup(name: &str) -> Result<&'static AlgorithmSpec> {
    REGISTRY
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnsupportedAlgorithm(name.to_string()))
}

/// Create a signing strategy from the private key carried by the certificate
#[inline]
pub fn create_signer(certificate: &SigningCertificate, name: &str) -> Result<AlgorithmSigner> {
    let spec = lookup(name)?;
    let private_key = certificate.private_key().ok_or(Error::MissingPrivateKey)?;

    AlgorithmSigner::new(spec, private_key)
}

/// Create a verification strategy from the public key of the certificate
#[inline]
pub fn create_verifier(certificate: &Certificate, name: &str) -> Result<AlgorithmVerifier> {
    let spec = lookup(name)?;
    AlgorithmVerifier::new(spec, certificate)
}
