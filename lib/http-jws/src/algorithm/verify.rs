use super::{AlgorithmSpec, Family};
use crate::{certificate::Certificate, digest::HashAlgorithm, Result};
use p521::ecdsa::signature::Verifier;
use ring::signature::{
    UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_FIXED, ECDSA_P384_SHA384_FIXED,
    RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
    RSA_PSS_2048_8192_SHA256, RSA_PSS_2048_8192_SHA384, RSA_PSS_2048_8192_SHA512,
};
use std::fmt;

fn ring_algorithm(spec: &AlgorithmSpec) -> Option<&'static dyn VerificationAlgorithm> {
    let algorithm: &'static dyn VerificationAlgorithm = match (spec.family, spec.hash) {
        (Family::RsaPkcs1, HashAlgorithm::Sha256) => &RSA_PKCS1_2048_8192_SHA256,
        (Family::RsaPkcs1, HashAlgorithm::Sha384) => &RSA_PKCS1_2048_8192_SHA384,
        (Family::RsaPkcs1, HashAlgorithm::Sha512) => &RSA_PKCS1_2048_8192_SHA512,
        (Family::RsaPss, HashAlgorithm::Sha256) => &RSA_PSS_2048_8192_SHA256,
        (Family::RsaPss, HashAlgorithm::Sha384) => &RSA_PSS_2048_8192_SHA384,
        (Family::RsaPss, HashAlgorithm::Sha512) => &RSA_PSS_2048_8192_SHA512,
        (Family::Ecdsa, HashAlgorithm::Sha256) => &ECDSA_P256_SHA256_FIXED,
        (Family::Ecdsa, HashAlgorithm::Sha384) => &ECDSA_P384_SHA384_FIXED,
        (Family::Ecdsa, HashAlgorithm::Sha512) => return None,
    };

    Some(algorithm)
}

enum PublicKey {
    Ring(UnparsedPublicKey<Vec<u8>>),
    P521(Vec<u8>),
}

/// Verification half of an algorithm
///
/// Only needs the public key, so it is safe to use from multiple threads at once
pub struct AlgorithmVerifier {
    spec: &'static AlgorithmSpec,
    public_key: PublicKey,
}

impl AlgorithmVerifier {
    pub(super) fn new(spec: &'static AlgorithmSpec, certificate: &Certificate) -> Result<Self> {
        let parsed = certificate.parse()?;
        let key_bytes = parsed.public_key().subject_public_key.data.to_vec();

        Ok(Self::from_public_key(spec, key_bytes))
    }

    /// Construct from the contents of the `subjectPublicKey` bit string
    ///
    /// That is the `RSAPublicKey` structure for RSA and the uncompressed SEC1 point for ECDSA
    pub(super) fn from_public_key(spec: &'static AlgorithmSpec, key_bytes: Vec<u8>) -> Self {
        let public_key = match ring_algorithm(spec) {
            Some(algorithm) => PublicKey::Ring(UnparsedPublicKey::new(algorithm, key_bytes)),
            None => PublicKey::P521(key_bytes),
        };

        Self { spec, public_key }
    }

    /// JWS identifier of the algorithm
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    #[must_use]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.spec.hash
    }

    /// Check the signature over the data
    ///
    /// A key that doesn't fit the algorithm is reported as an invalid signature
    #[must_use]
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self.public_key {
            PublicKey::Ring(ref key) => key.verify(data, signature).is_ok(),
            PublicKey::P521(ref key_bytes) => {
                let Ok(key) = p521::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes) else {
                    return false;
                };
                let Ok(signature) = p521::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };

                key.verify(data, &signature).is_ok()
            }
        }
    }
}

impl fmt::Debug for AlgorithmVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmVerifier")
            .field("name", &self.spec.name)
            .finish_non_exhaustive()
    }
}
