use super::{AlgorithmSpec, Family};
use crate::{digest::HashAlgorithm, Result};
use p521::{ecdsa::signature::Signer, pkcs8::DecodePrivateKey};
use ring::{
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, EcdsaSigningAlgorithm, RsaEncoding, RsaKeyPair,
        ECDSA_P256_SHA256_FIXED_SIGNING, ECDSA_P384_SHA384_FIXED_SIGNING, RSA_PKCS1_SHA256,
        RSA_PKCS1_SHA384, RSA_PKCS1_SHA512, RSA_PSS_SHA256, RSA_PSS_SHA384, RSA_PSS_SHA512,
    },
};
use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

enum KeyPair {
    Rsa {
        key: RsaKeyPair,
        padding: &'static dyn RsaEncoding,
    },
    Ecdsa(EcdsaKeyPair),
    P521(p521::ecdsa::SigningKey),
}

impl KeyPair {
    fn from_pkcs8(spec: &AlgorithmSpec, der: &[u8], rng: &SystemRandom) -> Result<Self> {
        let key_pair = match (spec.family, spec.hash) {
            (Family::RsaPkcs1 | Family::RsaPss, hash) => Self::Rsa {
                key: RsaKeyPair::from_pkcs8(der)?,
                padding: rsa_padding(spec.family, hash),
            },
            (Family::Ecdsa, HashAlgorithm::Sha256) => {
                Self::Ecdsa(ecdsa_key_pair(&ECDSA_P256_SHA256_FIXED_SIGNING, der, rng)?)
            }
            (Family::Ecdsa, HashAlgorithm::Sha384) => {
                Self::Ecdsa(ecdsa_key_pair(&ECDSA_P384_SHA384_FIXED_SIGNING, der, rng)?)
            }
            (Family::Ecdsa, HashAlgorithm::Sha512) => {
                let secret_key = p521::SecretKey::from_pkcs8_der(der)?;
                Self::P521(p521::ecdsa::SigningKey::from_slice(&secret_key.to_bytes())?)
            }
        };

        Ok(key_pair)
    }

    fn sign(&self, rng: &SystemRandom, msg: &[u8]) -> Result<Vec<u8>> {
        let signature = match self {
            Self::Rsa { key, padding } => {
                let mut buf = vec![0; key.public().modulus_len()];
                key.sign(*padding, rng, msg, &mut buf)?;
                buf
            }
            Self::Ecdsa(key) => key.sign(rng, msg)?.as_ref().to_vec(),
            Self::P521(key) => {
                let signature: p521::ecdsa::Signature = key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
        };

        Ok(signature)
    }
}

fn rsa_padding(family: Family, hash: HashAlgorithm) -> &'static dyn RsaEncoding {
    match (family, hash) {
        (Family::RsaPss, HashAlgorithm::Sha256) => &RSA_PSS_SHA256,
        (Family::RsaPss, HashAlgorithm::Sha384) => &RSA_PSS_SHA384,
        (Family::RsaPss, HashAlgorithm::Sha512) => &RSA_PSS_SHA512,
        (_, HashAlgorithm::Sha256) => &RSA_PKCS1_SHA256,
        (_, HashAlgorithm::Sha384) => &RSA_PKCS1_SHA384,
        (_, HashAlgorithm::Sha512) => &RSA_PKCS1_SHA512,
    }
}

fn ecdsa_key_pair(
    algorithm: &'static EcdsaSigningAlgorithm,
    der: &[u8],
    rng: &SystemRandom,
) -> Result<EcdsaKeyPair> {
    Ok(EcdsaKeyPair::from_pkcs8(algorithm, der, rng)?)
}

/// Signing half of an algorithm
///
/// The key pair sits behind a mutex so a single signer can be shared between threads
pub struct AlgorithmSigner {
    spec: &'static AlgorithmSpec,
    key_pair: Mutex<KeyPair>,
    rng: SystemRandom,
}

impl AlgorithmSigner {
    pub(super) fn new(spec: &'static AlgorithmSpec, pkcs8_der: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        let key_pair = KeyPair::from_pkcs8(spec, pkcs8_der, &rng)?;

        Ok(Self {
            spec,
            key_pair: Mutex::new(key_pair),
            rng,
        })
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

    /// Sign the data and return the raw signature bytes
    ///
    /// ECDSA signatures are returned in the fixed-size `r || s` form
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key_pair = self
            .key_pair
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        key_pair.sign(&self.rng, data)
    }
}

impl fmt::Debug for AlgorithmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmSigner")
            .field("name", &self.spec.name)
            .finish_non_exhaustive()
    }
}
