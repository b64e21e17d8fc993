//!
//! Creation of detached signatures for outgoing messages
//!

use crate::{
    algorithm::{self, AlgorithmSigner},
    certificate::{Certificate, SigningCertificate},
    chain::ChainResolver,
    digest::{self, HashAlgorithm},
    envelope::SignatureEnvelope,
    message::HttpMessage,
    protected_header::ProtectedHeader,
    Error, Result, DIGEST_HEADER, SIGNATURE_HEADER,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

/// Headers produced by a signing operation
#[derive(Clone, Debug)]
pub struct SignatureOutput {
    /// Value of the `digest` header
    pub digest_header_value: String,

    /// Value of the `x-jws-signature` header
    pub signature: SignatureEnvelope,

    /// Protected header that was signed
    pub protected_header: ProtectedHeader,
}

impl SignatureOutput {
    /// Value of the `x-jws-signature` header
    #[must_use]
    pub fn signature_header_value(&self) -> String {
        self.signature.to_string()
    }

    /// Insert the `digest` and `x-jws-signature` headers, replacing existing values
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(
            HeaderName::from_static(DIGEST_HEADER),
            HeaderValue::from_str(&self.digest_header_value)?,
        );
        headers.insert(
            HeaderName::from_static(SIGNATURE_HEADER),
            HeaderValue::from_str(&self.signature_header_value())?,
        );

        Ok(())
    }
}

/// HTTP message signer
///
/// Holds no per-call state, so one instance can sign any number of messages concurrently
#[derive(Clone, Debug, TypedBuilder)]
pub struct HttpSigner {
    /// Signing algorithm along with the private key
    #[builder(default, setter(strip_option, into))]
    algorithm: Option<Arc<AlgorithmSigner>>,

    /// Certificate of the signer
    #[builder(default, setter(strip_option))]
    certificate: Option<Certificate>,

    /// Chain of the signer certificate, leaf and root excluded
    #[builder(default, setter(strip_option))]
    chain: Option<Vec<Certificate>>,

    /// Hash algorithm of the body digest. Defaults to the hash of the signing algorithm
    #[builder(default, setter(strip_option))]
    digest_algorithm: Option<HashAlgorithm>,
}

impl HttpSigner {
    /// Create a fully configured signer for the certificate, resolving its chain through the resolver
    pub fn from_certificate<R>(
        signing_certificate: &SigningCertificate,
        algorithm_name: &str,
        resolver: &R,
    ) -> Result<Self>
    where
        R: ChainResolver + ?Sized,
    {
        let algorithm = algorithm::create_signer(signing_certificate, algorithm_name)?;
        let chain = resolver.resolve_chain(signing_certificate.certificate())?;

        Ok(Self::builder()
            .algorithm(algorithm)
            .certificate(signing_certificate.certificate().clone())
            .chain(chain)
            .build())
    }

    /// Sign the message at the current time
    pub fn create_signature<M>(&self, message: &M) -> Result<SignatureOutput>
    where
        M: HttpMessage,
    {
        self.create_signature_at(message, OffsetDateTime::now_utc())
    }

    /// Sign the message, recording `signature_time` as the signing time
    #[instrument(skip_all)]
    pub fn create_signature_at<M>(
        &self,
        message: &M,
        signature_time: OffsetDateTime,
    ) -> Result<SignatureOutput>
    where
        M: HttpMessage,
    {
        let algorithm = self.algorithm.as_ref().ok_or(Error::NotConfigured("algorithm"))?;
        let certificate = self
            .certificate
            .as_ref()
            .ok_or(Error::NotConfigured("certificate"))?;
        let chain = self.chain.as_ref().ok_or(Error::NotConfigured("chain"))?;

        let digest_algorithm = self
            .digest_algorithm
            .unwrap_or_else(|| algorithm.hash_algorithm());
        let digest_header_value = digest::compute(digest_algorithm, message.body());

        let mut protected_header = ProtectedHeader::new(algorithm.name(), signature_time);
        for name in message.list_signable_header_names()? {
            protected_header.add_parameter(&name);
        }
        protected_header.set_certificates(certificate, chain);

        let encoded_protected_header = protected_header.encode()?;
        let payload = message.compose_canonical_string(
            protected_header.parameters(),
            &[(DIGEST_HEADER, digest_header_value.as_str())],
        )?;
        debug!(%payload, "composed signing payload");

        let signing_input = format!("{encoded_protected_header}.{payload}");
        let signature = algorithm.sign(signing_input.as_bytes())?;

        Ok(SignatureOutput {
            digest_header_value,
            signature: SignatureEnvelope::new(encoded_protected_header, &signature),
            protected_header,
        })
    }
}

#[cfg(test)]
mod test {
    use super::HttpSigner;
    use crate::{message::HttpRequestData, Error};
    use http::{Method, Uri};

    #[test]
    fn unconfigured_signer() {
        let request = HttpRequestData::new(Method::GET, Uri::from_static("/"));
        let signer = HttpSigner::builder().build();

        assert!(matches!(
            signer.create_signature(&request),
            Err(Error::NotConfigured("algorithm"))
        ));
    }
}
