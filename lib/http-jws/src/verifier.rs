//!
//! Verification of detached signatures on incoming messages
//!

use crate::{
    algorithm,
    certificate::Certificate,
    chain::ChainPolicy,
    digest,
    envelope::SignatureEnvelope,
    message::{HttpMessage, MessageKind},
    protected_header::ProtectedHeader,
    Error, Result, DIGEST_HEADER, ORGANIZATION_IDENTIFIER_HEADER, SIGNATURE_HEADER,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument, warn};
use typed_builder::TypedBuilder;

/// How far the signing time may lie ahead of the check time (exclusive)
pub const MAX_CLOCK_LEAD_MS: i64 = 2_000;

/// How far the signing time may lie behind the check time (inclusive)
pub const MAX_SIGNATURE_AGE_MS: i64 = 60_000;

/// Result of a successful verification
#[derive(Clone, Debug)]
pub struct VerifiedSignature {
    /// Protected header of the verified signature
    pub protected_header: ProtectedHeader,

    /// Leaf certificate the signature was verified with
    pub signer_certificate: Certificate,
}

/// HTTP message verifier
#[derive(Clone, Debug, TypedBuilder)]
pub struct HttpVerifier {
    /// Reject signatures created outside of the accepted window around the check time
    #[builder(default = true)]
    check_signature_time: bool,

    /// Compare the organization identifier of the signer certificate with the one claimed by the request
    #[builder(default = true)]
    check_organization_identifier: bool,

    /// Policy the signer certificate chain is validated under
    #[builder(default)]
    chain_policy: ChainPolicy,
}

impl HttpVerifier {
    /// Verify the signature of the message against the current time
    pub fn verify<M>(&self, message: &M) -> Result<VerifiedSignature>
    where
        M: HttpMessage,
    {
        self.verify_at(message, OffsetDateTime::now_utc())
    }

    /// Verify the signature of the message
    ///
    /// `check_time` is the reference for the signing time window and the certificate validity
    #[instrument(skip_all)]
    pub fn verify_at<M>(&self, message: &M, check_time: OffsetDateTime) -> Result<VerifiedSignature>
    where
        M: HttpMessage,
    {
        self.verify_inner(message, check_time).inspect_err(|error| {
            warn!(%error, kind = ?M::KIND, "signature verification failed");
        })
    }

    fn verify_inner<M>(&self, message: &M, check_time: OffsetDateTime) -> Result<VerifiedSignature>
    where
        M: HttpMessage,
    {
        let signature_header = message
            .header_value(SIGNATURE_HEADER)?
            .ok_or_else(|| Error::HeaderMissing(SIGNATURE_HEADER.to_string()))?;
        message.check_mandatory_headers()?;

        let envelope = SignatureEnvelope::parse(&signature_header)?;
        let protected_header = ProtectedHeader::decode(&envelope.encoded_protected_header)?;
        debug!(?protected_header, "decoded protected header");

        if self.check_signature_time {
            check_time_window(protected_header.signature_time(), check_time)?;
        }

        let digest_header = message
            .header_value(DIGEST_HEADER)?
            .ok_or_else(|| Error::HeaderMissing(DIGEST_HEADER.to_string()))?;
        digest::verify(&digest_header, message.body())?;

        let mut certificates = protected_header.certificates()?.into_iter();
        let signer_certificate = certificates.next().ok_or(Error::NoCertificatesPresent)?;
        let extra = certificates.collect::<Vec<_>>();
        self.chain_policy
            .build(&signer_certificate, &extra, check_time)?
            .into_result()?;

        if M::KIND == MessageKind::Request && self.check_organization_identifier {
            check_organization_identifier(message, &signer_certificate)?;
        }

        let verifier =
            algorithm::create_verifier(&signer_certificate, protected_header.algorithm_name())?;
        let payload = message.compose_canonical_string(protected_header.parameters(), &[])?;
        debug!(%payload, "composed verification payload");

        let signing_input = format!("{}.{payload}", envelope.encoded_protected_header);
        let signature = envelope.signature()?;
        if !verifier.verify(signing_input.as_bytes(), &signature) {
            return Err(Error::SignatureInvalid);
        }

        Ok(VerifiedSignature {
            protected_header,
            signer_certificate,
        })
    }
}

/// Accept signing times less than 2 s ahead and at most 60 s behind the check time
///
/// The offset is compared at full precision, so 60000.5 ms of age is already too old
fn check_time_window(signature_time: OffsetDateTime, check_time: OffsetDateTime) -> Result<()> {
    let offset = signature_time - check_time;
    if offset >= Duration::milliseconds(MAX_CLOCK_LEAD_MS)
        || -offset > Duration::milliseconds(MAX_SIGNATURE_AGE_MS)
    {
        return Err(Error::SignatureTimeInvalid {
            offset_ms: offset.whole_milliseconds(),
        });
    }

    Ok(())
}

fn check_organization_identifier<M>(message: &M, signer_certificate: &Certificate) -> Result<()>
where
    M: HttpMessage,
{
    let certified = signer_certificate.organization_identifier()?;
    let claimed = message.header_value(ORGANIZATION_IDENTIFIER_HEADER)?;

    match (certified, claimed) {
        (Some(certified), Some(claimed)) if certified == claimed => Ok(()),
        (certified, claimed) => {
            debug!(?certified, ?claimed, "organization identifier mismatch");
            Err(Error::OrganizationIdentifierMismatch)
        }
    }
}

#[cfg(test)]
mod test {
    use super::check_time_window;
    use crate::Error;
    use time::{macros::datetime, Duration};

    #[test]
    fn time_window_boundaries() {
        let check_time = datetime!(2024-05-01 12:00:00 UTC);
        let at = |offset_ms: i64| check_time + Duration::milliseconds(offset_ms);

        assert!(check_time_window(at(0), check_time).is_ok());
        assert!(check_time_window(at(1_999), check_time).is_ok());
        assert!(matches!(
            check_time_window(at(2_000), check_time),
            Err(Error::SignatureTimeInvalid { offset_ms: 2_000 })
        ));
        assert!(check_time_window(at(-60_000), check_time).is_ok());
        assert!(matches!(
            check_time_window(at(-60_001), check_time),
            Err(Error::SignatureTimeInvalid { offset_ms: -60_001 })
        ));
    }

    #[test]
    fn time_window_is_not_truncated_to_milliseconds() {
        let check_time = datetime!(2024-05-01 12:00:00 UTC);

        assert!(matches!(
            check_time_window(check_time - Duration::microseconds(60_000_500), check_time),
            Err(Error::SignatureTimeInvalid { offset_ms: -60_000 })
        ));
        assert!(matches!(
            check_time_window(check_time + Duration::microseconds(1_999_500), check_time),
            Ok(())
        ));
        assert!(matches!(
            check_time_window(check_time + Duration::nanoseconds(2_000_000_000), check_time),
            Err(Error::SignatureTimeInvalid { .. })
        ));
    }
}
