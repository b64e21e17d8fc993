//!
//! Certificate chain building and validation
//!

use crate::{certificate::Certificate, Error, Result};
use std::{fmt, sync::Arc};
use strum::{AsRefStr, Display};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use x509_parser::certificate::X509Certificate;

mod resolver;

pub use self::resolver::{CachedChainResolver, ChainResolver, PolicyChainResolver};

/// Upper bound on the number of certificates in a chain, guards against issuer loops
const MAX_CHAIN_LENGTH: usize = 16;

/// How revocation of the chain elements is checked
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum RevocationMode {
    /// Revocation isn't checked
    #[default]
    NoCheck,

    /// Only locally available revocation data is consulted
    Offline,

    /// Revocation data may be fetched
    Online,
}

/// Conditions that are tolerated while validating a chain
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct VerificationFlags {
    pub ignore_not_time_valid: bool,
    pub allow_unknown_certificate_authority: bool,
    pub ignore_invalid_basic_constraints: bool,
    pub ignore_revocation_unknown: bool,
}

impl VerificationFlags {
    /// Tolerate every condition
    #[must_use]
    pub const fn all() -> Self {
        Self {
            ignore_not_time_valid: true,
            allow_unknown_certificate_authority: true,
            ignore_invalid_basic_constraints: true,
            ignore_revocation_unknown: true,
        }
    }
}

/// Reason a chain isn't valid
#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ChainStatusKind {
    NotTimeValid,
    NotSignatureValid,
    UntrustedRoot,
    PartialChain,
    InvalidBasicConstraints,
    Revoked,
    RevocationStatusUnknown,
}

/// Single problem found while building a chain
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainStatus {
    pub kind: ChainStatusKind,
    pub information: String,
}

impl ChainStatus {
    fn new(kind: ChainStatusKind, information: impl Into<String>) -> Self {
        Self {
            kind,
            information: information.into(),
        }
    }
}

impl fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.information)
    }
}

/// Every problem found while building a chain
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChainStatusList(pub Vec<ChainStatus>);

impl ChainStatusList {
    #[must_use]
    pub fn contains(&self, kind: ChainStatusKind) -> bool {
        self.0.iter().any(|status| status.kind == kind)
    }
}

impl fmt::Display for ChainStatusList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, status) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(status, f)?;
        }

        Ok(())
    }
}

/// Revocation state of a certificate
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevocationStatus {
    Good,
    Revoked,
    Unknown,
}

/// Caller-supplied revocation lookup
pub trait RevocationChecker: Send + Sync {
    /// Check the certificate issued by `issuer` (`None` if the issuer couldn't be found)
    fn check(
        &self,
        certificate: &Certificate,
        issuer: Option<&Certificate>,
        mode: RevocationMode,
    ) -> RevocationStatus;
}

/// Outcome of building a chain
#[derive(Clone, Debug)]
pub struct ChainBuild {
    /// Chain elements, leaf first
    pub elements: Vec<Certificate>,

    /// Problems found, empty if the chain is valid
    pub statuses: ChainStatusList,

    /// Whether the last element is a self-issued root
    pub ends_in_root: bool,
}

impl ChainBuild {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.statuses.0.is_empty()
    }

    /// Chain elements between the leaf and the root, both excluded
    #[must_use]
    pub fn intermediates(&self) -> &[Certificate] {
        let end = if self.ends_in_root {
            self.elements.len().saturating_sub(1)
        } else {
            self.elements.len()
        };

        self.elements.get(1..end).unwrap_or_default()
    }

    /// Turn a build with statuses into [`Error::CertificateValidationFailed`]
    pub fn into_result(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(Error::CertificateValidationFailed(self.statuses))
        }
    }
}

fn is_self_issued(certificate: &X509Certificate<'_>) -> bool {
    certificate.subject().as_raw() == certificate.issuer().as_raw()
}

fn is_issued_by(child: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    child.issuer().as_raw() == issuer.subject().as_raw()
        && child.verify_signature(Some(issuer.public_key())).is_ok()
}

/// Policy the chain of the signing certificate is validated under
#[derive(Clone, Default)]
pub struct ChainPolicy {
    /// Trust anchors
    pub trusted_roots: Vec<Certificate>,
    pub revocation_mode: RevocationMode,
    pub verification_flags: VerificationFlags,
    pub revocation_checker: Option<Arc<dyn RevocationChecker>>,
}

impl ChainPolicy {
    /// Build the chain of the leaf certificate from the extra certificates and the trust anchors, and validate it at the given time
    #[instrument(skip_all, fields(leaf = %leaf.thumbprint()))]
    pub fn build(
        &self,
        leaf: &Certificate,
        extra: &[Certificate],
        time: OffsetDateTime,
    ) -> Result<ChainBuild> {
        let mut elements = vec![leaf.clone()];
        let mut statuses = Vec::new();
        let mut anchored = self.trusted_roots.contains(leaf);
        let mut ends_in_root = anchored && is_self_issued(&leaf.parse()?);

        while !anchored {
            let Some(current) = elements.last().cloned() else {
                break;
            };
            let parsed = current.parse()?;

            if is_self_issued(&parsed) {
                ends_in_root = true;
                if parsed.verify_signature(None).is_err() {
                    statuses.push(ChainStatus::new(
                        ChainStatusKind::NotSignatureValid,
                        format!("Self-signature of '{}' is invalid", parsed.subject()),
                    ));
                }
                break;
            }

            if elements.len() >= MAX_CHAIN_LENGTH {
                statuses.push(ChainStatus::new(
                    ChainStatusKind::PartialChain,
                    "Chain exceeds the maximum length",
                ));
                break;
            }

            let mut name_matched = false;
            let mut issuer = None;
            for candidate in self.trusted_roots.iter().chain(extra) {
                if elements.contains(candidate) {
                    continue;
                }

                let parsed_candidate = candidate.parse()?;
                if parsed.issuer().as_raw() != parsed_candidate.subject().as_raw() {
                    continue;
                }

                name_matched = true;
                if is_issued_by(&parsed, &parsed_candidate) {
                    issuer = Some(candidate.clone());
                    break;
                }
            }

            match issuer {
                Some(issuer) => {
                    anchored = self.trusted_roots.contains(&issuer);
                    ends_in_root = anchored && is_self_issued(&issuer.parse()?);
                    elements.push(issuer);
                }
                None if name_matched => {
                    statuses.push(ChainStatus::new(
                        ChainStatusKind::NotSignatureValid,
                        format!("Signature of '{}' doesn't verify with its issuer", parsed.subject()),
                    ));
                    break;
                }
                None => {
                    // A chain ending in an unknown issuer is only a problem when unknown authorities aren't accepted
                    if !self.verification_flags.allow_unknown_certificate_authority {
                        statuses.push(ChainStatus::new(
                            ChainStatusKind::PartialChain,
                            format!("Issuer '{}' couldn't be found", parsed.issuer()),
                        ));
                    }
                    break;
                }
            }
        }

        if !anchored && !self.verification_flags.allow_unknown_certificate_authority {
            statuses.push(ChainStatus::new(
                ChainStatusKind::UntrustedRoot,
                "Chain doesn't terminate in a trusted root",
            ));
        }

        self.check_elements(&elements, anchored, time, &mut statuses)?;

        let build = ChainBuild {
            elements,
            statuses: ChainStatusList(statuses),
            ends_in_root,
        };

        if !build.is_valid() {
            debug!(statuses = %build.statuses, "chain has problems");
        }

        Ok(build)
    }

    fn check_elements(
        &self,
        elements: &[Certificate],
        anchored: bool,
        time: OffsetDateTime,
        statuses: &mut Vec<ChainStatus>,
    ) -> Result<()> {
        let flags = self.verification_flags;

        for (idx, element) in elements.iter().enumerate() {
            let parsed = element.parse()?;
            let validity = parsed.validity();

            if !flags.ignore_not_time_valid
                && (time < validity.not_before.to_datetime() || time > validity.not_after.to_datetime())
            {
                statuses.push(ChainStatus::new(
                    ChainStatusKind::NotTimeValid,
                    format!("'{}' isn't valid at {time}", parsed.subject()),
                ));
            }

            if idx > 0 && !flags.ignore_invalid_basic_constraints {
                let is_ca = matches!(parsed.basic_constraints(), Ok(Some(constraints)) if constraints.value.ca);
                if !is_ca {
                    statuses.push(ChainStatus::new(
                        ChainStatusKind::InvalidBasicConstraints,
                        format!("'{}' isn't a certificate authority", parsed.subject()),
                    ));
                }
            }

            let is_anchor = anchored && idx == elements.len() - 1;
            if self.revocation_mode == RevocationMode::NoCheck || is_anchor || is_self_issued(&parsed) {
                continue;
            }

            let status = self.revocation_checker.as_ref().map_or(
                RevocationStatus::Unknown,
                |checker| checker.check(element, elements.get(idx + 1), self.revocation_mode),
            );

            match status {
                RevocationStatus::Good => {}
                RevocationStatus::Revoked => statuses.push(ChainStatus::new(
                    ChainStatusKind::Revoked,
                    format!("'{}' is revoked", parsed.subject()),
                )),
                RevocationStatus::Unknown if !flags.ignore_revocation_unknown => {
                    statuses.push(ChainStatus::new(
                        ChainStatusKind::RevocationStatusUnknown,
                        format!("Revocation status of '{}' is unknown", parsed.subject()),
                    ));
                }
                RevocationStatus::Unknown => {}
            }
        }

        Ok(())
    }
}

impl fmt::Debug for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainPolicy")
            .field("trusted_roots", &self.trusted_roots)
            .field("revocation_mode", &self.revocation_mode)
            .field("verification_flags", &self.verification_flags)
            .field("revocation_checker", &self.revocation_checker.is_some())
            .finish()
    }
}
