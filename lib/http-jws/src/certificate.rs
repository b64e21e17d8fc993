//!
//! X.509 certificates as they travel in the `x5c` field and as they are held by the signer
//!

use crate::{Error, Result};
use pkcs8::{PrivateKeyInfo, SecretDocument};
use sha2::{Digest, Sha256};
use std::fmt;
use x509_parser::{
    certificate::X509Certificate,
    objects::{oid2sn, oid_registry},
    pem::Pem,
};

/// Subject attribute names the organization identifier is looked up under, in dotted and symbolic forms
const ORGANIZATION_IDENTIFIER_NAMES: &[&str] = &["2.5.4.97", "organizationIdentifier", "OI"];

const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// SHA-256 fingerprint of the DER encoding of a certificate
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Thumbprint([u8; 32]);

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }

        Ok(())
    }
}

/// DER encoded X.509 certificate
///
/// The encoding is checked to be a well-formed certificate on construction
#[derive(Clone, Eq, PartialEq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Construct a certificate from its DER encoding
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self> {
        let der = der.into();
        x509_parser::parse_x509_certificate(&der)?;

        Ok(Self { der })
    }

    /// Construct a certificate from an `x5c` entry (standard Base64 of the DER encoding)
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Self::from_der(base64_simd::STANDARD.decode_to_vec(encoded)?)
    }

    /// Read the first certificate from a PEM document
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Self::all_from_pem(pem)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedCertificate("No certificate in PEM document".into()))
    }

    /// Read every certificate from a PEM document, skipping blocks with other labels
    pub fn all_from_pem(pem: &[u8]) -> Result<Vec<Self>> {
        let mut certificates = Vec::new();
        for block in Pem::iter_from_buffer(pem) {
            let block = block.map_err(|err| Error::MalformedCertificate(err.to_string()))?;
            if block.label == PEM_CERTIFICATE_LABEL {
                certificates.push(Self::from_der(block.contents)?);
            }
        }

        Ok(certificates)
    }

    /// DER encoding of the certificate
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Encode the certificate for the `x5c` field
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64_simd::STANDARD.encode_to_string(&self.der)
    }

    /// Parsed view of the certificate
    pub fn parse(&self) -> Result<X509Certificate<'_>> {
        let (_rest, certificate) = x509_parser::parse_x509_certificate(&self.der)?;
        Ok(certificate)
    }

    #[must_use]
    pub fn thumbprint(&self) -> Thumbprint {
        Thumbprint(Sha256::digest(&self.der).into())
    }

    /// Human-readable rendering of the subject name
    pub fn subject(&self) -> Result<String> {
        Ok(self.parse()?.subject().to_string())
    }

    /// Extract the organization identifier from the subject
    ///
    /// Returns the value of the first subject attribute whose type is one of the recognized organization identifier names
    pub fn organization_identifier(&self) -> Result<Option<String>> {
        let certificate = self.parse()?;

        for attribute in certificate.subject().iter_attributes() {
            let oid = attribute.attr_type();
            let dotted = oid.to_id_string();
            let short_name = oid2sn(oid, oid_registry()).ok();

            let is_organization_identifier = ORGANIZATION_IDENTIFIER_NAMES
                .iter()
                .any(|name| *name == dotted || Some(*name) == short_name);

            if is_organization_identifier {
                return Ok(attribute.as_str().ok().map(ToOwned::to_owned));
            }
        }

        Ok(None)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("thumbprint", &self.thumbprint().to_string())
            .finish_non_exhaustive()
    }
}

/// Certificate of the signing party, optionally accompanied by its PKCS#8 private key
#[derive(Clone, Debug)]
pub struct SigningCertificate {
    certificate: Certificate,
    private_key: Option<SecretDocument>,
}

impl SigningCertificate {
    #[must_use]
    pub fn new(certificate: Certificate, private_key: Option<SecretDocument>) -> Self {
        Self {
            certificate,
            private_key,
        }
    }

    /// Construct from a PEM certificate and an optional PKCS#8 PEM private key
    pub fn from_pem(certificate_pem: &[u8], private_key_pem: Option<&str>) -> Result<Self> {
        let certificate = Certificate::from_pem(certificate_pem)?;
        let private_key = private_key_pem
            .map(|pem| -> Result<SecretDocument> {
                let (_tag_line, document) = SecretDocument::from_pem(pem)?;
                // Make sure this is a PKCS#8 document and not a bare PKCS#1/SEC1 key
                let _: PrivateKeyInfo<'_> = document.decode_msg()?;
                Ok(document)
            })
            .transpose()?;

        Ok(Self::new(certificate, private_key))
    }

    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// PKCS#8 DER encoding of the private key, if present
    #[must_use]
    pub fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_ref().map(SecretDocument::as_bytes)
    }

    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }
}

impl From<Certificate> for SigningCertificate {
    fn from(value: Certificate) -> Self {
        Self::new(value, None)
    }
}
