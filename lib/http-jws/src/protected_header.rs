//!
//! The signed metadata of a detached signature
//!

use crate::{certificate::Certificate, Error, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identification mechanism announced in `sigD.mId`
pub const IDENTIFICATION_MECHANISM: &str = "http://uri.etsi.org/19182/HttpHeaders";

/// Protected fields a receiver has to understand
pub const CRITICAL_HEADER_NAMES: [&str; 3] = ["sigT", "sigD", "b64"];

fn default_critical_header_names() -> Vec<String> {
    CRITICAL_HEADER_NAMES.map(ToOwned::to_owned).to_vec()
}

fn default_identification_mechanism() -> String {
    IDENTIFICATION_MECHANISM.to_owned()
}

/// Description of the data covered by the signature (`sigD`)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DataToBeSigned {
    #[serde(rename = "pars")]
    parameters: Vec<String>,

    #[serde(rename = "mId", default = "default_identification_mechanism")]
    identification_mechanism: String,
}

impl DataToBeSigned {
    /// Add a header name to the covered parameters
    ///
    /// The name is stored lower-cased. Empty names and names already present (ignoring case) are skipped
    pub fn add_parameter(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }

        if self
            .parameters
            .iter()
            .any(|parameter| parameter.eq_ignore_ascii_case(name))
        {
            return;
        }

        self.parameters.push(name.to_ascii_lowercase());
    }

    /// Covered header names in signing order
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    #[must_use]
    pub fn identification_mechanism(&self) -> &str {
        &self.identification_mechanism
    }
}

impl Default for DataToBeSigned {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            identification_mechanism: default_identification_mechanism(),
        }
    }
}

/// Protected header of a detached JWS
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProtectedHeader {
    #[serde(rename = "b64", default)]
    encode_to_be_signed_data: bool,

    #[serde(rename = "x5c", default)]
    encoded_certificates: Vec<String>,

    #[serde(rename = "crit", default = "default_critical_header_names")]
    critical_header_names: Vec<String>,

    #[serde(rename = "sigT", with = "time::serde::rfc3339")]
    signature_time: OffsetDateTime,

    #[serde(rename = "sigD")]
    data_to_be_signed: DataToBeSigned,

    #[serde(rename = "alg")]
    algorithm_name: String,
}

impl ProtectedHeader {
    /// Create an empty protected header for the algorithm, signed at the given time
    #[must_use]
    pub fn new(algorithm_name: impl Into<String>, signature_time: OffsetDateTime) -> Self {
        Self {
            encode_to_be_signed_data: false,
            encoded_certificates: Vec::new(),
            critical_header_names: default_critical_header_names(),
            signature_time,
            data_to_be_signed: DataToBeSigned::default(),
            algorithm_name: algorithm_name.into(),
        }
    }

    /// Whether the payload is embedded. Always `false` for headers created by this crate
    #[must_use]
    pub fn encode_to_be_signed_data(&self) -> bool {
        self.encode_to_be_signed_data
    }

    #[must_use]
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    #[must_use]
    pub fn signature_time(&self) -> OffsetDateTime {
        self.signature_time
    }

    #[must_use]
    pub fn critical_header_names(&self) -> &[String] {
        &self.critical_header_names
    }

    #[must_use]
    pub fn data_to_be_signed(&self) -> &DataToBeSigned {
        &self.data_to_be_signed
    }

    /// Covered header names in signing order
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        self.data_to_be_signed.parameters()
    }

    /// See [`DataToBeSigned::add_parameter`]
    pub fn add_parameter(&mut self, name: &str) {
        self.data_to_be_signed.add_parameter(name);
    }

    /// Replace the `x5c` list with the leaf certificate followed by its chain (root excluded)
    pub fn set_certificates<'a, I>(&mut self, leaf: &Certificate, chain: I)
    where
        I: IntoIterator<Item = &'a Certificate>,
    {
        self.encoded_certificates.clear();
        self.encoded_certificates.push(leaf.to_base64());
        self.encoded_certificates
            .extend(chain.into_iter().map(Certificate::to_base64));
    }

    /// Raw `x5c` entries
    #[must_use]
    pub fn encoded_certificates(&self) -> &[String] {
        &self.encoded_certificates
    }

    /// Decode every certificate of the `x5c` list, leaf first
    pub fn certificates(&self) -> Result<Vec<Certificate>> {
        self.encoded_certificates
            .iter()
            .map(|encoded| Certificate::from_base64(encoded))
            .collect()
    }

    /// Serialise into JSON and encode as Base64url without padding
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(base64_simd::URL_SAFE_NO_PAD.encode_to_string(json))
    }

    /// Decode from the Base64url encoded JSON form
    ///
    /// Rejects headers without certificates or without covered parameters
    pub fn decode(encoded: &str) -> Result<Self> {
        let json = base64_simd::URL_SAFE_NO_PAD.decode_to_vec(encoded.trim_end_matches('='))?;
        let header: Self = serde_json::from_slice(&json)?;

        if header.encoded_certificates.is_empty() {
            return Err(Error::NoCertificatesPresent);
        }

        if header.parameters().is_empty() {
            return Err(Error::MalformedSignatureHeader);
        }

        Ok(header)
    }
}
