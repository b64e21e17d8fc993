use super::{HttpMessage, MessageKind, Necessity, RESPONSE_STATUS};
use crate::DIGEST_HEADER;
use http::{HeaderMap, Response, StatusCode};

/// Outgoing or incoming HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponseData {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponseData {
    /// Response without headers and with an empty body
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Copy the parts relevant for signing out of an [`http::Response`]
    pub fn from_response<B>(response: &Response<B>) -> Self
    where
        B: AsRef<[u8]>,
    {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.body().as_ref().to_vec(),
        }
    }
}

impl<B> From<&Response<B>> for HttpResponseData
where
    B: AsRef<[u8]>,
{
    fn from(value: &Response<B>) -> Self {
        Self::from_response(value)
    }
}

impl HttpMessage for HttpResponseData {
    const NECESSARY_HEADERS: &'static [(&'static str, Necessity)] = &[
        (RESPONSE_STATUS, Necessity::Mandatory),
        ("x-request-id", Necessity::Mandatory),
        ("content-type", Necessity::IfPresent),
        ("content-length", Necessity::IfPresent),
        (DIGEST_HEADER, Necessity::Mandatory),
    ];
    const PSEUDO_HEADER: &'static str = RESPONSE_STATUS;
    const KIND: MessageKind = MessageKind::Response;

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn pseudo_header_value(&self) -> String {
        self.status.as_u16().to_string()
    }
}
