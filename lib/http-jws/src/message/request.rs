use super::{HttpMessage, MessageKind, Necessity, REQUEST_TARGET};
use crate::DIGEST_HEADER;
use http::{uri::PathAndQuery, HeaderMap, Method, Request, Uri};

/// Outgoing or incoming HTTP request
#[derive(Clone, Debug)]
pub struct HttpRequestData {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpRequestData {
    /// Request without headers and with an empty body
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Copy the parts relevant for signing out of an [`http::Request`]
    pub fn from_request<B>(request: &Request<B>) -> Self
    where
        B: AsRef<[u8]>,
    {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            body: request.body().as_ref().to_vec(),
        }
    }
}

impl<B> From<&Request<B>> for HttpRequestData
where
    B: AsRef<[u8]>,
{
    fn from(value: &Request<B>) -> Self {
        Self::from_request(value)
    }
}

impl HttpMessage for HttpRequestData {
    const NECESSARY_HEADERS: &'static [(&'static str, Necessity)] = &[
        (REQUEST_TARGET, Necessity::Mandatory),
        ("host", Necessity::Mandatory),
        ("x-request-id", Necessity::Mandatory),
        ("content-type", Necessity::IfPresent),
        ("content-length", Necessity::IfPresent),
        (DIGEST_HEADER, Necessity::Mandatory),
    ];
    const PSEUDO_HEADER: &'static str = REQUEST_TARGET;
    const KIND: MessageKind = MessageKind::Request;

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn pseudo_header_value(&self) -> String {
        let path_and_query = self
            .uri
            .path_and_query()
            .map_or_else(|| self.uri.path(), PathAndQuery::as_str);

        format!(
            "{} {path_and_query}",
            self.method.as_str().to_ascii_lowercase()
        )
    }
}
