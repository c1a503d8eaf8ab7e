/// HTTP methods understood by the telemetry backend.
///
/// Requests using any other method (HEAD, TRACE, CONNECT, extension methods)
/// are left uninstrumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    /// Map an `http::Method` onto the reportable set, `None` when unmapped.
    #[must_use]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(HttpMethod::Get),
            http::Method::POST => Some(HttpMethod::Post),
            http::Method::PUT => Some(HttpMethod::Put),
            http::Method::PATCH => Some(HttpMethod::Patch),
            http::Method::DELETE => Some(HttpMethod::Delete),
            http::Method::OPTIONS => Some(HttpMethod::Options),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
