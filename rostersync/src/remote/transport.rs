//! HTTP transport used by the membership database client

use std::path::PathBuf;

use crate::error::{RemoteError, RemoteErrorKind};

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A single HTTP request, without body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }
}

/// Response to an [`HttpRequest`]; redirects are reported, not followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `Location` header, if any
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    /// A `302 Found` pointing at `location`
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            location: Some(location.into()),
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Executes requests against a server
pub trait HttpTransport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, RemoteError>;
}

/// How the server certificate is verified
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CertPolicy {
    /// Certificates installed on the system
    #[default]
    System,
    /// An additional PEM root certificate
    File(PathBuf),
    /// No verification at all
    Disabled,
}

#[cfg(feature = "http")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "http")]
mod reqwest_transport {
    use super::*;
    use log::warn;
    use reqwest::blocking::Client;
    use reqwest::header::LOCATION;
    use reqwest::redirect::Policy;
    use std::time::Duration;

    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Blocking transport built on reqwest
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(cert: &CertPolicy) -> Result<Self, RemoteError> {
            Self::with_timeout(cert, DEFAULT_TIMEOUT)
        }

        pub fn with_timeout(cert: &CertPolicy, timeout: Duration) -> Result<Self, RemoteError> {
            let mut builder = Client::builder()
                .redirect(Policy::none())
                .timeout(timeout);

            match cert {
                CertPolicy::System => {}
                CertPolicy::File(path) => {
                    let pem = std::fs::read(path).map_err(|e| {
                        RemoteError::new(
                            RemoteErrorKind::CertificateMissing,
                            format!("{}: {}", path.display(), e),
                        )
                    })?;
                    let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                        RemoteError::new(
                            RemoteErrorKind::Transport,
                            format!("invalid certificate {}: {}", path.display(), e),
                        )
                    })?;
                    builder = builder.add_root_certificate(certificate);
                }
                CertPolicy::Disabled => {
                    warn!("Certificate verification is disabled");
                    builder = builder.danger_accept_invalid_certs(true);
                }
            }

            let client = builder
                .build()
                .map_err(|e| RemoteError::new(RemoteErrorKind::Transport, e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpTransport for ReqwestTransport {
        fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, RemoteError> {
            let builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
                Method::Delete => self.client.delete(&request.url),
            };
            let response = builder.send().map_err(transport_error)?;

            let status = response.status().as_u16();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().map_err(transport_error)?.to_vec();

            Ok(HttpResponse {
                status,
                location,
                body,
            })
        }
    }

    fn transport_error(err: reqwest::Error) -> RemoteError {
        // Strip the URL, it carries credentials in its query
        RemoteError::new(RemoteErrorKind::Transport, err.without_url().to_string())
    }

}
