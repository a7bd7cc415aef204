//! Proxy configuration
//!
//! Parses the colon-delimited proxy strings accepted on the command line
//! (`IP:PORT` or `IP:PORT:USER:PASS`) into a browser-ready config.

use thiserror::Error;

/// Malformed proxy string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid proxy string format: {0}")]
pub struct ProxyFormatError(pub String);

/// Parsed proxy configuration for a browser session
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Proxy server URL, e.g. `http://1.2.3.4:8080`
    pub server: String,
    /// Username for authenticated proxies
    pub username: Option<String>,
    /// Password for authenticated proxies
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Parse a proxy string in `IP:PORT` or `IP:PORT:USER:PASS` format.
    ///
    /// Any other number of colon-delimited fields is rejected.
    pub fn parse(proxy: &str) -> Result<Self, ProxyFormatError> {
        let parts: Vec<&str> = proxy.split(':').collect();
        match parts.as_slice() {
            [host, port] => Ok(Self {
                server: format!("http://{}:{}", host, port),
                username: None,
                password: None,
            }),
            [host, port, user, pass] => Ok(Self {
                server: format!("http://{}:{}", host, port),
                username: Some((*user).to_string()),
                password: Some((*pass).to_string()),
            }),
            _ => Err(ProxyFormatError(format!(
                "expected 2 or 4 colon-delimited fields, got {}",
                parts.len()
            ))),
        }
    }

    /// Whether the proxy carries authentication credentials
    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }
}

impl std::str::FromStr for ProxyConfig {
    type Err = ProxyFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
