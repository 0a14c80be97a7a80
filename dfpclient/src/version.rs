//! API servers and versions

use crate::error::{DfpError, Result};
use std::fmt;
use std::str::FromStr;

/// Hosts the API is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Server {
    Production,
    Sandbox,
}

impl Server {
    pub fn base_url(self) -> &'static str {
        match self {
            Server::Production => "https://www.google.com",
            Server::Sandbox => "https://sandbox.google.com",
        }
    }

    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim_end_matches('/');
        [Server::Production, Server::Sandbox]
            .into_iter()
            .find(|s| s.base_url() == url)
    }
}

/// Published API versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApiVersion {
    V201004,
    V201010,
    V201101,
    V201103,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 4] = [
        ApiVersion::V201004,
        ApiVersion::V201010,
        ApiVersion::V201101,
        ApiVersion::V201103,
    ];

    /// Most recent version.
    pub const LATEST: ApiVersion = ApiVersion::V201103;

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V201004 => "v201004",
            ApiVersion::V201010 => "v201010",
            ApiVersion::V201101 => "v201101",
            ApiVersion::V201103 => "v201103",
        }
    }

    /// XML namespace of the version's messages.
    pub fn namespace(self) -> String {
        format!("https://www.google.com/apis/ads/publisher/{}", self.as_str())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = DfpError;

    fn from_str(s: &str) -> Result<Self> {
        ApiVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DfpError::Validation(format!("unknown API version {s:?}")))
    }
}

/// Server/version pairs that exist.
const DEPLOYED: &[(Server, ApiVersion)] = &[
    (Server::Production, ApiVersion::V201010),
    (Server::Production, ApiVersion::V201101),
    (Server::Production, ApiVersion::V201103),
    (Server::Sandbox, ApiVersion::V201004),
    (Server::Sandbox, ApiVersion::V201010),
    (Server::Sandbox, ApiVersion::V201101),
    (Server::Sandbox, ApiVersion::V201103),
];

/// Where and against which version requests are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationConfig {
    server: Server,
    version: ApiVersion,
    base_url: String,
}

impl OperationConfig {
    /// Fails when the version is not deployed on the server.
    pub fn new(server: Server, version: ApiVersion) -> Result<Self> {
        if !DEPLOYED.contains(&(server, version)) {
            return Err(DfpError::Validation(format!(
                "version {version} is not available on {}",
                server.base_url()
            )));
        }
        Ok(Self {
            server,
            version,
            base_url: server.base_url().to_string(),
        })
    }

    /// Same as [`OperationConfig::new`] from their textual forms.
    pub fn parse(server_url: &str, version: &str) -> Result<Self> {
        let server = Server::from_url(server_url)
            .ok_or_else(|| DfpError::Validation(format!("unknown server {server_url:?}")))?;
        Self::new(server, version.parse()?)
    }

    /// Sends requests to another host, keeping the version checks.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn server(&self) -> Server {
        self.server
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn namespace(&self) -> String {
        self.version.namespace()
    }

    /// URL of a service, e.g. `https://www.google.com/apis/ads/publisher/v201103/InventoryService`.
    pub fn endpoint(&self, service: &str) -> String {
        format!("{}/apis/ads/publisher/{}/{}", self.base_url, self.version, service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_pairs_only() {
        assert!(OperationConfig::new(Server::Sandbox, ApiVersion::V201004).is_ok());
        assert!(matches!(
            OperationConfig::new(Server::Production, ApiVersion::V201004),
            Err(DfpError::Validation(_))
        ));
    }

    #[test]
    fn parse_and_endpoint() {
        let config = OperationConfig::parse("https://www.google.com/", "v201010").unwrap();
        assert_eq!(config.server(), Server::Production);
        assert_eq!(
            config.endpoint("InventoryService"),
            "https://www.google.com/apis/ads/publisher/v201010/InventoryService"
        );
        assert_eq!(
            config.namespace(),
            "https://www.google.com/apis/ads/publisher/v201010"
        );
        assert!(OperationConfig::parse("https://example.com", "v201010").is_err());
        assert!(OperationConfig::parse("https://www.google.com", "v2099").is_err());
    }

    #[test]
    fn base_url_override() {
        let config = OperationConfig::new(Server::Sandbox, ApiVersion::V201103)
            .unwrap()
            .with_base_url("http://127.0.0.1:1234/");
        assert_eq!(
            config.endpoint("UserService"),
            "http://127.0.0.1:1234/apis/ads/publisher/v201103/UserService"
        );
    }
}
