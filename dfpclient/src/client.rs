//! DFP API client: authentication, transport and fault dispatch
//!
//! A [`DfpClient`] owns the caller's headers and operation config. Each
//! call holds the client's state lock from token check to response, so a
//! client can be shared between threads while calls on it run one at a
//! time.

use crate::auth::{AUTH_SERVICE, ClientLogin};
use crate::error::{DfpError, Result};
use crate::headers::{AuthMode, Headers, RequestToken};
use crate::http::build_agent;
use crate::schema::{COLLECTION_FIELDS, field_order_table};
use crate::services::DfpService;
use crate::token::{AuthToken, CredentialKey, TokenCache};
use crate::version::{ApiVersion, OperationConfig, Server};
use chrono::{DateTime, Utc};
use dfpconfig::Config;
use dfpsoap::{
    Element, FieldOrderTable, SoapError, WireValue, build_soap_request, element_to_string,
    operation_response, parse_soap_envelope, parse_soap_fault, restore_collection_type,
    unmarshal_with,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use ureq::Agent;

/// Target of the raw SOAP traffic log.
pub const SOAP_LOG_TARGET: &str = "dfpclient::soap";

/// Largest response body read, above ureq's 10 MiB default.
pub const MAX_RESPONSE_BYTES: u64 = 256 * 1024 * 1024;

/// State guarded for the duration of a call
#[derive(Debug, Default)]
struct ClientState {
    last_login_error: Option<String>,
    last_request: Option<String>,
    last_response: Option<String>,
}

/// Client of the DFP SOAP API
pub struct DfpClient {
    headers: Headers,
    operation: OperationConfig,
    config: Config,
    agent: Agent,
    login: ClientLogin,
    token_cache: Arc<TokenCache>,
    table: &'static FieldOrderTable,
    state: Mutex<ClientState>,
}

/// Builder of [`DfpClient`]
pub struct DfpClientBuilder {
    headers: Headers,
    config: Config,
    config_dir: Option<String>,
    server: Server,
    version: ApiVersion,
    base_url: Option<String>,
    login_endpoint: Option<String>,
    token_cache: Option<Arc<TokenCache>>,
    initial_token: Option<AuthToken>,
    header_cache: bool,
    eager_login: bool,
}

impl DfpClientBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from `directory` while building, replacing
    /// any [`config`](Self::config) given before.
    pub fn config_dir(mut self, directory: impl Into<String>) -> Self {
        self.config_dir = Some(directory.into());
        self
    }

    pub fn server(mut self, server: Server) -> Self {
        self.server = server;
        self
    }

    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    /// Sends API calls to another host (proxies, test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Uses another ClientLogin endpoint.
    pub fn login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint = Some(endpoint.into());
        self
    }

    /// Uses a private token cache instead of the process-wide one.
    pub fn token_cache(mut self, cache: Arc<TokenCache>) -> Self {
        self.token_cache = Some(cache);
        self
    }

    /// Starts from a known ClientLogin token.
    pub fn auth_token(mut self, token: AuthToken) -> Self {
        self.initial_token = Some(token);
        self
    }

    /// Reads and writes the header cache under `config.home`.
    pub fn header_cache(mut self, enabled: bool) -> Self {
        self.header_cache = enabled;
        self
    }

    /// Logs in while building (the default); failures are only logged.
    pub fn eager_login(mut self, enabled: bool) -> Self {
        self.eager_login = enabled;
        self
    }

    pub fn build(self) -> Result<DfpClient> {
        let config = match self.config_dir {
            Some(directory) => Config::load(&directory)?,
            None => self.config,
        };
        let mut headers = self.headers;

        if self.header_cache {
            if let Some(cached) = config.load_cached_headers() {
                headers.fill_from_cache(&cached);
            }
        }
        headers.validate()?;

        if config.compress && !cfg!(feature = "compress") {
            return Err(DfpError::MissingPackage(
                "compressed transfers need dfpclient's `compress` feature".into(),
            ));
        }

        let mut operation = OperationConfig::new(self.server, self.version)?;
        if let Some(url) = self.base_url {
            operation = operation.with_base_url(url);
        }

        let timeout = Duration::from_secs(config.http_timeout);
        let agent = build_agent(config.proxy.as_deref(), timeout)?;
        let mut login = ClientLogin::new(config.proxy.as_deref(), timeout)?;
        if let Some(endpoint) = self.login_endpoint {
            login = login.with_endpoint(endpoint);
        }

        if headers.decorate_application_name() && self.header_cache {
            if let Err(err) = config.save_cached_headers(&headers.to_cached()) {
                warn!("Cannot save header cache: {}", err);
            }
        }

        let client = DfpClient {
            table: field_order_table(operation.version()),
            headers,
            operation,
            config,
            agent,
            login,
            token_cache: self.token_cache.unwrap_or_else(TokenCache::global),
            state: Mutex::new(ClientState::default()),
        };

        if let (Some(token), Some(key)) = (self.initial_token, client.credential_key()) {
            client.token_cache.store(key, token);
        }

        info!(
            server = client.operation.base_url(),
            version = %client.operation.version(),
            "DFP client ready"
        );

        if self.eager_login {
            client.login_if_needed();
        }
        Ok(client)
    }
}

impl DfpClient {
    /// Starts building a client; defaults to the sandbox server, the latest
    /// version and the default configuration.
    pub fn builder(headers: Headers) -> DfpClientBuilder {
        DfpClientBuilder {
            headers,
            config: Config::default(),
            config_dir: None,
            server: Server::Sandbox,
            version: ApiVersion::LATEST,
            base_url: None,
            login_endpoint: None,
            token_cache: None,
            initial_token: None,
            header_cache: false,
            eager_login: true,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn operation_config(&self) -> &OperationConfig {
        &self.operation
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn version(&self) -> ApiVersion {
        self.operation.version()
    }

    /// Facade of one service of the client's version.
    pub fn service(&self, name: &str) -> Result<DfpService<'_>> {
        DfpService::new(self, name)
    }

    /// Raw XML of the last request sent.
    pub fn last_request(&self) -> Option<String> {
        self.state.lock().last_request.clone()
    }

    /// Raw XML of the last response received.
    pub fn last_response(&self) -> Option<String> {
        self.state.lock().last_response.clone()
    }

    /// Message of the last failed login, cleared by the next success.
    pub fn last_login_error(&self) -> Option<String> {
        self.state.lock().last_login_error.clone()
    }

    /// Token currently in use, if any.
    pub fn auth_token(&self) -> Option<AuthToken> {
        match self.headers.validate().ok()? {
            AuthMode::ClientLogin { .. } => self.token_cache.get(&self.credential_key()?),
            AuthMode::AuthToken(token) => Some(AuthToken::new(token)),
            AuthMode::OAuthToken(_) => None,
        }
    }

    fn credential_key(&self) -> Option<CredentialKey> {
        match self.headers.validate().ok()? {
            AuthMode::ClientLogin { email, .. } => Some(CredentialKey::new(email, AUTH_SERVICE)),
            _ => None,
        }
    }

    fn login_if_needed(&self) {
        let mut state = self.state.lock();
        if let Err(err) = self.request_token(&mut state, Utc::now()) {
            warn!("Initial login failed, retrying on first call: {}", err);
        }
    }

    /// Token for the next request, logging in when it is missing or expired.
    fn request_token(&self, state: &mut ClientState, now: DateTime<Utc>) -> Result<RequestToken> {
        let (email, password) = match self.headers.validate()? {
            AuthMode::AuthToken(token) => return Ok(RequestToken::Auth(token.to_string())),
            AuthMode::OAuthToken(token) => return Ok(RequestToken::OAuth(token.to_string())),
            AuthMode::ClientLogin { email, password } => (email, password),
        };

        let key = CredentialKey::new(email, AUTH_SERVICE);
        if let Some(token) = self.token_cache.get_valid(&key, now) {
            return Ok(RequestToken::Auth(token.token));
        }

        debug!(email, "Auth token missing or expired, logging in");
        let source = self.headers.application_name.as_deref().unwrap_or_default();
        match self.login.login(email, password, AUTH_SERVICE, source) {
            Ok(tokens) => {
                let token = AuthToken::issued_at(tokens.auth, now);
                self.token_cache.store(key, token.clone());
                state.last_login_error = None;
                Ok(RequestToken::Auth(token.token))
            }
            Err(err) => {
                self.token_cache.invalidate(&key);
                state.last_login_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Calls `method` of `service` with its parameters in schema order.
    ///
    /// Returns the unmarshalled `rval` as a one-element tuple, `Nil` when
    /// the operation returns nothing.
    pub fn call_method(
        &self,
        service: &str,
        method: &str,
        params: &[(String, WireValue)],
    ) -> Result<(WireValue,)> {
        let mut state = self.state.lock();

        let token = self.request_token(&mut state, Utc::now())?;
        let header = self.headers.request_header(&token);
        let xml = build_soap_request(
            &self.operation.namespace(),
            Some(&header),
            method,
            params,
            self.table,
        )?;

        let (status, body) = self.send(&mut state, service, method, xml)?;
        self.read_response(status, &body, Some(method))
    }

    /// Sends a complete envelope as is and reads the response like
    /// [`DfpClient::call_method`].
    pub fn call_raw_method(&self, service: &str, envelope: &str) -> Result<(WireValue,)> {
        let mut state = self.state.lock();
        let (status, body) = self.send(&mut state, service, "raw", envelope.to_string())?;
        self.read_response(status, &body, None)
    }

    fn send(
        &self,
        state: &mut ClientState,
        service: &str,
        method: &str,
        xml: String,
    ) -> Result<(u16, String)> {
        let url = self.operation.endpoint(service);

        self.log_xml("request", &xml);
        state.last_request = Some(xml.clone());
        state.last_response = None;

        let started = Instant::now();
        let result = self
            .agent
            .post(&url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .send(xml);

        let mut response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(service, method, url = %url, "Request failed: {}", err);
                return Err(err.into());
            }
        };

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()?;

        self.log_xml("response", &body);
        state.last_response = Some(body.clone());

        if self.config.request_log {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(service, method, status, elapsed_ms, "DFP request");
        }

        Ok((status, body))
    }

    fn read_response(&self, status: u16, body: &str, method: Option<&str>) -> Result<(WireValue,)> {
        let success = (200..300).contains(&status);

        let envelope = match parse_soap_envelope(body.as_bytes()) {
            Ok(envelope) => envelope,
            Err(_) if !success => {
                return Err(DfpError::Http {
                    status,
                    body: body.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(fault) = parse_soap_fault(&envelope) {
            let err = DfpError::from_fault(fault, status);
            warn!(status, "API call failed: {}", err);
            return Err(err);
        }

        if !success {
            return Err(DfpError::Http {
                status,
                body: body.to_string(),
            });
        }

        let response = match method {
            Some(method) => operation_response(&envelope, method)?,
            None => envelope
                .body_element()
                .ok_or_else(|| SoapError::MissingResponse("response".into()))?,
        };

        let mut rval = match unmarshal_with(response, self.table) {
            WireValue::Struct(mut fields) => fields.remove("rval").unwrap_or(WireValue::Nil),
            _ => WireValue::Nil,
        };
        restore_collection_type(&mut rval, COLLECTION_FIELDS);
        Ok((rval,))
    }

    fn log_xml(&self, direction: &str, xml: &str) {
        if !self.config.xml_log {
            return;
        }
        let text = if self.config.pretty_xml {
            pretty_xml(xml).unwrap_or_else(|| xml.to_string())
        } else {
            xml.to_string()
        };
        debug!(target: SOAP_LOG_TARGET, direction, "{}", text);
    }
}

fn pretty_xml(xml: &str) -> Option<String> {
    let root = Element::parse(xml.as_bytes()).ok()?;
    element_to_string(&root, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_printing() {
        let pretty = pretty_xml("<a><b>1</b></a>").unwrap();
        assert!(pretty.contains("\n  <b>1</b>"));
        assert!(pretty_xml("<a>").is_none());
    }

    #[test]
    fn validation_happens_at_build() {
        let headers = Headers {
            application_name: Some("app".into()),
            ..Headers::default()
        };
        assert!(matches!(
            DfpClient::builder(headers).eager_login(false).build(),
            Err(DfpError::Validation(_))
        ));

        let err = DfpClient::builder(Headers::auth_token("t", "app"))
            .server(Server::Production)
            .version(ApiVersion::V201004)
            .build();
        assert!(matches!(err, Err(DfpError::Validation(_))));
    }

    #[cfg(not(feature = "compress"))]
    #[test]
    fn compress_needs_the_feature() {
        let config = Config {
            compress: true,
            ..Config::default()
        };
        assert!(matches!(
            DfpClient::builder(Headers::auth_token("t", "app"))
                .config(config)
                .build(),
            Err(DfpError::MissingPackage(_))
        ));
    }

    #[test]
    fn application_name_is_decorated() {
        let client = DfpClient::builder(Headers::oauth_token("o", "my app"))
            .build()
            .unwrap();
        let name = client.headers().application_name.as_deref().unwrap();
        assert!(name.starts_with("my app ("));
        assert_eq!(client.auth_token(), None);
    }

    #[test]
    fn config_is_read_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "http_timeout: 30\n").unwrap();

        let client = DfpClient::builder(Headers::auth_token("t", "app"))
            .config_dir(path)
            .build()
            .unwrap();
        assert_eq!(client.config().http_timeout, 30);

        std::fs::write(dir.path().join("config.yaml"), "xml_log: maybe\n").unwrap();
        assert!(matches!(
            DfpClient::builder(Headers::auth_token("t", "app"))
                .config_dir(path)
                .build(),
            Err(DfpError::Config(_))
        ));
    }

    #[test]
    fn header_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            home: dir.path().to_path_buf(),
            ..Config::default()
        };

        DfpClient::builder(Headers::auth_token("t", "cached app").with_network_code("99"))
            .config(config.clone())
            .header_cache(true)
            .build()
            .unwrap();
        let cached = config.load_cached_headers().unwrap();
        assert_eq!(cached.network_code.as_deref(), Some("99"));

        let client = DfpClient::builder(Headers::auth_token("t", ""))
            .config(config)
            .header_cache(true)
            .build()
            .unwrap();
        assert_eq!(client.headers().network_code.as_deref(), Some("99"));
        assert!(
            client
                .headers()
                .application_name
                .as_deref()
                .unwrap()
                .starts_with("cached app")
        );
    }
}
