//! ClientLogin authentication
//!
//! The ClientLogin endpoint exchanges an email and password for an `Auth`
//! token through a form POST. The response body is a list of `KEY=VALUE`
//! lines; failures carry `Error=` (and `CaptchaToken=`/`CaptchaUrl=` when a
//! captcha is required).

use crate::error::{DfpError, Result};
use crate::http::build_agent;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use ureq::Agent;

/// Production ClientLogin endpoint
pub const CLIENT_LOGIN_URL: &str = "https://www.google.com/accounts/ClientLogin";

/// Service name of the DFP API
pub const AUTH_SERVICE: &str = "gam";

/// Account type sent with every login
pub const ACCOUNT_TYPE: &str = "GOOGLE";

/// Tokens returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    pub auth: String,
    pub sid: Option<String>,
    pub lsid: Option<String>,
}

/// ClientLogin client
pub struct ClientLogin {
    endpoint: String,
    agent: Agent,
}

impl ClientLogin {
    pub fn new(proxy: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: CLIENT_LOGIN_URL.to_string(),
            agent: build_agent(proxy, timeout)?,
        })
    }

    /// Uses another login endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Logs in and returns the tokens.
    ///
    /// Every failure, transport included, is an [`DfpError::AuthToken`].
    pub fn login(&self, email: &str, password: &str, service: &str, source: &str) -> Result<LoginTokens> {
        debug!(email, service, endpoint = %self.endpoint, "ClientLogin request");

        let mut response = self
            .agent
            .post(&self.endpoint)
            .send_form([
                ("Email", email),
                ("Passwd", password),
                ("accountType", ACCOUNT_TYPE),
                ("service", service),
                ("source", source),
            ])
            .map_err(|err| DfpError::AuthToken(format!("login request failed: {err}")))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| DfpError::AuthToken(format!("cannot read login response: {err}")))?;

        match parse_login_response(&body) {
            Ok(tokens) => {
                info!(email, "ClientLogin succeeded");
                Ok(tokens)
            }
            Err(err) => {
                warn!(email, status, "ClientLogin failed: {}", err);
                Err(err)
            }
        }
    }
}

/// Logs in once and returns the `Auth` token.
pub fn get_auth_token(
    email: &str,
    password: &str,
    service: &str,
    source: &str,
    proxy: Option<&str>,
) -> Result<String> {
    let login = ClientLogin::new(proxy, Duration::from_secs(120))?;
    login.login(email, password, service, source).map(|t| t.auth)
}

/// Parses a ClientLogin response body.
pub fn parse_login_response(body: &str) -> Result<LoginTokens> {
    let fields: HashMap<&str, &str> = body
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .collect();

    if fields.contains_key("Error") || fields.contains_key("CaptchaToken") {
        let mut message = fields.get("Error").copied().unwrap_or("CaptchaRequired").to_string();
        if let Some(url) = fields.get("CaptchaUrl") {
            message.push_str(&format!(" (captcha: {url})"));
        }
        return Err(DfpError::AuthToken(message));
    }

    let auth = fields
        .get("Auth")
        .filter(|a| !a.is_empty())
        .ok_or_else(|| DfpError::AuthToken("no Auth token in login response".into()))?;

    Ok(LoginTokens {
        auth: auth.to_string(),
        sid: fields.get("SID").map(|s| s.to_string()),
        lsid: fields.get("LSID").map(|s| s.to_string()),
    })
}
