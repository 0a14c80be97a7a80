//! Request headers and authentication mode

use crate::error::{DfpError, Result};
use dfpconfig::CachedHeaders;
use dfpsoap::{WireStruct, WireValue};
use std::collections::HashMap;

/// Signature appended to the application name of every request.
pub const LIB_SIG: &str = concat!("DfpApi-Rust/", env!("CARGO_PKG_VERSION"));

/// Headers supplied by the caller
///
/// Exactly one authentication method must be set: `email` with
/// `password`, `auth_token`, or `oauth_token`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    pub email: Option<String>,
    pub password: Option<String>,
    pub auth_token: Option<String>,
    pub oauth_token: Option<String>,
    pub application_name: Option<String>,
    pub network_code: Option<String>,
}

/// How requests are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode<'a> {
    /// Token obtained and renewed through ClientLogin
    ClientLogin { email: &'a str, password: &'a str },
    /// Fixed ClientLogin token
    AuthToken(&'a str),
    /// Fixed OAuth token
    OAuthToken(&'a str),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Headers {
    pub fn client_login(
        email: impl Into<String>,
        password: impl Into<String>,
        application_name: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            application_name: Some(application_name.into()),
            ..Self::default()
        }
    }

    pub fn auth_token(token: impl Into<String>, application_name: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            application_name: Some(application_name.into()),
            ..Self::default()
        }
    }

    pub fn oauth_token(token: impl Into<String>, application_name: impl Into<String>) -> Self {
        Self {
            oauth_token: Some(token.into()),
            application_name: Some(application_name.into()),
            ..Self::default()
        }
    }

    pub fn with_network_code(mut self, network_code: impl Into<String>) -> Self {
        self.network_code = Some(network_code.into());
        self
    }

    /// Builds headers from their wire names (`email`, `password`,
    /// `authToken`, `oAuthToken`, `applicationName`, `networkCode`).
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut headers = Headers::default();
        for (key, value) in map {
            let slot = match key.as_str() {
                "email" => &mut headers.email,
                "password" => &mut headers.password,
                "authToken" => &mut headers.auth_token,
                "oAuthToken" => &mut headers.oauth_token,
                "applicationName" => &mut headers.application_name,
                "networkCode" => &mut headers.network_code,
                other => {
                    return Err(DfpError::Validation(format!("unknown header {other:?}")));
                }
            };
            *slot = Some(value.clone());
        }
        Ok(headers)
    }

    /// Fills unset non-secret headers from the on-disk cache.
    pub fn fill_from_cache(&mut self, cached: &CachedHeaders) {
        if present(&self.application_name).is_none() {
            self.application_name = cached.application_name.clone();
        }
        if present(&self.network_code).is_none() {
            self.network_code = cached.network_code.clone();
        }
        if present(&self.email).is_none() && present(&self.password).is_some() {
            self.email = cached.email.clone();
        }
    }

    /// Checks the headers and returns the authentication mode.
    pub fn validate(&self) -> Result<AuthMode<'_>> {
        if present(&self.application_name).is_none() {
            return Err(DfpError::Validation("applicationName is required".into()));
        }

        let login = match (present(&self.email), present(&self.password)) {
            (Some(email), Some(password)) => Some(AuthMode::ClientLogin { email, password }),
            (None, None) => None,
            _ => {
                return Err(DfpError::Validation(
                    "email and password must be given together".into(),
                ));
            }
        };

        let modes: Vec<AuthMode<'_>> = [
            login,
            present(&self.auth_token).map(AuthMode::AuthToken),
            present(&self.oauth_token).map(AuthMode::OAuthToken),
        ]
        .into_iter()
        .flatten()
        .collect();

        match modes.as_slice() {
            [mode] => Ok(*mode),
            [] => Err(DfpError::Validation(
                "one of email/password, authToken or oAuthToken is required".into(),
            )),
            _ => Err(DfpError::Validation(
                "only one of email/password, authToken or oAuthToken may be set".into(),
            )),
        }
    }

    /// Appends the library signature to the application name.
    ///
    /// Returns true when the name changed.
    pub fn decorate_application_name(&mut self) -> bool {
        match &self.application_name {
            Some(name) if !name.contains(LIB_SIG) => {
                self.application_name = Some(format!("{name} ({LIB_SIG})"));
                true
            }
            _ => false,
        }
    }

    /// Non-secret part, as written to the header cache.
    pub fn to_cached(&self) -> CachedHeaders {
        CachedHeaders {
            email: self.email.clone(),
            application_name: self.application_name.clone(),
            network_code: self.network_code.clone(),
        }
    }

    /// `RequestHeader` sent with every call.
    ///
    /// Only the token, network code and application name go on the wire.
    pub fn request_header(&self, token: &RequestToken) -> WireValue {
        let mut header = WireStruct::new();
        match token {
            RequestToken::Auth(t) => header.insert("authToken", t.as_str()),
            RequestToken::OAuth(t) => header.insert("oAuthToken", t.as_str()),
        };
        if let Some(code) = present(&self.network_code) {
            header.insert("networkCode", code);
        }
        if let Some(name) = present(&self.application_name) {
            header.insert("applicationName", name);
        }
        header.into()
    }
}

/// Token placed in the `RequestHeader`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestToken {
    Auth(String),
    OAuth(String),
}
