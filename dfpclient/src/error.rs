//! Error handling for the DFP client

use dfpsoap::{SoapError, SoapFault};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type of dfpclient
pub type Result<T> = std::result::Result<T, DfpError>;

/// Errors raised by the client
#[derive(Error, Debug)]
pub enum DfpError {
    /// ClientLogin refused the credentials or could not be reached
    #[error("Auth token error: {0}")]
    AuthToken(String),

    /// Input rejected before any network I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Classified fault returned by the API
    #[error("API error: {0}")]
    Api(ApiFault),

    /// Fault whose error type is not in the registry
    #[error("API fault: {0}")]
    WireFault(SoapFault),

    /// A configured feature needs a crate feature that is not compiled in
    #[error("Missing package: {0}")]
    MissingPackage(String),

    /// Connection, TLS or timeout failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// Non-success HTTP status without a SOAP fault
    #[error("HTTP error (status {status}): {body}")]
    Http { status: u16, body: String },

    /// Malformed SOAP document
    #[error("SOAP error: {0}")]
    Soap(#[from] SoapError),

    /// Configuration error (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Well-formed response the client cannot interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A report job was still running after the last poll
    #[error("Report job {job_id} still running after {attempts} checks")]
    ReportTimeout { job_id: String, attempts: u32 },
}

impl DfpError {
    /// Builds the error of a SOAP fault, classifying it when its error type
    /// is registered.
    pub fn from_fault(fault: SoapFault, http_status: u16) -> Self {
        let kind = fault.classification_key().and_then(fault_kind);
        match kind {
            Some(kind) => DfpError::Api(ApiFault {
                kind,
                http_status,
                fault,
            }),
            None => DfpError::WireFault(fault),
        }
    }

    /// True when new credentials are needed.
    pub fn is_auth_error(&self) -> bool {
        match self {
            DfpError::AuthToken(_) => true,
            DfpError::Api(fault) => fault.kind == FaultKind::Authentication,
            _ => false,
        }
    }

    /// What a caller may do about the error, when that is known.
    pub fn retry_hint(&self) -> Option<RetryHint> {
        match self {
            DfpError::Api(fault) => Some(fault.kind.retry_hint()),
            DfpError::AuthToken(_) => Some(RetryHint::RefreshCredentials),
            DfpError::Transport(_) => Some(RetryHint::BackOff),
            DfpError::Http { status, .. } if *status >= 500 => Some(RetryHint::BackOff),
            _ => None,
        }
    }
}

/// Category of a classified API fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The request itself is wrong
    Request,
    /// The server failed or throttled the call
    Server,
    /// Credentials or permissions are missing
    Authentication,
}

impl FaultKind {
    pub fn retry_hint(self) -> RetryHint {
        match self {
            FaultKind::Request => RetryHint::FixInput,
            FaultKind::Server => RetryHint::BackOff,
            FaultKind::Authentication => RetryHint::RefreshCredentials,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::Request => "request",
            FaultKind::Server => "server",
            FaultKind::Authentication => "authentication",
        };
        f.write_str(name)
    }
}

/// Advice attached to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// Retrying the same request fails again
    FixInput,
    /// Retry later
    BackOff,
    /// Log in again or fix the credentials
    RefreshCredentials,
}

/// API fault with its category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFault {
    pub kind: FaultKind,
    pub http_status: u16,
    pub fault: SoapFault,
}

impl ApiFault {
    /// Registry key the fault was classified under.
    pub fn error_type(&self) -> &str {
        self.fault.classification_key().unwrap_or_default()
    }
}

impl fmt::Display for ApiFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fault {}: {}", self.kind, self.error_type(), self.fault)
    }
}

const AUTHENTICATION_FAULTS: &[&str] = &["AuthenticationError", "PermissionError"];

const SERVER_FAULTS: &[&str] = &["InternalApiError", "QuotaError", "ServerError"];

const REQUEST_FAULTS: &[&str] = &[
    "ApiVersionError",
    "CommonError",
    "CreativeError",
    "CustomTargetingError",
    "FeatureError",
    "FileError",
    "ForecastError",
    "FrequencyCapError",
    "ImageError",
    "InvalidEmailError",
    "InvalidUrlError",
    "InventoryTargetingError",
    "InventoryUnitError",
    "LabelError",
    "LineItemCreativeAssociationError",
    "LineItemError",
    "LineItemFlightDateError",
    "LineItemOperationError",
    "NotNullError",
    "NullError",
    "OrderActionError",
    "OrderError",
    "ParseError",
    "PublisherQueryLanguageContextError",
    "PublisherQueryLanguageSyntaxError",
    "RangeError",
    "ReportError",
    "RequiredCollectionError",
    "RequiredError",
    "RequiredNumberError",
    "RequiredSizeError",
    "ReservationDetailsError",
    "StatementError",
    "StringLengthError",
    "TypeError",
    "UniqueError",
];

static FAULT_REGISTRY: Lazy<HashMap<&'static str, FaultKind>> = Lazy::new(|| {
    let mut registry = HashMap::new();
    for (names, kind) in [
        (AUTHENTICATION_FAULTS, FaultKind::Authentication),
        (SERVER_FAULTS, FaultKind::Server),
        (REQUEST_FAULTS, FaultKind::Request),
    ] {
        for name in names {
            registry.insert(*name, kind);
        }
    }
    registry
});

/// Looks up the category of an error type.
///
/// Accepts the bare type (`QuotaError`) or a qualified code
/// (`QuotaError.EXCEEDED_QUOTA`).
pub fn fault_kind(error_type: &str) -> Option<FaultKind> {
    FAULT_REGISTRY.get(error_type).copied().or_else(|| {
        let (prefix, _) = error_type.split_once('.')?;
        FAULT_REGISTRY.get(prefix).copied()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfpsoap::{ApiErrorEntry, FaultDetail};

    fn fault_with_type(error_type: &str) -> SoapFault {
        SoapFault::new("soap:Server", "boom").with_detail(FaultDetail {
            code: None,
            message: Some("boom".into()),
            errors: vec![ApiErrorEntry {
                error_type: Some(error_type.into()),
                ..ApiErrorEntry::default()
            }],
        })
    }

    #[test]
    fn registry_lookup() {
        assert_eq!(fault_kind("QuotaError"), Some(FaultKind::Server));
        assert_eq!(
            fault_kind("AuthenticationError.GOOGLE_ACCOUNT_ALREADY_ASSOCIATED_WITH_NETWORK"),
            Some(FaultKind::Authentication)
        );
        assert_eq!(fault_kind("RequiredError"), Some(FaultKind::Request));
        assert_eq!(fault_kind("SomethingNew"), None);
    }

    #[test]
    fn faults_are_classified() {
        let err = DfpError::from_fault(fault_with_type("PermissionError"), 500);
        assert!(err.is_auth_error());
        assert_eq!(err.retry_hint(), Some(RetryHint::RefreshCredentials));

        match DfpError::from_fault(fault_with_type("QuotaError"), 500) {
            DfpError::Api(fault) => {
                assert_eq!(fault.kind, FaultKind::Server);
                assert_eq!(fault.error_type(), "QuotaError");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_faults_stay_raw() {
        let err = DfpError::from_fault(fault_with_type("BrandNewError"), 500);
        assert!(matches!(err, DfpError::WireFault(_)));
        assert_eq!(err.retry_hint(), None);

        let err = DfpError::from_fault(SoapFault::new("soap:Client", "bad"), 400);
        assert!(matches!(err, DfpError::WireFault(_)));
    }
}
