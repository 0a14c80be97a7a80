//! # dfpclient - Client of the DFP SOAP API
//!
//! Blocking client of the DoubleClick for Publishers API: ClientLogin
//! authentication with token renewal, PQL statements and bulk actions,
//! a registry of services per API version, and typed errors for SOAP
//! faults.
//!
//! ## Features
//!
//! - ✅ ClientLogin, fixed auth token or OAuth token ([`Headers`])
//! - ✅ Token renewal after 23 hours, shared between clients ([`TokenCache`])
//! - ✅ Statements with typed bind values ([`Statement`], [`Value`])
//! - ✅ Bulk actions bound to their entity ([`Action`], [`ActionKind`])
//! - ✅ Services and operations per version ([`DfpService`])
//! - ✅ Fault classification ([`DfpError::Api`], [`FaultKind`])
//! - ✅ Report job polling ([`ReportPoller`])
//! - ✅ Logging configured from `dfpconfig` ([`init_logging`])
//!
//! ## Example
//!
//! ```no_run
//! use dfpclient::{DfpClient, Headers, Statement, Value};
//!
//! # fn main() -> dfpclient::Result<()> {
//! let client = DfpClient::builder(Headers::client_login("me@example.com", "secret", "inventory sync"))
//!     .build()?;
//!
//! let inventory = client.service("InventoryService")?;
//! let page = inventory.get_by_statement(
//!     Statement::new("WHERE status = :status LIMIT 500").bind("status", Value::text("ACTIVE")),
//! )?;
//!
//! for ad_unit in page.get("results").and_then(|r| r.as_seq()).unwrap_or_default() {
//!     println!("{:?}", ad_unit.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

mod action;
mod auth;
mod client;
mod error;
mod headers;
mod http;
pub mod logging;
mod registry;
mod report;
mod schema;
mod services;
mod statement;
mod token;
mod version;

pub use action::{Action, ActionKind, validate_action};
pub use auth::{ACCOUNT_TYPE, AUTH_SERVICE, CLIENT_LOGIN_URL, ClientLogin, LoginTokens, get_auth_token, parse_login_response};
pub use client::{DfpClient, DfpClientBuilder, MAX_RESPONSE_BYTES, SOAP_LOG_TARGET};
pub use error::{ApiFault, DfpError, FaultKind, Result, RetryHint, fault_kind};
pub use headers::{AuthMode, Headers, LIB_SIG, RequestToken};
pub use logging::init_logging;
pub use registry::{OperationSpec, ParamKind, ParamSpec, ReturnShape, ServiceSpec, service_spec, services};
pub use report::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, ReportJobStatus, ReportPoller, job_status};
pub use schema::{COLLECTION_FIELDS, field_order_table};
pub use services::DfpService;
pub use statement::{MAX_STATEMENT_VALUES, Statement, StatementValue, Value, validate_statement};
pub use token::{AuthToken, CredentialKey, TOKEN_TTL, TokenCache};
pub use version::{ApiVersion, OperationConfig, Server};

pub use dfpconfig::Config;
pub use dfpsoap::{WireStruct, WireValue};
