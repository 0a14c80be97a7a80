//! HTTP agent shared by login and SOAP calls

use crate::error::{DfpError, Result};
use std::time::Duration;
use ureq::{Agent, Proxy};

/// Builds an agent that hands back 4xx/5xx responses instead of failing,
/// so SOAP faults and login errors can be read from the body.
pub(crate) fn build_agent(proxy: Option<&str>, timeout: Duration) -> Result<Agent> {
    let proxy = proxy
        .filter(|p| !p.is_empty())
        .map(|p| {
            Proxy::new(p).map_err(|err| DfpError::Validation(format!("invalid proxy {p:?}: {err}")))
        })
        .transpose()?;

    let config = Agent::config_builder()
        .http_status_as_error(false)
        .proxy(proxy)
        .timeout_global(Some(timeout))
        .build();

    Ok(config.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_is_validated() {
        assert!(build_agent(None, Duration::from_secs(5)).is_ok());
        assert!(build_agent(Some(""), Duration::from_secs(5)).is_ok());
        assert!(build_agent(Some("http://proxy.local:3128"), Duration::from_secs(5)).is_ok());
        assert!(matches!(
            build_agent(Some("http://not a proxy"), Duration::from_secs(5)),
            Err(DfpError::Validation(_))
        ));
    }
}
