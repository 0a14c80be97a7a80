use chrono::{TimeDelta, Utc};
use dfpclient::{
    ApiVersion, AuthToken, CredentialKey, DfpClient, DfpError, FaultKind, Headers, RetryHint,
    TOKEN_TTL, TokenCache, WireValue,
};
use dfpsoap::{ApiErrorEntry, FaultDetail, SoapFault, build_soap_fault};
use mockito::{Matcher, Server};
use std::sync::Arc;

const NS: &str = "https://www.google.com/apis/ads/publisher/v201103";
const NETWORK_PATH: &str = "/apis/ads/publisher/v201103/NetworkService";

fn network_response() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <getCurrentNetworkResponse xmlns="{NS}">
      <rval>
        <id>1</id>
        <displayName>Test network</displayName>
        <networkCode>1234</networkCode>
      </rval>
    </getCurrentNetworkResponse>
  </soap:Body>
</soap:Envelope>"#
    )
}

fn fault_body(error_type: &str) -> String {
    let fault = SoapFault::new("soap:Server", format!("[{error_type}.SOMETHING @ ]")).with_detail(
        FaultDetail {
            code: None,
            message: Some(format!("[{error_type}.SOMETHING @ ]")),
            errors: vec![ApiErrorEntry {
                error_type: Some(error_type.to_string()),
                error_string: Some(format!("{error_type}.SOMETHING")),
                reason: Some("SOMETHING".into()),
                ..ApiErrorEntry::default()
            }],
        },
    );
    build_soap_fault(&fault, NS).unwrap()
}

fn login_client(server: &Server, cache: Arc<TokenCache>, token: Option<AuthToken>) -> DfpClient {
    let mut builder = DfpClient::builder(Headers::client_login("me@example.com", "s3cr3t", "dispatcher tests"))
        .base_url(server.url())
        .login_endpoint(format!("{}/accounts/ClientLogin", server.url()))
        .token_cache(cache)
        .eager_login(false);
    if let Some(token) = token {
        builder = builder.auth_token(token);
    }
    builder.build().unwrap()
}

fn token_client(server: &Server) -> DfpClient {
    DfpClient::builder(Headers::auth_token("fixed-token", "dispatcher tests"))
        .base_url(server.url())
        .build()
        .unwrap()
}

#[test]
fn expired_token_triggers_exactly_one_login() {
    let mut server = Server::new();
    let login = server
        .mock("POST", "/accounts/ClientLogin")
        .match_body(Matcher::UrlEncoded("Passwd".into(), "s3cr3t".into()))
        .with_body("SID=s\nLSID=l\nAuth=fresh-token\n")
        .expect(1)
        .create();
    let api = server
        .mock("POST", NETWORK_PATH)
        .match_body(Matcher::Regex("<authToken>fresh-token</authToken>".into()))
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(network_response())
        .expect(1)
        .create();

    let cache = Arc::new(TokenCache::new());
    let stale = AuthToken::issued_at("old-token", Utc::now() - TOKEN_TTL - TimeDelta::seconds(1));
    let client = login_client(&server, cache.clone(), Some(stale));

    let (network,) = client
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap();
    assert_eq!(network.get("networkCode"), Some(&WireValue::scalar("1234")));

    login.assert();
    api.assert();

    let stored = cache
        .get(&CredentialKey::new("me@example.com", "gam"))
        .unwrap();
    assert_eq!(stored.token, "fresh-token");

    let sent = client.last_request().unwrap();
    assert!(!sent.contains("s3cr3t"));
    assert!(!sent.contains("me@example.com"));
    assert!(client.last_response().unwrap().contains("Test network"));
}

#[test]
fn valid_token_is_reused() {
    let mut server = Server::new();
    let login = server
        .mock("POST", "/accounts/ClientLogin")
        .with_body("Auth=unexpected\n")
        .expect(0)
        .create();
    let api = server
        .mock("POST", NETWORK_PATH)
        .match_body(Matcher::Regex("<authToken>still-good</authToken>".into()))
        .with_body(network_response())
        .expect(2)
        .create();

    let fresh = AuthToken::issued_at("still-good", Utc::now() - TOKEN_TTL + TimeDelta::minutes(1));
    let client = login_client(&server, Arc::new(TokenCache::new()), Some(fresh));

    for _ in 0..2 {
        client
            .call_method("NetworkService", "getCurrentNetwork", &[])
            .unwrap();
    }

    login.assert();
    api.assert();
}

#[test]
fn clients_share_a_refreshed_token() {
    let mut server = Server::new();
    let login = server
        .mock("POST", "/accounts/ClientLogin")
        .with_body("Auth=shared-token\n")
        .expect(1)
        .create();
    server
        .mock("POST", NETWORK_PATH)
        .with_body(network_response())
        .expect(2)
        .create();

    let cache = Arc::new(TokenCache::new());
    let first = login_client(&server, cache.clone(), None);
    let second = login_client(&server, cache, None);

    first.call_method("NetworkService", "getCurrentNetwork", &[]).unwrap();
    second.call_method("NetworkService", "getCurrentNetwork", &[]).unwrap();

    login.assert();
    assert_eq!(second.auth_token().unwrap().token, "shared-token");
}

#[test]
fn failed_login_surfaces_on_call() {
    let mut server = Server::new();
    server
        .mock("POST", "/accounts/ClientLogin")
        .with_status(403)
        .with_body("Error=BadAuthentication\n")
        .create();
    let api = server.mock("POST", NETWORK_PATH).expect(0).create();

    let client = DfpClient::builder(Headers::client_login("me@example.com", "wrong", "dispatcher tests"))
        .base_url(server.url())
        .login_endpoint(format!("{}/accounts/ClientLogin", server.url()))
        .token_cache(Arc::new(TokenCache::new()))
        .build()
        .expect("a refused login does not fail construction");

    assert_eq!(client.last_login_error().as_deref(), Some("Auth token error: BadAuthentication"));

    let err = client
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap_err();
    assert!(matches!(err, DfpError::AuthToken(_)));
    assert!(err.is_auth_error());
    assert!(client.auth_token().is_none());
    api.assert();
}

#[test]
fn registered_faults_are_classified() {
    let mut server = Server::new();
    let cases = [
        ("QuotaError", FaultKind::Server, RetryHint::BackOff),
        ("AuthenticationError", FaultKind::Authentication, RetryHint::RefreshCredentials),
        ("RequiredError", FaultKind::Request, RetryHint::FixInput),
    ];

    for (error_type, kind, hint) in cases {
        let mock = server
            .mock("POST", NETWORK_PATH)
            .with_status(500)
            .with_body(fault_body(error_type))
            .expect(1)
            .create();

        let client = token_client(&server);
        let err = client
            .call_method("NetworkService", "getCurrentNetwork", &[])
            .unwrap_err();
        match &err {
            DfpError::Api(fault) => {
                assert_eq!(fault.kind, kind, "{error_type}");
                assert_eq!(fault.http_status, 500);
                assert_eq!(fault.error_type(), error_type);
            }
            other => panic!("{error_type}: unexpected {other:?}"),
        }
        assert_eq!(err.retry_hint(), Some(hint));
        assert!(client.last_response().unwrap().contains(error_type));

        mock.assert();
        mock.remove();
    }
}

#[test]
fn unregistered_fault_is_a_wire_fault() {
    let mut server = Server::new();
    server
        .mock("POST", NETWORK_PATH)
        .with_status(500)
        .with_body(fault_body("FancyNewError"))
        .create();

    let err = token_client(&server)
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap_err();
    match err {
        DfpError::WireFault(fault) => {
            assert_eq!(fault.classification_key(), Some("FancyNewError"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn http_errors_without_fault() {
    let mut server = Server::new();
    server
        .mock("POST", NETWORK_PATH)
        .with_status(502)
        .with_body("Bad gateway")
        .create();

    let err = token_client(&server)
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap_err();
    assert!(matches!(err, DfpError::Http { status: 502, .. }));
    assert_eq!(err.retry_hint(), Some(RetryHint::BackOff));
}

#[test]
fn malformed_success_body() {
    let mut server = Server::new();
    server
        .mock("POST", NETWORK_PATH)
        .with_body("<html>not soap</html>")
        .create();

    let err = token_client(&server)
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap_err();
    assert!(matches!(err, DfpError::Soap(_)));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let client = DfpClient::builder(Headers::auth_token("fixed-token", "dispatcher tests"))
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let err = client
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap_err();
    assert!(matches!(err, DfpError::Transport(_)));
    assert!(client.last_request().is_some());
    assert!(client.last_response().is_none());
}

#[test]
fn oauth_header() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201010/NetworkService")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<oAuthToken>oauth-1</oAuthToken>".into()),
            Matcher::Regex("<networkCode>1234</networkCode>".into()),
            Matcher::Regex("DfpApi-Rust/".into()),
        ]))
        .with_body(network_response().replace("v201103", "v201010"))
        .create();

    let client = DfpClient::builder(Headers::oauth_token("oauth-1", "dispatcher tests").with_network_code("1234"))
        .version(ApiVersion::V201010)
        .base_url(server.url())
        .build()
        .unwrap();
    client
        .call_method("NetworkService", "getCurrentNetwork", &[])
        .unwrap();
    api.assert();
}

#[test]
fn raw_envelopes_are_sent_unchanged() {
    let envelope = format!(
        r#"<?xml version="1.0"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Header><RequestHeader xmlns="{NS}"><authToken>hand-made</authToken><applicationName>raw</applicationName></RequestHeader></soapenv:Header><soapenv:Body><getCurrentNetwork xmlns="{NS}"/></soapenv:Body></soapenv:Envelope>"#
    );

    let mut server = Server::new();
    let api = server
        .mock("POST", NETWORK_PATH)
        .match_body(envelope.as_str())
        .with_body(network_response())
        .create();

    let client = token_client(&server);
    let (network,) = client.call_raw_method("NetworkService", &envelope).unwrap();
    assert_eq!(network.get("id"), Some(&WireValue::scalar("1")));
    assert_eq!(client.last_request().as_deref(), Some(envelope.as_str()));
    api.assert();
}

#[test]
fn client_is_shareable_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DfpClient>();

    let mut server = Server::new();
    server
        .mock("POST", NETWORK_PATH)
        .with_body(network_response())
        .expect(4)
        .create();

    let client = Arc::new(token_client(&server));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            std::thread::spawn(move || {
                client
                    .call_method("NetworkService", "getCurrentNetwork", &[])
                    .map(|(network,)| network)
            })
        })
        .collect();

    for handle in handles {
        let network = handle.join().unwrap().unwrap();
        assert_eq!(network.get("networkCode"), Some(&WireValue::scalar("1234")));
    }
}
