use dfpclient::{
    Action, ActionKind, ApiVersion, Config, DfpClient, DfpError, Headers, ReportJobStatus,
    ReportPoller, Statement, Value, WireStruct, WireValue,
};
use mockito::{Matcher, Mock, Server};
use std::time::Duration;

fn envelope(version: &str, operation: &str, rval: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <{operation}Response xmlns="https://www.google.com/apis/ads/publisher/{version}">{rval}</{operation}Response>
  </soap:Body>
</soap:Envelope>"#
    )
}

fn client(server: &Server) -> DfpClient {
    DfpClient::builder(Headers::auth_token("tok", "service tests"))
        .base_url(server.url())
        .build()
        .unwrap()
}

fn silent_mock(server: &mut Server, service: &str) -> Mock {
    server
        .mock("POST", format!("/apis/ads/publisher/v201103/{service}").as_str())
        .expect(0)
        .create()
}

#[test]
fn single_result_comes_back_as_a_list() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/InventoryService")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<getAdUnitsByStatement".into()),
            Matcher::Regex("<query>WHERE parentId = :id LIMIT 10</query>".into()),
            Matcher::Regex(r#"<key>id</key>\s*<value xsi:type="NumberValue">\s*<value>42</value>"#.into()),
        ]))
        .with_body(envelope(
            "v201103",
            "getAdUnitsByStatement",
            "<rval><totalResultSetSize>1</totalResultSetSize><startIndex>0</startIndex>\
             <results><id>7</id><name>Home</name><parentId>42</parentId></results></rval>",
        ))
        .create();

    let client = client(&server);
    let inventory = client.service("InventoryService").unwrap();
    let statement = Statement::new("WHERE parentId = :id LIMIT 10").bind("id", Value::number(42).unwrap());
    let page = inventory.get_by_statement(statement).unwrap();

    let results = page.get("results").and_then(WireValue::as_seq).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get("name"), Some(&WireValue::scalar("Home")));
    assert_eq!(page.get("totalResultSetSize"), Some(&WireValue::scalar("1")));
    api.assert();
}

#[test]
fn empty_page_has_empty_results() {
    let mut server = Server::new();
    server
        .mock("POST", "/apis/ads/publisher/v201103/OrderService")
        .with_body(envelope(
            "v201103",
            "getOrdersByStatement",
            "<rval><totalResultSetSize>0</totalResultSetSize><startIndex>0</startIndex></rval>",
        ))
        .create();

    let client = client(&server);
    let page = client
        .service("OrderService")
        .unwrap()
        .get_by_statement(Statement::new("WHERE status = 'DRAFT'"))
        .unwrap();
    assert_eq!(page.get("results"), Some(&WireValue::Seq(vec![])));
}

#[test]
fn create_many_returns_a_list() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/CompanyService")
        .match_body(Matcher::Regex("<companies><name>Acme</name><type>ADVERTISER</type></companies>".into()))
        .with_body(envelope(
            "v201103",
            "createCompanies",
            "<rval><id>1</id><name>Acme</name><type>ADVERTISER</type></rval>",
        ))
        .create();

    let client = client(&server);
    let company = WireStruct::new()
        .with_field("type", "ADVERTISER")
        .with("name", "Acme");
    let (created,) = client
        .service("CompanyService")
        .unwrap()
        .call("createCompanies", WireStruct::new().with("companies", vec![company]))
        .unwrap();

    let created = created.as_seq().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].get("type"), Some(&WireValue::scalar("ADVERTISER")));
    api.assert();
}

#[test]
fn custom_targeting_values_go_out_in_schema_order() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/CustomTargetingService")
        .match_body(Matcher::Regex(
            "<createCustomTargetingValues[^>]*><values><customTargetingKeyId>7</customTargetingKeyId>\
             <name>sports</name><displayName>Sports</displayName></values>"
                .into(),
        ))
        .with_body(envelope(
            "v201103",
            "createCustomTargetingValues",
            "<rval><customTargetingKeyId>7</customTargetingKeyId><id>70</id>\
             <name>sports</name><displayName>Sports</displayName></rval>",
        ))
        .create();

    let client = client(&server);
    let value = WireStruct::new()
        .with("displayName", "Sports")
        .with("name", "sports")
        .with("customTargetingKeyId", "7");
    let (created,) = client
        .service("CustomTargetingService")
        .unwrap()
        .call("createCustomTargetingValues", WireStruct::new().with("values", vec![value]))
        .unwrap();

    assert_eq!(created.as_seq().unwrap()[0].get("id"), Some(&WireValue::scalar("70")));
    api.assert();
}

#[test]
fn large_responses_are_read_whole() {
    let mut server = Server::new();
    let description = "x".repeat(12 * 1024 * 1024);
    server
        .mock("POST", "/apis/ads/publisher/v201103/NetworkService")
        .with_body(envelope(
            "v201103",
            "getCurrentNetwork",
            &format!("<rval><id>1</id><displayName>{description}</displayName></rval>"),
        ))
        .create();

    let client = client(&server);
    let (network,) = client
        .service("NetworkService")
        .unwrap()
        .call("getCurrentNetwork", WireStruct::new())
        .unwrap();
    assert_eq!(
        network.get("displayName").and_then(WireValue::as_str).map(str::len),
        Some(description.len())
    );
}

#[test]
fn invalid_statements_are_rejected_before_sending() {
    let mut server = Server::new();
    let api = silent_mock(&mut server, "InventoryService");
    let client = client(&server);
    let inventory = client.service("InventoryService").unwrap();

    let two_values = WireStruct::new().with("query", "WHERE id = :a OR id = :b").with(
        "values",
        vec![
            WireStruct::new().with("key", "a").with("value", Value::text("1")),
            WireStruct::new().with("key", "b").with("value", Value::text("2")),
        ],
    );
    let err = inventory
        .call("getAdUnitsByStatement", WireStruct::new().with("filterStatement", two_values))
        .unwrap_err();
    assert!(matches!(err, DfpError::Validation(_)));

    let err = inventory
        .call("getAdUnitsByStatement", WireStruct::new())
        .unwrap_err();
    assert!(matches!(err, DfpError::Validation(_)));

    assert!(matches!(
        inventory.call("deleteEverything", WireStruct::new()),
        Err(DfpError::Validation(_))
    ));
    api.assert();
}

#[test]
fn invalid_actions_are_rejected_before_sending() {
    let mut server = Server::new();
    let api = silent_mock(&mut server, "OrderService");
    let client = client(&server);
    let orders = client.service("OrderService").unwrap();

    let untyped = WireStruct::new().with_field("skipInventoryCheck", "true");
    let args = WireStruct::new()
        .with("orderAction", untyped)
        .with("filterStatement", Statement::new("WHERE id = 1"));
    assert!(matches!(
        orders.call("performOrderAction", args),
        Err(DfpError::Validation(_))
    ));

    let wrong_entity = orders
        .perform_action(Action::new(ActionKind::PauseLineItems), Statement::new("WHERE id = 1"))
        .unwrap_err();
    assert!(matches!(wrong_entity, DfpError::Validation(_)));
    api.assert();
}

#[test]
fn strict_mode_rejects_undeclared_parameters() {
    let mut server = Server::new();
    let api = silent_mock(&mut server, "NetworkService");
    let client = client(&server);

    let err = client
        .service("NetworkService")
        .unwrap()
        .call("getCurrentNetwork", WireStruct::new().with("verbose", true))
        .unwrap_err();
    assert!(matches!(err, DfpError::Validation(_)));
    api.assert();
}

#[test]
fn lenient_mode_passes_undeclared_parameters() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/NetworkService")
        .match_body(Matcher::Regex("<verbose>true</verbose>".into()))
        .with_body(envelope("v201103", "getCurrentNetwork", "<rval><id>1</id></rval>"))
        .create();

    let config = Config {
        strict: false,
        ..Config::default()
    };
    let client = DfpClient::builder(Headers::auth_token("tok", "service tests"))
        .config(config)
        .base_url(server.url())
        .build()
        .unwrap();

    client
        .service("NetworkService")
        .unwrap()
        .call("getCurrentNetwork", WireStruct::new().with("verbose", true))
        .unwrap();
    api.assert();
}

#[test]
fn perform_action_sends_typed_action() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/LineItemService")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"<lineItemAction xsi:type="ActivateLineItems">"#.into()),
            Matcher::Regex("<skipInventoryCheck>true</skipInventoryCheck>".into()),
            Matcher::Regex("</lineItemAction>\\s*<filterStatement>".into()),
        ]))
        .with_body(envelope(
            "v201103",
            "performLineItemAction",
            "<rval><numChanges>3</numChanges></rval>",
        ))
        .create();

    let client = client(&server);
    let action = Action::new(ActionKind::ActivateLineItems)
        .skip_inventory_check(true)
        .unwrap();
    let result = client
        .service("LineItemService")
        .unwrap()
        .perform_action(action, Statement::new("WHERE orderId = 9"))
        .unwrap();

    assert_eq!(result.get("numChanges"), Some(&WireValue::scalar("3")));
    api.assert();
}

#[test]
fn services_follow_the_version() {
    let server = Server::new();
    let client = DfpClient::builder(Headers::auth_token("tok", "service tests"))
        .version(ApiVersion::V201004)
        .base_url(server.url())
        .build()
        .unwrap();

    assert!(client.service("InventoryService").is_ok());
    assert!(matches!(
        client.service("ReportService"),
        Err(DfpError::Validation(_))
    ));
}

#[test]
fn report_job_is_polled_until_done() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/ReportService")
        .match_body(Matcher::Regex("<reportJobId>55</reportJobId>".into()))
        .with_body(envelope(
            "v201103",
            "getReportJob",
            "<rval><id>55</id><reportJobStatus>COMPLETED</reportJobStatus></rval>",
        ))
        .expect(1)
        .create();

    let client = client(&server);
    let reports = client.service("ReportService").unwrap();
    let status = ReportPoller::new(Duration::ZERO, 3)
        .wait_for_job(&reports, "55")
        .unwrap();
    assert_eq!(status, ReportJobStatus::Completed);
    api.assert();
}

#[test]
fn report_poller_gives_up() {
    let mut server = Server::new();
    let api = server
        .mock("POST", "/apis/ads/publisher/v201103/ReportService")
        .with_body(envelope(
            "v201103",
            "getReportJob",
            "<rval><id>56</id><reportJobStatus>IN_PROGRESS</reportJobStatus></rval>",
        ))
        .expect(2)
        .create();

    let client = client(&server);
    let reports = client.service("ReportService").unwrap();
    let err = ReportPoller::new(Duration::ZERO, 2)
        .wait_for_job(&reports, "56")
        .unwrap_err();
    assert!(matches!(err, DfpError::ReportTimeout { attempts: 2, .. }));
    api.assert();
}
