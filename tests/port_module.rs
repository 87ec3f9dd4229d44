//! End-to-end runs of the module against mocked Keystone and Neutron APIs.

use quantum_port::reconcile::{self, Action};
use quantum_port::{ModuleParams, RawParams};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-123";

fn access(identity_url: &str, network_endpoints: Value) -> Value {
    json!({
        "access": {
            "token": {"id": TOKEN, "expires": "2030-01-01T00:00:00Z"},
            "serviceCatalog": [
                {"type": "identity", "name": "keystone",
                 "endpoints": [{"region": "RegionOne",
                                "publicURL": identity_url,
                                "adminURL": identity_url}]},
                {"type": "network", "name": "neutron", "endpoints": network_endpoints}
            ],
            "user": {"id": "u-1", "name": "admin"}
        }
    })
}

fn params(server: &MockServer, state: &str) -> RawParams {
    RawParams {
        login_username: Some("admin".into()),
        login_password: Some("secret".into()),
        login_tenant_name: Some("admin".into()),
        tenant_name: Some("tenant1".into()),
        auth_url: Some(format!("{}/v2.0/", server.uri())),
        state: Some(state.into()),
        name: Some("mgmt_port".into()),
        network_name: Some("management".into()),
        timeout: Some(5),
        ..Default::default()
    }
}

fn validate(raw: RawParams) -> ModuleParams {
    raw.validate().unwrap()
}

fn port_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": "mgmt_port",
        "tenant_id": "tid-1",
        "network_id": "net-1",
        "admin_state_up": true,
        "status": "DOWN",
        "mac_address": "fa:16:3e:11:22:33",
        "fixed_ips": [{"ip_address": "192.168.1.10", "subnet_id": "sub-1"}],
        "allowed_address_pairs": []
    })
}

/// Keystone token + tenants, Neutron networks; both served by one mock server
async fn mount_lookups(server: &MockServer) {
    let identity_url = format!("{}/v2.0", server.uri());
    let catalog = access(
        &identity_url,
        json!([{"region": "RegionOne", "publicURL": server.uri()}]),
    );

    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .and(body_json(json!({
            "auth": {
                "passwordCredentials": {"username": "admin", "password": "secret"},
                "tenantName": "admin"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/tenants"))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenants": [
                {"id": "tid-admin", "name": "admin", "enabled": true},
                {"id": "tid-1", "name": "tenant1", "enabled": true, "description": "demo"}
            ],
            "tenants_links": []
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .and(query_param("name", "management"))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "networks": [
                {"id": "net-1", "name": "management", "subnets": ["sub-1", "sub-2"],
                 "status": "ACTIVE", "admin_state_up": true}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_port_list(server: &MockServer, ports: Value) {
    Mock::given(method("GET"))
        .and(path("/v2.0/ports"))
        .and(query_param("tenant_id", "tid-1"))
        .and(query_param("name", "mgmt_port"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ports": ports })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn creates_missing_port() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    mount_port_list(&server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/v2.0/ports"))
        .and(body_partial_json(json!({
            "port": {
                "name": "mgmt_port",
                "tenant_id": "tid-1",
                "network_id": "net-1",
                "admin_state_up": true,
                "fixed_ips": [{"ip_address": "192.168.1.10", "subnet_id": "sub-1"}],
                "allowed_address_pairs": [{"ip_address": "10.0.0.20"}]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"port": port_json("p-1")})))
        .expect(1)
        .mount(&server)
        .await;

    let raw = RawParams {
        fixed_ip: Some("192.168.1.10".into()),
        allowed_ip_addrs: Some(vec!["10.0.0.20".into()]),
        ..params(&server, "present")
    };
    let outcome = reconcile::run(&validate(raw)).await.unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.result, Action::Created);
    let port = outcome.port.unwrap();
    assert_eq!(port.id, "p-1");
    assert_eq!(port.extra.get("mac_address"), Some(&json!("fa:16:3e:11:22:33")));
}

#[tokio::test]
async fn existing_port_is_left_alone() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    mount_port_list(&server, json!([port_json("p-1")])).await;

    Mock::given(method("POST"))
        .and(path("/v2.0/ports"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = reconcile::run(&validate(params(&server, "present"))).await.unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.result, Action::Success);
    assert_eq!(outcome.port.unwrap().id, "p-1");
}

#[tokio::test]
async fn deletes_existing_port() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    mount_port_list(&server, json!([port_json("p-1")])).await;

    Mock::given(method("DELETE"))
        .and(path("/v2.0/ports/p-1"))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconcile::run(&validate(params(&server, "absent"))).await.unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.result, Action::Deleted);
    assert!(outcome.port.is_none());
}

#[tokio::test]
async fn absent_port_needs_no_delete() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    mount_port_list(&server, json!([])).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = reconcile::run(&validate(params(&server, "absent"))).await.unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.result, Action::Success);
}

#[tokio::test]
async fn rejected_credentials_fail_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "The request you have made requires authentication.",
                "code": 401,
                "title": "Unauthorized"
            }
        })))
        .mount(&server)
        .await;

    let err = reconcile::run(&validate(params(&server, "present"))).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error authenticating to the keystone: 401: The request you have made requires authentication."
    );
}

#[tokio::test]
async fn catalog_without_network_service_fails() {
    let server = MockServer::start().await;
    let identity_url = format!("{}/v2.0", server.uri());
    let mut catalog = access(&identity_url, json!([]));
    catalog["access"]["serviceCatalog"]
        .as_array_mut()
        .unwrap()
        .retain(|s| s["type"] != "network");

    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog))
        .mount(&server)
        .await;

    let err = reconcile::run(&validate(params(&server, "present"))).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error getting network endpoint: no publicURL endpoint for service type 'network'"
    );
}

#[tokio::test]
async fn unknown_network_stops_before_port_calls() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .and(query_param("name", "nowhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"networks": []})))
        .mount(&server)
        .await;

    Mock::given(path("/v2.0/ports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ports": []})))
        .expect(0)
        .mount(&server)
        .await;

    let raw = RawParams {
        network_name: Some("nowhere".into()),
        ..params(&server, "present")
    };
    let err = reconcile::run(&validate(raw)).await.unwrap_err();

    assert_eq!(err.to_string(), "The network cannot be found: nowhere");
}

#[tokio::test]
async fn login_tenant_is_used_when_no_tenant_given() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2.0/ports"))
        .and(query_param("tenant_id", "tid-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ports": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2.0/ports"))
        .and(body_partial_json(json!({"port": {"tenant_id": "tid-admin"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"port": port_json("p-2")})))
        .expect(1)
        .mount(&server)
        .await;

    let raw = RawParams {
        tenant_name: None,
        ..params(&server, "present")
    };
    let outcome = reconcile::run(&validate(raw)).await.unwrap();
    assert!(outcome.changed);
}

#[tokio::test]
async fn port_list_failure_reports_neutron_message() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2.0/ports"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "NeutronError": {
                "type": "HTTPInternalServerError",
                "message": "Request Failed: internal server error while processing your request.",
                "detail": ""
            }
        })))
        .mount(&server)
        .await;

    let err = reconcile::run(&validate(params(&server, "absent"))).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error in listing neutron ports: 500: Request Failed: internal server error while processing your request."
    );
}

#[tokio::test]
async fn region_selects_network_endpoint() {
    let server = MockServer::start().await;
    let identity_url = format!("{}/v2.0", server.uri());
    let catalog = access(
        &identity_url,
        json!([
            {"region": "RegionOne", "publicURL": "http://127.0.0.1:9"},
            {"region": "RegionTwo", "publicURL": server.uri()}
        ]),
    );

    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/tenants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenants": [{"id": "tid-1", "name": "tenant1", "enabled": true}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "networks": [{"id": "net-1", "name": "management", "subnets": ["sub-1"]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    mount_port_list(&server, json!([port_json("p-1")])).await;

    // The identity endpoint in the catalog is only listed for RegionOne, so
    // tenant calls fall back to the auth URL.
    let raw = RawParams {
        region_name: Some("RegionTwo".into()),
        ..params(&server, "present")
    };
    let outcome = reconcile::run(&validate(raw)).await.unwrap();
    assert!(!outcome.changed);
}

#[tokio::test]
async fn delete_failure_reports_neutron_message() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    mount_port_list(&server, json!([port_json("p-1")])).await;

    Mock::given(method("DELETE"))
        .and(path("/v2.0/ports/p-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "NeutronError": {
                "type": "PortNotFound",
                "message": "Port p-1 could not be found.",
                "detail": ""
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = reconcile::run(&validate(params(&server, "absent"))).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error in deleting the port: 404: Port p-1 could not be found."
    );
}

#[tokio::test]
async fn forbidden_tenant_listing_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/tenants"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "message": "You are not authorized to perform the requested action.",
                "code": 403,
                "title": "Forbidden"
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_lookups(&server).await;

    Mock::given(path("/v2.0/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"networks": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = reconcile::run(&validate(params(&server, "present"))).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error in listing keystone tenants: 403: You are not authorized to perform the requested action."
    );
}

#[tokio::test]
async fn network_listing_failure_reports_neutron_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "NeutronError": {
                "type": "HTTPInternalServerError",
                "message": "Request Failed: internal server error while processing your request.",
                "detail": ""
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_lookups(&server).await;

    Mock::given(path("/v2.0/ports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ports": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = reconcile::run(&validate(params(&server, "present"))).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error in listing neutron networks: 500: Request Failed: internal server error while processing your request."
    );
}
