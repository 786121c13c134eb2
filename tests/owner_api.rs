//! HTTP-level tests of the Owner API client against a mock server.

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tesla_gateway::api::{ApiError, OwnerApiClient, VehicleApi};
use tesla_gateway::auth::{AuthApi, AuthError, Credentials};

fn client(server: &MockServer) -> OwnerApiClient {
    OwnerApiClient::new(&server.uri(), &server.uri()).unwrap()
}

fn refresh_credentials() -> Credentials {
    Credentials::RefreshToken {
        email: "owner@example.com".into(),
        refresh_token: "refresh-123".into(),
    }
}

#[tokio::test]
async fn refresh_grant_posts_the_oauth_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .and(body_json(json!({
            "grant_type": "refresh_token",
            "client_id": "ownerapi",
            "refresh_token": "refresh-123",
            "scope": "openid email offline_access",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server)
        .fetch_token(&refresh_credentials())
        .await
        .unwrap();
    assert_eq!(token.access_token, "at-1");
    assert_eq!(token.expires_in, 3600);
    assert!(token.is_valid());
}

#[tokio::test]
async fn owner_login_uses_the_password_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "grant_type": "password",
            "email": "owner@example.com",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-2",
            "expires_in": 1800,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server)
        .fetch_token(&Credentials::OwnerLogin {
            email: "owner@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();
    assert_eq!(token.access_token, "at-2");
}

#[tokio::test]
async fn rejected_credentials_surface_the_response_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_token(&refresh_credentials())
        .await
        .unwrap_err();
    match err {
        AuthError::Rejected(message) => assert!(message.contains("invalid_grant")),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn token_response_without_access_token_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 3600})))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_token(&refresh_credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
}

#[tokio::test]
async fn vehicles_sends_the_bearer_header_and_maps_the_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles"))
        .and(header("Authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [
                {"id_s": "42", "display_name": "My Car", "state": "online"},
                {"id_s": "43", "display_name": "Other Car", "state": "asleep"},
            ],
            "count": 2,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vehicles = client(&server).vehicles("at-1").await.unwrap();
    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[0].id, "42");
    assert_eq!(vehicles[0].display_name, "My Car");
    assert_eq!(vehicles[1].state.as_deref(), Some("asleep"));
}

#[tokio::test]
async fn command_posts_the_body_and_unwraps_the_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/1/vehicles/42/command/set_charge_limit"))
        .and(header("Authorization", "Bearer at-1"))
        .and(body_json(json!({"percent": 90})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"result": true, "reason": ""},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server)
        .command("at-1", "42", "set_charge_limit", json!({"percent": 90}))
        .await
        .unwrap();
    assert_eq!(payload, json!({"result": true, "reason": ""}));
}

#[tokio::test]
async fn non_success_status_keeps_the_body_for_diagnosis() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42/vehicle_data"))
        .respond_with(ResponseTemplate::new(408).set_body_string("vehicle unavailable"))
        .mount(&server)
        .await;

    let err = client(&server)
        .data_request("at-1", "42", "vehicle_data")
        .await
        .unwrap_err();
    match err {
        ApiError::Server { status, body } => {
            assert_eq!(status, 408);
            assert_eq!(body, "vehicle unavailable");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_envelope_is_a_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "online"})))
        .mount(&server)
        .await;

    let err = client(&server).vehicle("at-1", "42").await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn wake_up_posts_an_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/1/vehicles/42/wake_up"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"state": "asleep"},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server).wake_up("at-1", "42").await.unwrap();
    assert_eq!(payload["state"], "asleep");
}
