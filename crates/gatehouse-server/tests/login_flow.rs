// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! End-to-end login flow tests against a stubbed Okta org.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gatehouse_server::{create_app_state, create_router, AppState, SqliteSettingsStore};
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE_URL: &str = "http://127.0.0.1:8080";

async fn test_app(org_url: Option<&str>) -> (tempfile::TempDir, AppState, Router) {
	let dir = tempfile::tempdir().unwrap();
	let db_path = dir.path().join("gatehouse.db");
	let pool = gatehouse_server_auth::create_pool(&format!("sqlite://{}", db_path.display()))
		.await
		.unwrap();

	let state = create_app_state(pool.clone(), BASE_URL).await.unwrap();

	if let Some(org_url) = org_url {
		let settings = SqliteSettingsStore::new(pool);
		settings.set("okta_org_url", org_url).await.unwrap();
		settings.set("okta_client_id", "abc").await.unwrap();
		settings.set("okta_client_secret", "xyz").await.unwrap();
	}

	let router = create_router(state.clone());
	(dir, state, router)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
	Request::builder()
		.uri(uri)
		.header(header::COOKIE, cookie)
		.body(Body::empty())
		.unwrap()
}

/// Extract `name=value` (without attributes) from the first matching
/// Set-Cookie header.
fn set_cookie(response: &axum::http::Response<Body>, name: &str) -> Option<String> {
	response
		.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.find(|v| v.starts_with(&format!("{name}=")))
		.and_then(|v| v.split(';').next())
		.map(ToString::to_string)
}

fn query_value(url: &str, name: &str) -> Option<String> {
	let (_, query) = url.split_once('?')?;
	query.split('&').find_map(|pair| {
		let (key, value) = pair.split_once('=')?;
		(key == name).then(|| value.to_string())
	})
}

/// Start a login and return (echoable state, flow cookie).
async fn start_login(router: &Router) -> (String, String) {
	let response = router
		.clone()
		.oneshot(get("/auth/login/okta"))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::FOUND);

	let location = response
		.headers()
		.get(header::LOCATION)
		.unwrap()
		.to_str()
		.unwrap()
		.to_string();
	let state = query_value(&location, "state").unwrap();
	let cookie = set_cookie(&response, "gatehouse_oauth_flow").unwrap();
	(state, cookie)
}

fn mock_token_endpoint() -> Mock {
	Mock::given(method("POST"))
		.and(path("/oauth2/default/v1/token"))
		.and(query_param("grant_type", "authorization_code"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"access_token": "tok123",
			"token_type": "Bearer",
			"expires_in": 3600
		})))
}

fn mock_userinfo_endpoint() -> Mock {
	Mock::given(method("GET"))
		.and(path("/oauth2/default/v1/userinfo"))
		.and(header_matcher("authorization", "Bearer tok123"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"preferred_username": "alice@example.com",
			"name": "Alice Example"
		})))
}

#[tokio::test]
async fn login_redirects_to_okta_with_fresh_state() {
	let okta = MockServer::start().await;
	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;

	let response = router
		.clone()
		.oneshot(get("/auth/login/okta"))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::FOUND);

	let location = response
		.headers()
		.get(header::LOCATION)
		.unwrap()
		.to_str()
		.unwrap()
		.to_string();
	assert!(location.starts_with(&format!("{}/oauth2/default/v1/authorize?", okta.uri())));
	assert_eq!(query_value(&location, "client_id").as_deref(), Some("abc"));
	assert_eq!(
		query_value(&location, "response_type").as_deref(),
		Some("code")
	);

	// Fresh state per attempt.
	let (second_state, _) = start_login(&router).await;
	assert_ne!(query_value(&location, "state").unwrap(), second_state);
}

#[tokio::test]
async fn full_login_flow_establishes_session_and_provisions_user() {
	let okta = MockServer::start().await;
	mock_token_endpoint().mount(&okta).await;
	mock_userinfo_endpoint().mount(&okta).await;

	let (_dir, state, router) = test_app(Some(&okta.uri())).await;
	let (login_state, cookie) = start_login(&router).await;

	let response = router
		.clone()
		.oneshot(get_with_cookie(
			&format!("/auth/okta/callback?code=splxlobe&state={login_state}"),
			&cookie,
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(
		response
			.headers()
			.get(header::LOCATION)
			.unwrap()
			.to_str()
			.unwrap(),
		"/"
	);

	let session_cookie = set_cookie(&response, "gatehouse_session").unwrap();
	let token = session_cookie.split_once('=').unwrap().1.to_string();
	let session = state.session_service.validate(&token).await.unwrap();
	assert_eq!(session.username, "alice@example.com");

	let user = state
		.user_store
		.find_by_username("alice@example.com")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(user.role, "subscriber");
}

#[tokio::test]
async fn callback_with_mismatched_state_rejects_before_token_exchange() {
	let okta = MockServer::start().await;
	// Any call to the token endpoint fails the test.
	mock_token_endpoint().expect(0).mount(&okta).await;

	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;
	let (_login_state, cookie) = start_login(&router).await;

	let response = router
		.clone()
		.oneshot(get_with_cookie(
			"/auth/okta/callback?code=splxlobe&state=forged",
			&cookie,
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn callback_without_flow_cookie_is_rejected() {
	let okta = MockServer::start().await;
	mock_token_endpoint().expect(0).mount(&okta).await;

	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;
	let (login_state, _cookie) = start_login(&router).await;

	let response = router
		.clone()
		.oneshot(get(&format!(
			"/auth/okta/callback?code=splxlobe&state={login_state}"
		)))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn callback_cannot_be_replayed() {
	let okta = MockServer::start().await;
	mock_token_endpoint().mount(&okta).await;
	mock_userinfo_endpoint().mount(&okta).await;

	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;
	let (login_state, cookie) = start_login(&router).await;
	let callback = format!("/auth/okta/callback?code=splxlobe&state={login_state}");

	let first = router
		.clone()
		.oneshot(get_with_cookie(&callback, &cookie))
		.await
		.unwrap();
	assert_eq!(first.status(), StatusCode::FOUND);

	// The pending login is single-use.
	let replay = router
		.clone()
		.oneshot(get_with_cookie(&callback, &cookie))
		.await
		.unwrap();
	assert_eq!(replay.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn callback_without_code_is_rejected() {
	let okta = MockServer::start().await;
	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;
	let (login_state, cookie) = start_login(&router).await;

	let response = router
		.clone()
		.oneshot(get_with_cookie(
			&format!("/auth/okta/callback?state={login_state}"),
			&cookie,
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_with_provider_error_is_rejected() {
	let okta = MockServer::start().await;
	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;
	let (_login_state, cookie) = start_login(&router).await;

	let response = router
		.clone()
		.oneshot(get_with_cookie(
			"/auth/okta/callback?error=access_denied&error_description=denied",
			&cookie,
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_logins_resolve_to_the_same_user() {
	let okta = MockServer::start().await;
	mock_token_endpoint().mount(&okta).await;
	mock_userinfo_endpoint().mount(&okta).await;

	let (_dir, state, router) = test_app(Some(&okta.uri())).await;

	for _ in 0..2 {
		let (login_state, cookie) = start_login(&router).await;
		let response = router
			.clone()
			.oneshot(get_with_cookie(
				&format!("/auth/okta/callback?code=splxlobe&state={login_state}"),
				&cookie,
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::FOUND);
	}

	// One local user, not one per login.
	let user = state
		.user_store
		.find_by_username("alice@example.com")
		.await
		.unwrap();
	assert!(user.is_some());
}

#[tokio::test]
async fn unconfigured_deployment_disables_login() {
	let (_dir, _state, router) = test_app(None).await;

	let response = router
		.clone()
		.oneshot(get("/auth/login/okta"))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let response = router.clone().oneshot(get("/auth/login")).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body = String::from_utf8(body.to_vec()).unwrap();
	assert!(!body.contains("/auth/login/okta"));
}

#[tokio::test]
async fn login_page_renders_okta_link_when_configured() {
	let okta = MockServer::start().await;
	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;

	let response = router.clone().oneshot(get("/auth/login")).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body = String::from_utf8(body.to_vec()).unwrap();
	assert!(body.contains(r#"<a href="/auth/login/okta">"#));
}

#[tokio::test]
async fn health_reports_okta_configuration() {
	let okta = MockServer::start().await;
	let (_dir, _state, router) = test_app(Some(&okta.uri())).await;

	let response = router.clone().oneshot(get("/health")).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(json["status"], "ok");
	assert_eq!(json["okta_configured"], true);
}
