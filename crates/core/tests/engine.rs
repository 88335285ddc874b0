//! Tests for the engine facade: navigation, redirects and failure atomicity.

mod common;

use common::{MockResponse, MockTransport, SharedBuffer};
use pretty_assertions::assert_eq;
use strider_core::{Credentials, EngineConfig, Error, Method, Navigation, Proxy, RequestDictionary};

const HOME: &str = "<html><head><title>Home</title></head><body><h1>Home</h1></body></html>";

fn site() -> MockTransport {
    let mock = MockTransport::new();
    mock.route(
        "http://test.local/",
        MockResponse::html(HOME).header("ETag", "\"home-v1\""),
    )
    .route("http://test.local/other", MockResponse::html("<h1>Other</h1>"))
    .route("http://test.local/old", MockResponse::redirect(301, "/other"))
    .route("http://test.local/cached", MockResponse::status(304))
    .route("http://test.local/empty", MockResponse::status(204).without_body())
    .route("http://test.local/broken", MockResponse::redirect(302, "/nowhere"));
    for hop in 1..=5 {
        mock.route(
            &format!("http://test.local/loop{hop}"),
            MockResponse::redirect(302, &format!("/loop{}", hop + 1)),
        );
    }
    mock
}

#[test]
fn test_navigate_loads_document() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();

    assert_eq!(engine.uri().unwrap().as_str(), "http://test.local/");
    assert_eq!(engine.response().unwrap().status, 200);
    assert_eq!(engine.document().unwrap().title().as_deref(), Some("Home"));
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_relative_navigation_uses_previous_authority() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();
    engine.navigate("other").unwrap();

    assert_eq!(engine.uri().unwrap().as_str(), "http://test.local/other");
    assert_eq!(engine.history().current().unwrap().previous, Some(0));
}

#[test]
fn test_relative_first_navigation_fails() {
    let mock = site();
    let mut engine = mock.engine();
    assert!(matches!(engine.navigate("/other"), Err(Error::InvalidUri { .. })));
    assert!(mock.requests().is_empty());
}

#[test]
fn test_redirect_hops_are_recorded() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();
    engine.navigate("/old").unwrap();

    let history = engine.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history.get(1).unwrap().response.status, 301);
    assert_eq!(history.get(2).unwrap().previous, Some(1));
    assert_eq!(engine.uri().unwrap().path(), "/other");
    assert_eq!(engine.select("h1").unwrap().inner_text(), "Other");
}

#[test]
fn test_redirect_not_followed_on_request() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();
    engine
        .navigate_with(Navigation::to("/old").follow_redirect(false))
        .unwrap();

    assert_eq!(engine.response().unwrap().status, 301);
    assert_eq!(engine.response().unwrap().location.as_deref(), Some("/other"));
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn test_redirects_disabled_by_config() {
    let mock = site();
    let mut engine = mock.engine_with(EngineConfig {
        follow_redirects: false,
        ..Default::default()
    });
    engine.navigate("http://test.local/old").unwrap();
    assert_eq!(engine.response().unwrap().status, 301);
    assert_eq!(mock.requests().len(), 1);
}

#[test]
fn test_redirect_chain_stops_at_limit() {
    let mock = site();
    let mut engine = mock.engine_with(EngineConfig {
        max_redirects: 2,
        ..Default::default()
    });
    engine.navigate("http://test.local/loop1").unwrap();

    assert_eq!(mock.requests().len(), 3);
    assert_eq!(engine.uri().unwrap().path(), "/loop3");
    assert_eq!(engine.response().unwrap().status, 302);
}

#[test]
fn test_post_redirect_continues_with_get() {
    let mock = site();
    mock.route("http://test.local/save", MockResponse::redirect(302, "/other"));
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();
    engine
        .navigate_with(
            Navigation::to("/save")
                .method("POST")
                .payload(RequestDictionary::new().with("title", "draft")),
        )
        .unwrap();

    let requests = mock.requests();
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[1].body.as_deref(), Some("title=draft"));
    assert_eq!(requests[2].method, Method::Get);
    assert_eq!(requests[2].body, None);
    assert_eq!(engine.history().get(1).unwrap().payload.get("title"), Some("draft"));
}

#[test]
fn test_transport_failure_leaves_state_intact() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();

    let err = engine.navigate("/unrouted").unwrap_err();
    match &err {
        Error::InvalidUri { uri, source, .. } => {
            assert_eq!(uri, "http://test.local/unrouted");
            assert!(source.is_some());
        }
        other => panic!("expected InvalidUri, got {other:?}"),
    }
    assert!(std::error::Error::source(&err).is_some());

    assert_eq!(engine.uri().unwrap().path(), "/");
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.select("h1").unwrap().inner_text(), "Home");
}

#[test]
fn test_failure_mid_redirect_is_atomic() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();

    assert!(engine.navigate("/broken").is_err());
    assert_eq!(mock.requests().len(), 3);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.response().unwrap().status, 200);

    // Still usable afterwards
    engine.navigate("/other").unwrap();
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn test_unsupported_scheme_and_method() {
    let mock = site();
    let mut engine = mock.engine();
    assert!(matches!(
        engine.navigate("ftp://test.local/file"),
        Err(Error::InvalidUri { .. })
    ));
    assert!(matches!(
        engine.navigate_with(Navigation::to("http://test.local/").method("PATCH")),
        Err(Error::UnsupportedMethod(_))
    ));
    assert!(mock.requests().is_empty());
}

#[test]
fn test_not_modified_keeps_document_and_sends_validators() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();
    engine.navigate("/cached").unwrap();

    assert_eq!(mock.last_request().header("If-None-Match"), Some("\"home-v1\""));
    assert_eq!(engine.response().unwrap().status, 304);
    assert_eq!(engine.select("h1").unwrap().inner_text(), "Home");
}

#[test]
fn test_bodiless_response_clears_document() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/").unwrap();
    engine.navigate("/empty").unwrap();

    assert!(engine.document().is_none());
    assert!(engine.select("h1").unwrap().is_empty());
}

#[test]
fn test_reparse_is_idempotent() {
    let mock = site();
    let mut engine = mock.engine();
    engine.navigate("http://test.local/other").unwrap();
    let first = engine.document().cloned().unwrap();

    engine.select("h1").unwrap().set_text("mutated").unwrap();
    engine.navigate("http://test.local/other").unwrap();
    let second = engine.document().cloned().unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_output_sink_receives_exchanges() {
    let mock = site();
    let mut engine = mock.engine();
    let output = SharedBuffer::default();
    engine.set_output(output.clone());
    engine.navigate("http://test.local/old").unwrap();

    let trace = output.contents();
    assert!(trace.contains("[Request] GET /old HTTP/1.1\nHost: test.local\n"), "{trace}");
    assert!(trace.contains("[Response] HTTP/1.1 301\nLocation: /other\n"), "{trace}");
    assert!(trace.contains("[Request] GET /other HTTP/1.1"), "{trace}");
    assert!(trace.contains("<h1>Other</h1>"), "{trace}");
}

#[test]
fn test_config_credentials_seed_the_session() {
    let mock = site();
    let mut engine = mock.engine_with(EngineConfig {
        credentials: Some(Credentials::new("alice", "secret")),
        proxy: Some(Proxy::new("http://proxy.local:3128")),
        user_agent: "strider-test".to_string(),
        ..Default::default()
    });
    engine.navigate("http://test.local/").unwrap();
    engine.navigate("/other").unwrap();

    for request in mock.requests() {
        assert_eq!(request.credentials, Some(Credentials::new("alice", "secret")));
        assert_eq!(request.proxy, Some(Proxy::new("http://proxy.local:3128")));
        assert_eq!(request.header("User-Agent"), Some("strider-test"));
    }
}

#[test]
fn test_navigation_credentials_override() {
    let mock = site();
    let mut engine = mock.engine_with(EngineConfig {
        credentials: Some(Credentials::new("alice", "secret")),
        ..Default::default()
    });
    engine.navigate("http://test.local/").unwrap();
    engine
        .navigate_with(Navigation::to("/other").credentials(Credentials::new("bob", "pw")))
        .unwrap();
    engine.navigate("/").unwrap();

    let requests = mock.requests();
    assert_eq!(requests[1].credentials, Some(Credentials::new("bob", "pw")));
    assert_eq!(requests[2].credentials, Some(Credentials::new("bob", "pw")));
}

#[test]
fn test_default_user_agent() {
    let config = EngineConfig::default();
    assert!(config.user_agent.starts_with("strider/"));
    assert_eq!(config.max_redirects, 10);
    assert!(config.follow_redirects);
}
