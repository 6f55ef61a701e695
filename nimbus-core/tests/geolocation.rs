//! IP-based position lookup against a mock lookup service.

use nimbus_core::{
    Coordinates, WidgetError,
    geolocation::{Geolocation, IpLookup, LocationError},
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn lookup_responding(template: ResponseTemplate) -> (MockServer, IpLookup) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(template)
        .mount(&server)
        .await;

    let lookup = IpLookup::new(format!("{}/json/", server.uri()), reqwest::Client::new());
    (server, lookup)
}

#[tokio::test]
async fn success_yields_coordinates() {
    let (_server, lookup) = lookup_responding(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "status": "success", "lat": 51.5072, "lon": -0.1276 })),
    )
    .await;

    assert!(lookup.is_supported());
    assert_eq!(
        lookup.current_position().await.unwrap(),
        Coordinates { latitude: 51.5072, longitude: -0.1276 }
    );
}

#[tokio::test]
async fn failed_lookup_forwards_service_message() {
    let (_server, lookup) = lookup_responding(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "status": "fail", "message": "reserved range" })),
    )
    .await;

    let err = lookup.current_position().await.unwrap_err();
    assert_eq!(err, LocationError::Unavailable("reserved range".into()));
    assert_eq!(WidgetError::from(err), WidgetError::LocationUnavailable("reserved range".into()));
}

#[tokio::test]
async fn success_without_coordinates_is_unavailable() {
    let (_server, lookup) =
        lookup_responding(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .await;

    let err = lookup.current_position().await.unwrap_err();
    assert_eq!(err, LocationError::Unavailable("position unknown".into()));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let (_server, lookup) = lookup_responding(ResponseTemplate::new(500)).await;

    let LocationError::Unavailable(detail) = lookup.current_position().await.unwrap_err() else {
        panic!("expected an unavailable position");
    };
    assert!(detail.contains("500"), "unexpected detail: {detail}");
}

#[tokio::test]
async fn unreadable_body_is_unavailable() {
    let (_server, lookup) =
        lookup_responding(ResponseTemplate::new(200).set_body_string("<html>busy</html>")).await;

    let LocationError::Unavailable(detail) = lookup.current_position().await.unwrap_err() else {
        panic!("expected an unavailable position");
    };
    assert!(detail.starts_with("unreadable lookup response"), "unexpected detail: {detail}");
}
