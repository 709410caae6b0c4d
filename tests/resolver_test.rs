//! Resolver fallback behaviour against mock lookup services.

use serde_json::json;
use std::time::Duration;
use tokloader::extractor::{Resolver, ResolverEndpoint, SourceTag};
use tokloader::utils::config::DEFAULT_USER_AGENT;
use tokloader::utils::{AppSettings, ResolutionError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LINK: &str = "https://www.tiktok.com/@u/video/1";

/// Settings whose endpoints all live on `server`, in the given order
fn settings_for(server: &MockServer, endpoints: &[(SourceTag, &str)]) -> AppSettings {
    AppSettings {
        endpoints: endpoints
            .iter()
            .map(|(tag, route)| {
                ResolverEndpoint::new(*tag, format!("{}{}?url={{url}}", server.uri(), route))
            })
            .collect(),
        resolver_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

fn video_payload(url: &str) -> serde_json::Value {
    json!({"code": 0, "data": {"id": "1", "title": "T", "play": url}})
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn invalid_reference_makes_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/v.mp4")))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a"), (SourceTag::Tiklydown, "/b")]);
    let resolver = Resolver::from_settings(&settings).unwrap();

    let err = resolver
        .resolve("https://www.instagram.com/p/abc")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::InvalidReference(_)));

    let err = resolver.resolve("").await.unwrap_err();
    assert_eq!(err, ResolutionError::MissingReference);

    assert!(requested_paths(&server).await.is_empty());
}

#[tokio::test]
async fn timed_out_endpoint_falls_through_to_next() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(video_payload("http://x/slow.mp4"))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/b.mp4")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/c.mp4")))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_for(
        &server,
        &[
            (SourceTag::Tikwm, "/a"),
            (SourceTag::Tiklydown, "/b"),
            (SourceTag::Tikwm, "/c"),
        ],
    );
    let resolver = Resolver::from_settings(&settings).unwrap();

    let record = resolver.resolve(LINK).await.unwrap();
    assert_eq!(record.source_tag, SourceTag::Tiklydown);
    assert_eq!(record.qualities[0].url, "http://x/b.mp4");
    assert_eq!(requested_paths(&server).await, vec!["/a", "/b"]);
}

#[tokio::test]
async fn error_status_falls_through_to_next() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/b.mp4")))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a"), (SourceTag::Tiklydown, "/b")]);
    let resolver = Resolver::from_settings(&settings).unwrap();

    let record = resolver.resolve(LINK).await.unwrap();
    assert_eq!(record.source_tag, SourceTag::Tiklydown);
}

#[tokio::test]
async fn first_success_skips_remaining_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/a.mp4")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/b.mp4")))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a"), (SourceTag::Tiklydown, "/b")]);
    let resolver = Resolver::from_settings(&settings).unwrap();

    let record = resolver.resolve(LINK).await.unwrap();
    assert_eq!(record.source_tag, SourceTag::Tikwm);
    assert_eq!(record.qualities[0].url, "http://x/a.mp4");
}

#[tokio::test]
async fn all_failed_carries_last_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": -1, "msg": "Url parsing is failed!"})),
        )
        .mount(&server)
        .await;

    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a"), (SourceTag::Tiklydown, "/b")]);
    let resolver = Resolver::from_settings(&settings).unwrap();
    let err = resolver.resolve(LINK).await.unwrap_err();
    assert_eq!(
        err,
        ResolutionError::AllSourcesFailed {
            last_error: "No data from API".to_string()
        }
    );

    // Same endpoints, reversed: the transport failure is now the last one
    let settings = settings_for(&server, &[(SourceTag::Tiklydown, "/b"), (SourceTag::Tikwm, "/a")]);
    let resolver = Resolver::from_settings(&settings).unwrap();
    let err = resolver.resolve(LINK).await.unwrap_err();
    assert_eq!(
        err,
        ResolutionError::AllSourcesFailed {
            last_error: "Request failed with status code 503".to_string()
        }
    );
}

#[tokio::test]
async fn shape_failures_report_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "1", "title": "T"}})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let no_data = ResolutionError::AllSourcesFailed {
        last_error: "No data from API".to_string(),
    };

    // Non-JSON body is the last failure
    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a"), (SourceTag::Tiklydown, "/b")]);
    let resolver = Resolver::from_settings(&settings).unwrap();
    assert_eq!(resolver.resolve(LINK).await.unwrap_err(), no_data);

    // Payload without a playable URL is the last failure
    let settings = settings_for(&server, &[(SourceTag::Tiklydown, "/b"), (SourceTag::Tikwm, "/a")]);
    let resolver = Resolver::from_settings(&settings).unwrap();
    assert_eq!(resolver.resolve(LINK).await.unwrap_err(), no_data);
}

#[tokio::test]
async fn timeout_reason_names_the_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(video_payload("http://x/slow.mp4"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a")]);
    let resolver = Resolver::from_settings(&settings).unwrap();

    assert_eq!(
        resolver.resolve(LINK).await.unwrap_err(),
        ResolutionError::AllSourcesFailed {
            last_error: "timeout of 500ms exceeded".to_string()
        }
    );
}

#[tokio::test]
async fn request_carries_encoded_reference_and_browser_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .and(query_param("url", LINK))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_payload("http://x/v.mp4")))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server, &[(SourceTag::Tikwm, "/a")]);
    let resolver = Resolver::from_settings(&settings).unwrap();

    let record = resolver.resolve(LINK).await.unwrap();
    assert_eq!(record.id, "1");
    assert_eq!(record.title, "T");
}
