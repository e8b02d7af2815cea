use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warp::Filter;

/// Starts an in-process control proxy. `failures` requests to
/// `/flaky` fail before it succeeds.
async fn spawn_proxy(failures: usize) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));

    let stft = warp::path!("stft")
        .and(warp::post())
        .and(warp::header::<String>("x-auto-control"))
        .map(|auto: String| {
            warp::reply::json(&serde_json::json!({
                "status": "success",
                "message": format!("fan on, auto={}", auto)
            }))
        });
    let speed = warp::path!("setFanSpeed" / u8)
        .and(warp::post())
        .map(|speed: u8| {
            warp::reply::json(&serde_json::json!({
                "status": "success",
                "message": format!("speed {}", speed)
            }))
        });
    let rejected = warp::path!("stpt").and(warp::post()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "error",
            "message": "device offline"
        }))
    });
    let flaky_calls = calls.clone();
    let flaky = warp::path!("flaky").and(warp::post()).map(move || {
        let call = flaky_calls.fetch_add(1, Ordering::SeqCst);
        if call < failures {
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({"status": "error"})),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            )
        } else {
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({"status": "success"})),
                warp::http::StatusCode::OK,
            )
        }
    });
    let index = warp::path::end()
        .and(warp::get())
        .map(|| "Control proxy is running");

    let routes = stft.or(speed).or(rejected).or(flaky).or(index);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    (format!("http://{}", addr), calls)
}

fn build_client(base_url: &str, retries: usize) -> ControlClient {
    ControlClient::new(base_url, Duration::from_secs(2), retries).unwrap()
}

#[tokio::test]
async fn test_switch_sends_auto_header() {
    // Prepare
    let (url, _) = spawn_proxy(0).await;
    let client = build_client(&url, 3);

    // Execute
    let resp = client.switch(Device::Fan, true, true).await.unwrap();

    // Validate
    assert!(resp.is_success());
    assert_eq!(resp.message, "fan on, auto=true");
    assert!(client.base_url().ends_with('/'));
}

#[tokio::test]
async fn test_set_speed() {
    let (url, _) = spawn_proxy(0).await;
    let client = build_client(&url, 1);

    let resp = client.set_speed(Device::Fan, 80, false).await.unwrap();
    assert_eq!(resp.message, "speed 80");

    let err = client.set_speed(Device::GrowLight, 80, false).await;
    assert!(matches!(err, Err(ControlError::Path(_))));
}

#[tokio::test]
async fn test_rejected_command() {
    let (url, _) = spawn_proxy(0).await;
    let client = build_client(&url, 2);

    let res = client.switch(Device::Pump, true, false).await;

    match res {
        Err(ControlError::Rejected(msg)) => assert_eq!(msg, "device offline"),
        other => panic!("Unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn test_retries_until_success() {
    // Prepare
    let (url, calls) = spawn_proxy(2).await;
    let client = build_client(&url, 3);

    // Execute
    let res = client.send("flaky", true).await;

    // Validate
    assert!(res.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_gives_up_after_retries() {
    let (url, calls) = spawn_proxy(5).await;
    let client = build_client(&url, 3);

    let res = client.send("flaky", true).await;

    assert!(matches!(res, Err(ControlError::Status(500))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unreachable_proxy() {
    let client = build_client("http://127.0.0.1:1", 2);

    assert!(matches!(
        client.switch(Device::Fan, false, false).await,
        Err(ControlError::Network(_))
    ));
    assert!(!client.health().await);
}

#[tokio::test]
async fn test_forward_and_health() {
    let (url, _) = spawn_proxy(0).await;
    let client = build_client(&url, 1);

    let resp = client
        .forward(reqwest::Method::POST, "/setFanSpeed/40", b"{}".to_vec(), false)
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    let body: ControlResponse = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(body.message, "speed 40");

    let missing = client
        .forward(reqwest::Method::POST, "unknown", Vec::new(), false)
        .await
        .unwrap();
    assert_eq!(missing.status, 404);

    let wrong_method = client
        .forward(reqwest::Method::GET, "stft", Vec::new(), false)
        .await
        .unwrap();
    assert_eq!(wrong_method.status, 405);

    assert!(client
        .forward(reqwest::Method::GET, "../etc/passwd", Vec::new(), false)
        .await
        .is_err());
    assert!(client.health().await);
}

#[tokio::test]
async fn test_forward_stays_below_base_path() {
    // Prepare
    let (url, _) = spawn_proxy(0).await;
    let client = build_client(&format!("{}/api", url), 1);

    for path in [
        "%2e%2e/etc/passwd",
        "%2E%2E/stft",
        "a/.%2e/../../stft",
        "http://example.com/stft",
    ]
    .iter()
    {
        // Execute
        let res = client
            .forward(reqwest::Method::POST, path, Vec::new(), false)
            .await;

        // Validate
        assert!(matches!(res, Err(ControlError::Path(_))), "{}", path);
    }
}

#[test]
fn test_is_auto_control() {
    assert!(is_auto_control(Some("true")));
    assert!(is_auto_control(Some("TRUE")));
    assert!(!is_auto_control(Some("false")));
    assert!(!is_auto_control(None));
}
