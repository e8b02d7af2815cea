use super::*;
use crate::control::ControlClient;
use serde_json::Value;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;

fn build_mocked_observer(control_url: &str) -> Arc<ConcurrentObserver> {
    let db_conn = MySqlPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("mysql://root@127.0.0.1:1/agriculture")
        .unwrap();
    let control = ControlClient::new(control_url, Duration::from_secs(2), 1).unwrap();
    ConcurrentObserver::new(db_conn, control)
}

async fn spawn_proxy() -> String {
    let switch = warp::post()
        .and(warp::path!("stgt"))
        .and(warp::header::<String>("x-auto-control"))
        .map(|auto: String| {
            warp::reply::json(&serde_json::json!({
                "status": "success",
                "message": format!("light on, auto={}", auto)
            }))
        });
    let (addr, server) = warp::serve(switch).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_rest_latest_serves_fallback() {
    // Prepare
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    for (path, device) in [
        ("/api/AgriculturalTestingDatas", "DNS_001"),
        ("/api/AgriculturalTestingDatas_2", "DNS2_001"),
        ("/api/AgriculturalControlDatas", "CNS_001"),
        ("/api/Agri-environmentDatas", "ENS_001"),
    ]
    .iter()
    {
        // Execute
        let res = warp::test::request().path(path).reply(&routes).await;

        // Validate
        assert_eq!(res.status(), 200, "{}", path);
        let body = json_body(res.body());
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["设备号"], *device);
        assert!(rows[0]["上报时间"].as_str().unwrap().len() == 19);
    }
}

#[tokio::test]
async fn test_rest_fallback_data() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request()
        .path("/api/fallbackData/cns")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let body = json_body(res.body());
    assert_eq!(body[0]["生长灯状态"], "1");

    let res = warp::test::request()
        .path("/api/fallbackData/weather")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body()), serde_json::json!([]));
}

#[tokio::test]
async fn test_rest_generate_mock_data() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request()
        .path("/api/generateMockData")
        .reply(&routes)
        .await;

    assert_eq!(res.status(), 200);
    let body = json_body(res.body());
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "模拟数据生成请求已处理");
}

#[tokio::test]
async fn test_rest_setters() {
    // Prepare
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    // Execute
    let invalid_status = warp::test::request()
        .method("POST")
        .path("/api/setFanStatus/2")
        .reply(&routes)
        .await;
    let invalid_speed = warp::test::request()
        .method("POST")
        .path("/api/setPumpSpeed/101")
        .reply(&routes)
        .await;
    let db_down = warp::test::request()
        .method("POST")
        .path("/api/setLightStatus/1")
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(invalid_status.status(), 400);
    assert_eq!(invalid_speed.status(), 400);
    assert_eq!(db_down.status(), 500);
    let body = json_body(db_down.body());
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "更新生长灯状态失败");
}

#[tokio::test]
async fn test_rest_login() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&serde_json::json!({"username": "jdzvua", "password": "Jdzvua123"}))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let body = json_body(res.body());
    assert_eq!(body["status"], "success");
    assert_eq!(body["token"], "simple-auth-token");

    let res = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&serde_json::json!({"username": "jdzvua", "password": "nope"}))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 401);
    let body = json_body(res.body());
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "用户名或密码错误");

    let res = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&serde_json::json!({}))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 401);
    assert_eq!(json_body(res.body())["message"], "用户名或密码错误");
}

#[tokio::test]
async fn test_rest_history() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let unknown = warp::test::request()
        .path("/api/history/weather?limit=5")
        .reply(&routes)
        .await;
    assert_eq!(unknown.status(), 400);

    let db_down = warp::test::request()
        .path("/api/history/dns")
        .reply(&routes)
        .await;
    assert_eq!(db_down.status(), 500);

    let csv_down = warp::test::request()
        .path("/api/history/ens/csv")
        .reply(&routes)
        .await;
    assert_eq!(csv_down.status(), 500);
}

#[tokio::test]
async fn test_rest_auto_control() {
    // Prepare
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    // Execute
    let current = warp::test::request()
        .path("/api/autoControl")
        .reply(&routes)
        .await;
    let mut body = json_body(current.body());
    body["settings"]["idealTemperature"] = serde_json::json!(35.0);
    let rejected = warp::test::request()
        .method("PUT")
        .path("/api/autoControl")
        .json(&body)
        .reply(&routes)
        .await;
    let run = warp::test::request()
        .method("POST")
        .path("/api/autoControl/run")
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(current.status(), 200);
    assert_eq!(body["settings"]["temperatureThreshold"], 28.0);
    assert_eq!(rejected.status(), 400);
    assert_eq!(run.status(), 200);
    let entries = json_body(run.body());
    assert_eq!(entries[0]["action"], "自动控制-未执行");
    assert_eq!(entries[0]["type"], "warning");
}

#[tokio::test]
async fn test_rest_thresholds() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request()
        .path("/api/thresholds")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body())["土壤盐度"]["worst"], 8.0);

    let res = warp::test::request()
        .method("PUT")
        .path("/api/thresholds")
        .json(&serde_json::json!({"土壤盐度": {"best": 4.0, "worst": 4.0}}))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 400);

    let res = warp::test::request()
        .method("PUT")
        .path("/api/thresholds")
        .json(&serde_json::json!({"土壤盐度": {"best": 2.0, "worst": 9.0}}))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body())["土壤盐度"]["best"], 2.0);

    let res = warp::test::request()
        .path("/api/dataStatus")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body()).as_array().unwrap().len(), 14);
}

#[tokio::test]
async fn test_rest_logs() {
    // Prepare
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);
    observer.run_auto_control().await;

    // Execute
    let listed = warp::test::request()
        .path("/api/logs?type=warning")
        .reply(&routes)
        .await;
    let filtered = warp::test::request()
        .path("/api/logs?type=error")
        .reply(&routes)
        .await;
    let csv = warp::test::request()
        .path("/api/logs/csv")
        .reply(&routes)
        .await;
    let cleared = warp::test::request()
        .method("DELETE")
        .path("/api/logs")
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(listed.status(), 200);
    assert_eq!(json_body(listed.body()).as_array().unwrap().len(), 1);
    assert_eq!(json_body(filtered.body()), serde_json::json!([]));
    assert_eq!(csv.status(), 200);
    assert_eq!(
        csv.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    let csv_body = String::from_utf8(csv.body().to_vec()).unwrap();
    assert!(csv_body.starts_with("时间,类型,操作,设备,状态,详情"));
    assert!(csv_body.contains("自动控制-未执行"));
    assert_eq!(json_body(cleared.body())["cleared"], 1);
}

#[tokio::test]
async fn test_rest_health_and_doc() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request().path("/api/health").reply(&routes).await;
    assert_eq!(res.status(), 200);
    let body = json_body(res.body());
    assert_eq!(body["healthy"], true);
    assert_eq!(body["control_proxy"], false);
    assert_ne!(body["database_state"], "healthy");

    let res = warp::test::request()
        .path("/api/doc/api.json")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), 200);
    let doc = json_body(res.body());
    assert!(doc["paths"]["/api/login"]["post"].is_object());
    assert!(doc["paths"]["/api/autoControl"]["put"].is_object());
    assert!(doc["components"]["schemas"]["AutoControlSettings"].is_object());
}

#[tokio::test]
async fn test_rest_control_proxy() {
    // Prepare
    let url = spawn_proxy().await;
    let observer = build_mocked_observer(&url);
    let routes = routes(&observer);

    // Execute
    let res = warp::test::request()
        .method("POST")
        .path("/control/stgt")
        .header("x-auto-control", "true")
        .body("{}")
        .reply(&routes)
        .await;

    // Validate
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body())["message"], "light on, auto=true");
    let entries = observer.logs.list(&Default::default());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "自动控制-生长灯开启");
}

#[tokio::test]
async fn test_rest_control_proxy_unreachable() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request()
        .method("POST")
        .path("/control/stff")
        .reply(&routes)
        .await;

    assert_eq!(res.status(), 500);
    let body = json_body(res.body());
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "控制API请求失败");
    let entries = observer.logs.list(&Default::default());
    assert_eq!(entries[0].action, "手动控制-风扇关闭");
}

#[tokio::test]
async fn test_rest_cors_preflight() {
    let observer = build_mocked_observer("http://127.0.0.1:1");
    let routes = routes(&observer);

    let res = warp::test::request()
        .method("OPTIONS")
        .path("/api/setFanStatus/1")
        .header("origin", "http://localhost:8000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "x-auto-control")
        .reply(&routes)
        .await;

    assert_eq!(res.status(), 200);
}
