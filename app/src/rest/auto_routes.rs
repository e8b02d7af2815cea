use super::build_response;
use super::doc_routes::paths;
use crate::observer::{AutoControl, AutoControlObserver};
use agri_core::control::AutoControlSettings;
use agri_core::LogEntry;
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes(
    observer: &AutoControlObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_auto_control(observer.clone())
        .or(set_auto_control(observer.clone()))
        .or(run_auto_control(observer.clone()))
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(AutoControl, AutoControlSettings, LogEntry)),
    tags((name = "autoControl", description = "Server side automatic control"))
)]
struct AutoControlApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = AutoControlApi::openapi();
    doc.paths = paths(
        "autoControl",
        &[
            (PathItemType::Get, "/api/autoControl", "Enabled flag and thresholds"),
            (PathItemType::Put, "/api/autoControl", "Replace enabled flag and thresholds"),
            (PathItemType::Post, "/api/autoControl/run", "Evaluate all devices now"),
        ],
    );
    doc
}

/// GET api/autoControl
fn get_auto_control(
    observer: AutoControlObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "autoControl"))
        .and_then(|observer: AutoControlObserver| async move {
            build_response(Ok(observer.get()))
        })
        .boxed()
}

/// PUT api/autoControl
///
/// Replaces the settings, rejects them as a whole if one is invalid
fn set_auto_control(
    observer: AutoControlObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::put())
        .and(warp::path!("api" / "autoControl"))
        .and(warp::body::content_length_limit(4096))
        .and(warp::body::json())
        .and_then(
            |observer: AutoControlObserver, body: AutoControl| async move {
                build_response(observer.update(body))
            },
        )
        .boxed()
}

/// POST api/autoControl/run
///
/// Evaluates all devices once, even if the loop is disabled
///
/// Returns the written log entries
fn run_auto_control(
    observer: AutoControlObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path!("api" / "autoControl" / "run"))
        .and_then(|observer: AutoControlObserver| async move {
            let entries = observer.run().await;
            build_response(Ok(entries))
        })
        .boxed()
}
