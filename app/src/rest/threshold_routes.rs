use super::build_response;
use super::doc_routes::paths;
use crate::observer::ThresholdObserver;
use agri_core::threshold::{DataThresholds, MetricRange, MetricRating, Quality};
use std::collections::BTreeMap;
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes(
    observer: &ThresholdObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_thresholds(observer.clone())
        .or(set_thresholds(observer.clone()))
        .or(data_status(observer.clone()))
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(DataThresholds, MetricRange, MetricRating, Quality)),
    tags((name = "thresholds", description = "Best and worst values of every metric"))
)]
struct ThresholdApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = ThresholdApi::openapi();
    doc.paths = paths(
        "thresholds",
        &[
            (PathItemType::Get, "/api/thresholds", "Best and worst value per metric"),
            (PathItemType::Put, "/api/thresholds", "Overwrite the given metrics"),
            (PathItemType::Get, "/api/dataStatus", "Rate the latest readings"),
        ],
    );
    doc
}

/// GET api/thresholds
fn get_thresholds(
    observer: ThresholdObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "thresholds"))
        .and_then(|observer: ThresholdObserver| async move {
            build_response(Ok(observer.get()))
        })
        .boxed()
}

/// PUT api/thresholds
///
/// Overwrites the sent metrics, unknown metrics or `best == worst`
/// reject the whole update
fn set_thresholds(
    observer: ThresholdObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::put())
        .and(warp::path!("api" / "thresholds"))
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and_then(
            |observer: ThresholdObserver, body: BTreeMap<String, MetricRange>| async move {
                build_response(observer.update(body))
            },
        )
        .boxed()
}

/// GET api/dataStatus
///
/// Returns the rating of every metric of the latest readings
fn data_status(
    observer: ThresholdObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "dataStatus"))
        .and_then(|observer: ThresholdObserver| async move {
            build_response(Ok(observer.status().await))
        })
        .boxed()
}
