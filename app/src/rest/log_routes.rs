use super::doc_routes::paths;
use super::{build_response, csv_response};
use crate::observer::LogObserver;
use agri_core::{LogEntry, LogFilter, LogLevel};
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes(
    observer: &LogObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    list_logs(observer.clone())
        .or(clear_logs(observer.clone()))
        .or(export_logs(observer.clone()))
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(LogEntry, LogLevel, LogFilter, dto::ClearedDto)),
    tags((name = "logs", description = "System log of control actions"))
)]
struct LogApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = LogApi::openapi();
    doc.paths = paths(
        "logs",
        &[
            (PathItemType::Get, "/api/logs", "Entries newest first, filtered by query"),
            (PathItemType::Delete, "/api/logs", "Remove every entry"),
            (PathItemType::Get, "/api/logs/csv", "Entries as CSV"),
        ],
    );
    doc
}

/// GET api/logs?type=&device=&action=&search=&since=
fn list_logs(
    observer: LogObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "logs"))
        .and(warp::query::<LogFilter>())
        .and_then(|observer: LogObserver, filter: LogFilter| async move {
            build_response(Ok(observer.list(&filter)))
        })
        .boxed()
}

/// DELETE api/logs
fn clear_logs(
    observer: LogObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::delete())
        .and(warp::path!("api" / "logs"))
        .and_then(|observer: LogObserver| async move {
            let cleared = observer.clear();
            build_response(Ok(dto::ClearedDto { cleared }))
        })
        .boxed()
}

/// GET api/logs/csv
///
/// Same filters as the listing, timestamps in the configured timezone
fn export_logs(
    observer: LogObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "logs" / "csv"))
        .and(warp::query::<LogFilter>())
        .and_then(|observer: LogObserver, filter: LogFilter| async move {
            let csv = observer.csv(&filter);
            Ok::<_, warp::Rejection>(csv_response("system_logs.csv", csv))
        })
        .boxed()
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct ClearedDto {
        pub cleared: usize,
    }
}
