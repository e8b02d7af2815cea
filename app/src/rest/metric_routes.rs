use super::build_response;
use super::doc_routes::paths;
use crate::observer::ConcurrentObserver;
use std::sync::Arc;
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes(
    observer: &Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(observer.clone())
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(dto::HealthyDto)),
    tags((name = "metric", description = "Service health"))
)]
struct MetricApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = MetricApi::openapi();
    doc.paths = paths(
        "metric",
        &[(PathItemType::Get, "/api/health", "Database and control proxy state")],
    );
    doc
}

fn health(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "health"))
        .and_then(|observer: Arc<ConcurrentObserver>| async move {
            let ret = dto::HealthyDto {
                healthy: true,
                database_state: observer.check_db().await,
                control_proxy: observer.control_reachable().await,
                auto_control: observer.is_auto_control_enabled(),
                log_count: observer.logs.len(),
            };
            build_response(Ok(ret))
        })
        .boxed()
}

mod dto {
    use serde::Serialize;
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, ToSchema)]
    pub struct HealthyDto {
        pub healthy: bool,
        pub database_state: String,
        pub control_proxy: bool,
        pub auto_control: bool,
        pub log_count: usize,
    }
}
