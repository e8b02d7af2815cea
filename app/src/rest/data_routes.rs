use super::build_response;
use super::doc_routes::paths;
use crate::observer::DataObserver;
use agri_core::{CnsRecord, Dataset, Dns2Record, DnsRecord, EnsRecord};
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes(
    observer: &DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    latest(observer.clone(), "AgriculturalTestingDatas", Dataset::Dns)
        .or(latest(observer.clone(), "AgriculturalTestingDatas_2", Dataset::Dns2))
        .or(latest(observer.clone(), "Agri-environmentDatas", Dataset::Ens))
        .or(latest_control(observer.clone()))
        .or(fallback_data(observer.clone()))
        .or(generate_mock_data(observer.clone()))
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(DnsRecord, Dns2Record, CnsRecord, EnsRecord, Dataset, dto::MockDataDto)),
    tags((name = "data", description = "Latest node readings"))
)]
struct DataApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = DataApi::openapi();
    doc.paths = paths(
        "data",
        &[
            (PathItemType::Get, "/api/AgriculturalTestingDatas", "Latest indoor climate reading"),
            (PathItemType::Get, "/api/AgriculturalTestingDatas_2", "Latest soil reading"),
            (PathItemType::Get, "/api/AgriculturalControlDatas", "Latest actuator state"),
            (PathItemType::Get, "/api/Agri-environmentDatas", "Latest outdoor reading"),
            (PathItemType::Get, "/api/fallbackData/{type}", "Mock row of a dataset"),
            (PathItemType::Get, "/api/generateMockData", "Insert one mock row per table"),
        ],
    );
    doc
}

/// GET api/:name
///
/// Latest reading of a node table
///
/// Returns a list with exactly one row, the mock row if the
/// database has none or cannot be reached
fn latest(
    observer: DataObserver,
    name: &'static str,
    dataset: Dataset,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path("api"))
        .and(warp::path(name))
        .and(warp::path::end())
        .and_then(move |observer: DataObserver| async move {
            let records = observer.latest(dataset).await;
            build_response(Ok(records))
        })
        .boxed()
}

/// GET api/AgriculturalControlDatas
///
/// Latest actuator state, removes incomplete rows first
fn latest_control(
    observer: DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "AgriculturalControlDatas"))
        .and_then(|observer: DataObserver| async move {
            let records = observer.latest_control().await;
            build_response(Ok(records))
        })
        .boxed()
}

/// GET api/fallbackData/:type
///
/// Returns the mock row of `dns`, `dns2`, `cns` or `ens`,
/// an empty list for anything else
fn fallback_data(
    observer: DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "fallbackData" / String))
        .and_then(|observer: DataObserver, dataset: String| async move {
            build_response(Ok(observer.fallback(&dataset)))
        })
        .boxed()
}

/// GET api/generateMockData
///
/// Inserts one mock row per table, always succeeds
fn generate_mock_data(
    observer: DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "generateMockData"))
        .and_then(|observer: DataObserver| async move {
            let inserted = observer.generate_mock().await;
            build_response(Ok(dto::MockDataDto {
                success: true,
                message: "模拟数据生成请求已处理".to_owned(),
                inserted,
            }))
        })
        .boxed()
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct MockDataDto {
        pub success: bool,
        pub message: String,
        pub inserted: usize,
    }
}
