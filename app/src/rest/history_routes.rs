use super::doc_routes::paths;
use super::query::HistoryQuery;
use super::{build_response, csv_response};
use crate::error::ObserverError;
use crate::observer::DataObserver;
use agri_core::Dataset;
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes(
    observer: &DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    history(observer.clone()).or(history_csv(observer.clone()))
}

#[derive(OpenApi)]
#[openapi(tags((name = "history", description = "Stored rows of a node table")))]
struct HistoryApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = HistoryApi::openapi();
    doc.paths = paths(
        "history",
        &[
            (PathItemType::Get, "/api/history/{dataset}", "Newest rows, ?limit= up to 500"),
            (PathItemType::Get, "/api/history/{dataset}/csv", "Newest rows as CSV"),
        ],
    );
    doc
}

fn parse_dataset(dataset: &str) -> Result<Dataset, ObserverError> {
    Ok(dataset.parse::<Dataset>()?)
}

/// GET api/history/:dataset?limit=
///
/// Returns the newest rows of `dns`, `dns2`, `cns` or `ens`.
/// There is no fallback, a database error is a 500.
fn history(
    observer: DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "history" / String))
        .and(warp::query::<HistoryQuery>())
        .and_then(
            |observer: DataObserver, dataset: String, query: HistoryQuery| async move {
                let resp = match parse_dataset(&dataset) {
                    Ok(dataset) => observer.history(dataset, query.limit()).await,
                    Err(e) => Err(e),
                };
                build_response(resp)
            },
        )
        .boxed()
}

/// GET api/history/:dataset/csv?limit=
///
/// Same rows as a CSV download, the column names form the header
fn history_csv(
    observer: DataObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "history" / String / "csv"))
        .and(warp::query::<HistoryQuery>())
        .and_then(
            |observer: DataObserver, dataset: String, query: HistoryQuery| async move {
                let dataset = match parse_dataset(&dataset) {
                    Ok(dataset) => dataset,
                    Err(e) => return build_response::<()>(Err(e)),
                };
                match observer.history_csv(dataset, query.limit()).await {
                    Ok(csv) => Ok(csv_response(&format!("{}.csv", dataset), csv)),
                    Err(e) => build_response::<()>(Err(e)),
                }
            },
        )
        .boxed()
}
