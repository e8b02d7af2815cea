use crate::config::CONFIG;
use crate::control::AUTO_CONTROL_HEADER;
use crate::error::ObserverError;
use crate::observer::{
    AutoControlObserver, ConcurrentObserver, DataObserver, DeviceObserver, LogObserver,
    ThresholdObserver,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::{Filter, Reply};

mod auth_routes;
mod auto_routes;
mod data_routes;
mod device_routes;
mod doc_routes;
mod history_routes;
mod log_routes;
mod metric_routes;
mod proxy_routes;
mod query;
mod threshold_routes;

#[cfg(test)]
mod test;

pub fn build_response<T: serde::Serialize>(
    resp: Result<T, ObserverError>,
) -> Result<warp::reply::Response, warp::Rejection> {
    match resp {
        Ok(data) => Ok(warp::reply::json(&data).into_response()),
        Err(ObserverError::User(err)) => {
            warn!("{}", err);
            let dto = dto::ErrorResponseDto {
                error: err.to_string(),
            };
            Ok(warp::reply::with_status(warp::reply::json(&dto), StatusCode::BAD_REQUEST)
                .into_response())
        }
        Err(ObserverError::Unauthorized(err)) => {
            warn!("{}", err);
            let dto = dto::StatusResponseDto::error(err.to_string());
            Ok(warp::reply::with_status(warp::reply::json(&dto), StatusCode::UNAUTHORIZED)
                .into_response())
        }
        Err(ObserverError::Internal(err)) => {
            error!("{}", err);
            let dto = dto::ErrorResponseDto {
                error: err.to_string(),
            };
            Ok(warp::reply::with_status(
                warp::reply::json(&dto),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
    }
}

/// Download response for an exported table
pub fn csv_response(filename: &str, body: String) -> warp::reply::Response {
    let reply = warp::reply::with_header(body, "content-type", "text/csv; charset=utf-8");
    warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{}\"", filename),
    )
    .into_response()
}

pub fn routes(
    observer: &Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let data = DataObserver::new(observer.clone());
    let device = DeviceObserver::new(observer.clone());
    let auto_control = AutoControlObserver::new(observer.clone());
    let thresholds = ThresholdObserver::new(observer.clone());
    let logs = LogObserver::new(observer.clone());

    let api = data_routes::routes(&data)
        .or(history_routes::routes(&data))
        .or(device_routes::routes(&device))
        .or(auth_routes::routes())
        .or(auto_routes::routes(&auto_control))
        .or(threshold_routes::routes(&thresholds))
        .or(log_routes::routes(&logs))
        .or(metric_routes::routes(observer))
        .or(doc_routes::doc(vec![
            data_routes::api_doc(),
            history_routes::api_doc(),
            device_routes::api_doc(),
            auth_routes::api_doc(),
            auto_routes::api_doc(),
            threshold_routes::api_doc(),
            log_routes::api_doc(),
            metric_routes::api_doc(),
        ]));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization", AUTO_CONTROL_HEADER])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"]);

    api.or(proxy_routes::routes(&device))
        .or(static_files(CONFIG.static_dir()))
        .with(cors)
        .with(warp::trace::request())
}

/// Serves a pre-built frontend, unknown paths get its index page
fn static_files(static_dir: Option<String>) -> BoxedFilter<(warp::fs::File,)> {
    match static_dir {
        Some(dir) => {
            let index = Path::new(&dir).join("index.html");
            warp::get()
                .and(warp::fs::dir(dir).or(warp::fs::file(index)).unify())
                .boxed()
        }
        None => warp::any()
            .and_then(|| async { Err::<warp::fs::File, _>(warp::reject::not_found()) })
            .boxed(),
    }
}

/// Serves the api until the shutdown signal fires
pub async fn dispatch_server_daemon(
    observer: Arc<ConcurrentObserver>,
    addr: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), warp::Error> {
    let routes = routes(&observer);
    let (addr, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown(addr, async move {
            let _ = shutdown.changed().await;
        })?;

    info!("Starting webserver at: {}", addr);
    server.await;
    info!("Webserver stopped");
    Ok(())
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct ErrorResponseDto {
        pub error: String,
    }

    /// Shape the dashboard expects from setter and login calls
    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct StatusResponseDto {
        pub status: String,
        pub message: String,
    }

    impl StatusResponseDto {
        pub fn success<S: Into<String>>(message: S) -> Self {
            StatusResponseDto {
                status: "success".to_owned(),
                message: message.into(),
            }
        }

        pub fn error<S: Into<String>>(message: S) -> Self {
            StatusResponseDto {
                status: "error".to_owned(),
                message: message.into(),
            }
        }
    }
}
