use super::build_response;
use super::doc_routes::paths;
use super::dto::StatusResponseDto;
use crate::error::ObserverError;
use crate::observer::DeviceObserver;
use agri_core::control::Device;
use tracing::error;
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::http::StatusCode;
use warp::{Filter, Reply};

pub fn routes(
    observer: &DeviceObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    set_status(observer.clone(), "setFanStatus", Device::Fan)
        .or(set_status(observer.clone(), "setLightStatus", Device::GrowLight))
        .or(set_status(observer.clone(), "setPumpStatus", Device::Pump))
        .or(set_speed(observer.clone(), "setFanSpeed", Device::Fan))
        .or(set_speed(observer.clone(), "setPumpSpeed", Device::Pump))
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(StatusResponseDto)),
    tags((name = "device", description = "Actuator state of the control node"))
)]
struct DeviceApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = DeviceApi::openapi();
    doc.paths = paths(
        "device",
        &[
            (PathItemType::Post, "/api/setFanStatus/{status}", "Store fan state, 0 or 1"),
            (PathItemType::Post, "/api/setLightStatus/{status}", "Store grow light state, 0 or 1"),
            (PathItemType::Post, "/api/setPumpStatus/{status}", "Store pump state, 0 or 1"),
            (PathItemType::Post, "/api/setFanSpeed/{speed}", "Store fan speed, 0 to 100"),
            (PathItemType::Post, "/api/setPumpSpeed/{speed}", "Store pump speed, 0 to 100"),
        ],
    );
    doc
}

/// Setter answer, a database failure keeps the `{status, message}` shape
fn setter_response(
    resp: Result<String, ObserverError>,
    failure: String,
) -> Result<warp::reply::Response, warp::Rejection> {
    match resp {
        Ok(message) => build_response(Ok(StatusResponseDto::success(message))),
        Err(ObserverError::Internal(err)) => {
            error!("{}: {}", failure, err);
            Ok(warp::reply::with_status(
                warp::reply::json(&StatusResponseDto::error(failure)),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
        Err(err) => build_response::<()>(Err(err)),
    }
}

/// POST api/:name/:status
///
/// Stores the on/off state of a device, `0` or `1`
fn set_status(
    observer: DeviceObserver,
    name: &'static str,
    device: Device,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path("api"))
        .and(warp::path(name))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and_then(move |observer: DeviceObserver, status: String| async move {
            let resp = observer.set_status(device, &status).await;
            setter_response(resp, format!("更新{}状态失败", device.label()))
        })
        .boxed()
}

/// POST api/:name/:speed
///
/// Stores the speed of the fan or the pump, `0` to `100`
fn set_speed(
    observer: DeviceObserver,
    name: &'static str,
    device: Device,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path("api"))
        .and(warp::path(name))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and_then(move |observer: DeviceObserver, speed: String| async move {
            let resp = observer.set_speed(device, &speed).await;
            setter_response(resp, format!("更新{}速度失败", device.label()))
        })
        .boxed()
}
