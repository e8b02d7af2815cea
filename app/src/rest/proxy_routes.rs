use super::build_response;
use super::dto::StatusResponseDto;
use crate::control::{is_auto_control, ForwardedResponse};
use crate::error::{ApiError, ObserverError};
use crate::observer::DeviceObserver;
use tracing::error;
use warp::http::header::{HeaderValue, CONTENT_TYPE};
use warp::http::{Method, StatusCode};
use warp::hyper::body::Bytes;
use warp::path::Tail;
use warp::{Filter, Reply};

pub fn routes(
    observer: &DeviceObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    forward(observer.clone())
}

fn into_reply(forwarded: ForwardedResponse) -> warp::reply::Response {
    let mut resp = warp::reply::Response::new(forwarded.body.into());
    *resp.status_mut() = StatusCode::from_u16(forwarded.status).unwrap_or(StatusCode::BAD_GATEWAY);
    if let Some(content_type) = forwarded
        .content_type
        .and_then(|v| HeaderValue::from_str(&v).ok())
    {
        resp.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    resp
}

/// ANY control/*
///
/// Passes the request through to the control proxy, device
/// commands end up in the system log
///
/// Returns the proxy answer as is, a 500 if the proxy cannot be reached
fn forward(
    observer: DeviceObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let query = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();

    warp::any()
        .map(move || observer.clone())
        .and(warp::method())
        .and(warp::path("control"))
        .and(warp::path::tail())
        .and(query)
        .and(warp::header::optional::<String>("x-auto-control"))
        .and(warp::body::bytes())
        .and_then(
            |observer: DeviceObserver,
             method: Method,
             tail: Tail,
             query: String,
             auto: Option<String>,
             body: Bytes| async move {
                let method = match reqwest::Method::from_bytes(method.as_str().as_bytes()) {
                    Ok(method) => method,
                    Err(_) => {
                        let err = ApiError::InvalidParameter("method", method.to_string());
                        return build_response::<()>(Err(err.into()));
                    }
                };
                let path = if query.is_empty() {
                    tail.as_str().to_owned()
                } else {
                    format!("{}?{}", tail.as_str(), query)
                };
                let auto = is_auto_control(auto.as_deref());

                match observer.forward(method, &path, body.to_vec(), auto).await {
                    Ok(forwarded) => Ok(into_reply(forwarded)),
                    Err(ObserverError::Internal(err)) => {
                        error!("Failed forwarding {}: {}", path, err);
                        let dto = StatusResponseDto::error("控制API请求失败");
                        Ok(warp::reply::with_status(
                            warp::reply::json(&dto),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        )
                        .into_response())
                    }
                    Err(err) => build_response::<()>(Err(err)),
                }
            },
        )
        .boxed()
}
