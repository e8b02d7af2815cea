use super::build_response;
use super::doc_routes::paths;
use crate::observer::auth;
use utoipa::openapi::path::PathItemType;
use utoipa::OpenApi;
use warp::Filter;

pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    login()
}

#[derive(OpenApi)]
#[openapi(
    components(schemas(dto::LoginRequestDto, dto::LoginResponseDto)),
    tags((name = "auth", description = "Dashboard login"))
)]
struct AuthApi;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = AuthApi::openapi();
    doc.paths = paths(
        "auth",
        &[(PathItemType::Post, "/api/login", "Exchange the credentials for the token")],
    );
    doc
}

/// POST api/login
///
/// Checks the single configured account
///
/// Returns the token, or a 401 if the credentials don't match
fn login() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path!("api" / "login"))
        .and(warp::body::content_length_limit(4096))
        .and(warp::body::json())
        .and_then(|body: dto::LoginRequestDto| async move {
            let resp = auth::login(&body.username, &body.password).map(|token| {
                dto::LoginResponseDto {
                    status: "success".to_owned(),
                    token,
                }
            });
            build_response(resp)
        })
        .boxed()
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct LoginRequestDto {
        #[serde(default)]
        pub username: String,
        #[serde(default)]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct LoginResponseDto {
        pub status: String,
        pub token: String,
    }
}
