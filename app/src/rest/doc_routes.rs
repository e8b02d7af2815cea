use utoipa::openapi::path::{OperationBuilder, PathItemType, Paths, PathsBuilder};
use utoipa::openapi::schema::ComponentsBuilder;
use utoipa::openapi::tag::Tag;
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder, Response};
use warp::Filter;

/// Documents endpoints of one tag, every endpoint answers with json
pub fn paths(tag: &str, endpoints: &[(PathItemType, &str, &str)]) -> Paths {
    let mut paths = PathsBuilder::new().build();
    for (method, path, summary) in endpoints.iter() {
        let operation = OperationBuilder::new()
            .tag(tag)
            .summary(Some(*summary))
            .response("200", Response::new("Success"))
            .build();
        paths
            .paths
            .entry((*path).to_owned())
            .or_default()
            .operations
            .insert(method.clone(), operation);
    }
    paths
}

/// GET api/doc/api.json
///
/// Serves the merged OpenAPI document of all route modules
pub fn doc(
    mut spec_defs: Vec<OpenApi>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let info = InfoBuilder::new()
        .title("agri")
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some("Smart agriculture dashboard api"))
        .build();
    let mut tags: Vec<Tag> = Vec::new();
    let mut paths = PathsBuilder::new();
    let mut components = ComponentsBuilder::new();

    for spec in spec_defs.drain(..) {
        if let Some(spec_tags) = spec.tags {
            tags.extend(spec_tags);
        }
        for (key, value) in spec.paths.paths.into_iter() {
            paths = paths.path(key, value);
        }
        if let Some(spec_components) = spec.components {
            for (key, value) in spec_components.schemas.into_iter() {
                components = components.schema(key, value);
            }
        }
    }

    let merged_api = OpenApiBuilder::new()
        .info(info)
        .tags(Some(tags))
        .paths(paths.build())
        .components(Some(components.build()))
        .build();

    warp::path!("api" / "doc" / "api.json")
        .and(warp::get())
        .map(move || warp::reply::json(&merged_api))
        .boxed()
}
