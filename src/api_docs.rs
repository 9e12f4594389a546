use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::recipes::list_recipes,
        api::recipes::create_recipe,
        api::recipes::update_recipe,
        api::recipes::delete_recipe,
    ),
    tags(
        (name = "recipegram", description = "Recipegram API")
    )
)]
pub struct ApiDoc;
