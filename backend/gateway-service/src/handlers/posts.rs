/// Post handlers - HTTP endpoints for the submit and list calls
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{client_origin, AuthenticatedUser};
use crate::models::Post;
use crate::services::PostGateway;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPostRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    /// Arbitrary additional payload fields, stored with the post as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPostResponse {
    pub success: bool,
    pub post_id: Uuid,
    pub remaining_user: i64,
    pub remaining_origin: i64,
}

/// Create a new post
/// POST /api/v1/posts
pub async fn submit_post(
    gateway: web::Data<PostGateway>,
    user: AuthenticatedUser,
    http_req: HttpRequest,
    req: web::Json<SubmitPostRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let origin = client_origin(&http_req);
    let body = req.into_inner();

    let outcome = gateway
        .submit(
            user.0,
            &origin,
            &body.name,
            &body.category,
            serde_json::Value::Object(body.extra),
        )
        .await?;

    Ok(HttpResponse::Created().json(SubmitPostResponse {
        success: true,
        post_id: outcome.post.id,
        remaining_user: outcome.remaining_user,
        remaining_origin: outcome.remaining_origin,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQueryParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsResponse {
    pub success: bool,
    pub items: Vec<Post>,
    pub has_more: bool,
    pub cursor: Option<String>,
}

/// List available posts, newest first
/// GET /api/v1/posts
pub async fn list_posts(
    gateway: web::Data<PostGateway>,
    http_req: HttpRequest,
    query: web::Query<ListQueryParams>,
) -> Result<HttpResponse> {
    let origin = client_origin(&http_req);

    let page = gateway
        .list(&origin, query.cursor.as_deref(), query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(ListPostsResponse {
        success: true,
        items: page.items,
        has_more: page.has_more,
        cursor: page.cursor,
    }))
}
