use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use fairshare_persist::{NewPost, Page, PageRequest, Post, PostFilter, PostUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{found, present, removed, BulkDeleteRequest, BulkDeleteResponse, MessageResponse};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct AdminPostsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub excerpt: Option<String>,
    pub published: Option<bool>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub slug: Option<String>,
}

impl CreatePostRequest {
    fn into_new_post(self) -> ApiResult<NewPost> {
        let (Some(title), Some(content), Some(category)) =
            (present(self.title), present(self.content), present(self.category))
        else {
            return Err(ApiError::BadRequest(
                "Title, content, and category are required".to_string(),
            ));
        };

        Ok(NewPost {
            title,
            content,
            category,
            excerpt: self.excerpt,
            published: self.published,
            author: present(self.author),
            tags: self.tags.unwrap_or_default(),
            slug: self.slug,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostCreatedResponse {
    pub message: String,
    pub post_id: String,
    #[schema(value_type = Object)]
    pub post: Post,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostUpdatedResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub post: Post,
}

/// Published posts, newest first
#[utoipa::path(
    get,
    path = "/api/blogs",
    responses(
        (status = 200, description = "Published posts")
    ),
    tag = "blogs"
)]
pub async fn list_published(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.list_published().await?))
}

#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(
        ("id" = String, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "The post"),
        (status = 404, description = "Post not found")
    ),
    tag = "blogs"
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let post = found(state.posts.get_post(&id).await, "Post")?;
    Ok(Json(post))
}

/// Paginated listing including drafts
#[utoipa::path(
    get,
    path = "/api/blogs/admin/posts",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1 (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100 (default: 10)"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("search" = Option<String>, Query, description = "Case-insensitive text in title or content")
    ),
    responses(
        (status = 200, description = "One page of posts"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminPostsQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let filter = PostFilter {
        category: present(query.category),
        search: present(query.search),
        published_only: false,
    };
    let page = PageRequest::new(query.page, query.limit);

    Ok(Json(state.posts.find_posts(filter, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/blogs/admin/categories",
    responses(
        (status = 200, description = "Distinct categories, sorted"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_categories(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.posts.categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/blogs/admin/posts/{id}",
    params(
        ("id" = String, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "The post"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let post = found(state.posts.get_post(&id).await, "Post")?;
    Ok(Json(post))
}

#[utoipa::path(
    post,
    path = "/api/blogs/admin/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostCreatedResponse),
        (status = 400, description = "Title, content, and category are required"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_create_post(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostCreatedResponse>)> {
    let post = state.posts.create_post(req.into_new_post()?).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");

    Ok((
        StatusCode::CREATED,
        Json(PostCreatedResponse {
            message: "Post created successfully".to_string(),
            post_id: post.id.clone(),
            post,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/blogs/admin/posts/{id}",
    params(
        ("id" = String, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post updated", body = PostUpdatedResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<PostUpdate>,
) -> ApiResult<Json<PostUpdatedResponse>> {
    let post = found(state.posts.update_post(&id, update).await, "Post")?;

    Ok(Json(PostUpdatedResponse {
        message: "Post updated successfully".to_string(),
        post,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/blogs/admin/posts/{id}",
    params(
        ("id" = String, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    removed(state.posts.delete_post(&id).await, "Post")?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/blogs/admin/posts/delete-multiple",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Posts deleted", body = BulkDeleteResponse),
        (status = 400, description = "Please provide valid post IDs"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "blogs-admin"
)]
pub async fn admin_delete_posts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let ids = req.validated("Please provide valid post IDs")?;
    let deleted = state.posts.delete_posts(&ids).await?;
    Ok(Json(BulkDeleteResponse::new(deleted, "posts")))
}
