use axum::Json;
use utoipa::OpenApi;

use crate::routes::{self, blogs, chat, contact, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FairShare API",
        description = "Chat assistant proxy, blog and contact form backend"
    ),
    paths(
        health::wake_up,
        health::health_check,
        chat::create_thread,
        chat::send_message,
        chat::get_history,
        chat::list_threads,
        chat::delete_thread,
        chat::delete_threads,
        chat::set_thread_status,
        blogs::list_published,
        blogs::get_post,
        blogs::admin_list_posts,
        blogs::admin_categories,
        blogs::admin_get_post,
        blogs::admin_create_post,
        blogs::admin_update_post,
        blogs::admin_delete_post,
        blogs::admin_delete_posts,
        contact::test_route,
        contact::submit,
        contact::admin_list_contacts,
        contact::admin_stats,
        contact::admin_get_contact,
        contact::admin_update_contact,
        contact::admin_reply,
        contact::admin_delete_contact,
        contact::admin_delete_contacts,
    ),
    components(schemas(
        routes::MessageResponse,
        routes::BulkDeleteRequest,
        routes::BulkDeleteResponse,
        health::WakeUpResponse,
        health::HealthResponse,
        chat::CreateThreadResponse,
        chat::SendMessageRequest,
        chat::ThreadStatusRequest,
        chat::ThreadStatusResponse,
        blogs::CreatePostRequest,
        blogs::PostCreatedResponse,
        blogs::PostUpdatedResponse,
        contact::SubmitContactRequest,
        contact::SubmitContactResponse,
        contact::ReplyRequest,
        contact::ContactUpdatedResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "chat", description = "Assistant conversations"),
        (name = "chat-admin", description = "Thread administration (x-api-key)"),
        (name = "blogs", description = "Published posts"),
        (name = "blogs-admin", description = "Post management (x-api-key)"),
        (name = "contact", description = "Contact form"),
        (name = "contact-admin", description = "Contact management (x-api-key)"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/chat/message"));
        assert!(doc.paths.paths.contains_key("/api/contact/admin/contacts/{id}/reply"));
        assert!(doc.paths.paths.contains_key("/wake-up"));
    }
}
