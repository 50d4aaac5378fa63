use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use fairshare_persist::{
    Contact, ContactFilter, ContactReply, ContactStats, ContactStatus, ContactUpdate, NewContact,
    Page, PageRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{found, present, removed, BulkDeleteRequest, BulkDeleteResponse, MessageResponse};
use crate::{
    error::{ApiError, ApiResult},
    mailer,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl SubmitContactRequest {
    fn into_new_contact(self) -> ApiResult<NewContact> {
        match (present(self.name), present(self.email), present(self.message)) {
            (Some(name), Some(email), Some(message)) => Ok(NewContact {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                message,
            }),
            _ => Err(ApiError::BadRequest(
                "Name, email, and message are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitContactResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminContactsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<ContactStatus>,
    pub replied: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactUpdatedResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub contact: Contact,
}

#[utoipa::path(
    get,
    path = "/api/contact/test",
    responses(
        (status = 200, description = "Contact routes are mounted", body = MessageResponse)
    ),
    tag = "contact"
)]
pub async fn test_route() -> Json<MessageResponse> {
    Json(MessageResponse::new("Contact routes working"))
}

/// Store a contact-form submission and notify both sides by email
///
/// Emails are sent in the background; a delivery failure never fails the
/// submission.
#[utoipa::path(
    post,
    path = "/api/contact/submit",
    request_body = SubmitContactRequest,
    responses(
        (status = 201, description = "Submission stored", body = SubmitContactResponse),
        (status = 400, description = "Name, email, and message are required")
    ),
    tag = "contact"
)]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitContactRequest>,
) -> ApiResult<(StatusCode, Json<SubmitContactResponse>)> {
    let contact = state.contacts.create_contact(req.into_new_contact()?).await?;
    tracing::info!(contact_id = %contact.id, "Contact form submitted");

    let company = &state.config.email.from_name;
    mailer::send_in_background(
        state.mailer.clone(),
        mailer::contact_confirmation(&contact, company),
    );
    match state.config.mail_admin() {
        Some(admin) => mailer::send_in_background(
            state.mailer.clone(),
            mailer::admin_notification(&contact, admin),
        ),
        None => tracing::warn!("No admin address configured, skipping contact notification"),
    }

    Ok((
        StatusCode::CREATED,
        Json(SubmitContactResponse {
            success: true,
            message: "Contact form submitted successfully".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contact/admin/contacts",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1 (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100 (default: 10)"),
        ("status" = Option<String>, Query, description = "new, in-progress, replied or closed"),
        ("replied" = Option<bool>, Query, description = "Replied flag"),
        ("search" = Option<String>, Query, description = "Case-insensitive text in name, email or message")
    ),
    responses(
        (status = 200, description = "One page of contacts, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "contact-admin"
)]
pub async fn admin_list_contacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminContactsQuery>,
) -> ApiResult<Json<Page<Contact>>> {
    let filter = ContactFilter {
        status: query.status,
        replied: query.replied,
        search: present(query.search),
    };
    let page = PageRequest::new(query.page, query.limit);

    Ok(Json(state.contacts.find_contacts(filter, page).await?))
}

/// Dashboard counters; day and month boundaries are UTC
#[utoipa::path(
    get,
    path = "/api/contact/admin/contacts/stats",
    responses(
        (status = 200, description = "Contact counters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "contact-admin"
)]
pub async fn admin_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<ContactStats>> {
    Ok(Json(state.contacts.contact_stats(Utc::now()).await?))
}

#[utoipa::path(
    get,
    path = "/api/contact/admin/contacts/{id}",
    params(
        ("id" = String, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "The contact"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Contact not found")
    ),
    tag = "contact-admin"
)]
pub async fn admin_get_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    let contact = found(state.contacts.get_contact(&id).await, "Contact")?;
    Ok(Json(contact))
}

#[utoipa::path(
    put,
    path = "/api/contact/admin/contacts/{id}",
    params(
        ("id" = String, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "Contact updated", body = ContactUpdatedResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Contact not found")
    ),
    tag = "contact-admin"
)]
pub async fn admin_update_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<ContactUpdate>,
) -> ApiResult<Json<ContactUpdatedResponse>> {
    let contact = found(state.contacts.update_contact(&id, update).await, "Contact")?;

    Ok(Json(ContactUpdatedResponse {
        message: "Contact updated successfully".to_string(),
        contact,
    }))
}

/// Email a reply to the contact, then record it
///
/// Delivery is awaited; the contact is only marked replied once the mail
/// server accepted the message.
#[utoipa::path(
    post,
    path = "/api/contact/admin/contacts/{id}/reply",
    params(
        ("id" = String, Path, description = "Contact ID")
    ),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply sent", body = MessageResponse),
        (status = 400, description = "Subject and message are required"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Contact not found"),
        (status = 502, description = "Failed to send email")
    ),
    tag = "contact-admin"
)]
pub async fn admin_reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReplyRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (Some(subject), Some(message)) = (present(req.subject), present(req.message)) else {
        return Err(ApiError::BadRequest("Subject and message are required".to_string()));
    };

    let contact = found(state.contacts.get_contact(&id).await, "Contact")?;

    let email = mailer::contact_reply(&contact, &subject, &message, &state.config.email.from_name);
    state.mailer.send(email).await?;

    let reply = ContactReply {
        subject,
        message,
        sent_at: Utc::now(),
    };
    if !state.contacts.record_reply(&contact.id, reply).await? {
        tracing::warn!(contact_id = %contact.id, "Contact removed before the reply could be recorded");
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    tracing::info!(contact_id = %contact.id, "Reply sent");
    Ok(Json(MessageResponse::new("Reply sent successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/contact/admin/contacts/{id}",
    params(
        ("id" = String, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "Contact deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Contact not found")
    ),
    tag = "contact-admin"
)]
pub async fn admin_delete_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    removed(state.contacts.delete_contact(&id).await, "Contact")?;
    Ok(Json(MessageResponse::new("Contact deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/contact/admin/contacts/delete-multiple",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Contacts deleted", body = BulkDeleteResponse),
        (status = 400, description = "Please provide valid contact IDs"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "contact-admin"
)]
pub async fn admin_delete_contacts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let ids = req.validated("Please provide valid contact IDs")?;
    let deleted = state.contacts.delete_contacts(&ids).await?;
    Ok(Json(BulkDeleteResponse::new(deleted, "contacts")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_requires_every_field() {
        let req = SubmitContactRequest {
            name: Some("Ana".into()),
            email: None,
            message: Some("Hi".into()),
        };
        assert!(req.into_new_contact().is_err());
    }

    #[test]
    fn test_submit_trims_name_and_email() {
        let req = SubmitContactRequest {
            name: Some(" Ana ".into()),
            email: Some(" ana@example.com".into()),
            message: Some("Hi".into()),
        };
        let contact = req.into_new_contact().unwrap();
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.email, "ana@example.com");
    }
}
