//! Emergency contact handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use common::models::{MAX_CONTACTS, NewContact, User};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{ContactListResponse, ContactResponse, CreateContactRequest, MessageResponse},
    repositories::is_unique_violation,
    state::AppState,
    validation::{validate_contact_name, validate_email},
};

pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<ContactListResponse>> {
    let contacts = state
        .contact_repository
        .list(user.id)
        .await
        .map_err(|e| {
            error!("Failed to list contacts: {}", e);
            ApiError::internal()
        })?;

    let can_add_more = contacts.len() < MAX_CONTACTS;
    Ok(Json(ContactListResponse {
        contacts,
        max_contacts: MAX_CONTACTS,
        can_add_more,
    }))
}

fn contact_limit_reached() -> ApiError {
    ApiError::BadRequest(format!(
        "You can add at most {} emergency contacts",
        MAX_CONTACTS
    ))
}

pub async fn create_contact(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_string();
    validate_contact_name(&name).map_err(ApiError::BadRequest)?;
    validate_email(&email).map_err(ApiError::BadRequest)?;

    let contact = state
        .contact_repository
        .create(user.id, &NewContact { name, email })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("This email is already one of your contacts".to_string())
            } else {
                error!("Failed to create contact: {}", e);
                ApiError::internal()
            }
        })?
        .ok_or_else(contact_limit_reached)?;

    info!("User {} added contact {}", user.username, contact.id);
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            contact,
        }),
    ))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let not_found = || ApiError::NotFound("Contact not found".to_string());

    let contact = state
        .contact_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            error!("Failed to get contact: {}", e);
            ApiError::internal()
        })?
        .ok_or_else(not_found)?;
    if contact.user_id != user.id {
        return Err(not_found());
    }

    let deleted = state
        .contact_repository
        .delete(id, user.id)
        .await
        .map_err(|e| {
            error!("Failed to delete contact: {}", e);
            ApiError::internal()
        })?;
    if !deleted {
        return Err(not_found());
    }

    Ok(Json(MessageResponse::ok("Contact deleted")))
}
