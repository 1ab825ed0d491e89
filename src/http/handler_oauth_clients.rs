//! Handles /auth/register - Dynamic OAuth client registration per RFC 7591

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json as ResponseJson, Response},
};

use crate::{
    errors::{ClientRegistrationError, StorageError},
    http::{
        context::AppState,
        middleware_auth::{CurrentTenant, bearer_token, oauth_error_response},
    },
    oauth::{
        permissions::REGISTRATION_TOKEN_AUDIENCE,
        types::{Client, ClientDocument},
    },
    tenant::Tenant,
};

pub async fn register_client_handler(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Json(request): Json<Client>,
) -> Result<(StatusCode, ResponseJson<Client>), ClientRegistrationError> {
    let client = state
        .client_registration_service
        .register(&tenant, request)
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(client)))
}

pub async fn get_client_handler(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> Result<ResponseJson<Client>, Response> {
    let client = authorized_client(&state, &tenant, &client_id, &headers).await?;
    Ok(ResponseJson(client.into_client()))
}

pub async fn update_client_handler(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<Client>,
) -> Result<ResponseJson<Client>, Response> {
    let previous = authorized_client(&state, &tenant, &client_id, &headers).await?;

    state
        .client_registration_service
        .update(&tenant, request, &previous)
        .await
        .map(ResponseJson)
        .map_err(IntoResponse::into_response)
}

pub async fn delete_client_handler(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, Response> {
    let client = authorized_client(&state, &tenant, &client_id, &headers).await?;

    state
        .client_registration_service
        .delete(&tenant, &client)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load the client and check the registration access token presented for it
async fn authorized_client(
    state: &AppState,
    tenant: &Tenant,
    client_id: &str,
    headers: &HeaderMap,
) -> Result<ClientDocument, Response> {
    let client = match state
        .client_registration_service
        .find_client(tenant, client_id)
        .await
    {
        Ok(client) => client,
        Err(StorageError::NotFound(_)) => {
            return Err(oauth_error_response(
                StatusCode::NOT_FOUND,
                "invalid_client_id",
            ));
        }
        Err(_) => return Err(ClientRegistrationError::InternalServerError.into_response()),
    };

    let token = bearer_token(headers).unwrap_or_default();
    match client.valid_token(tenant, REGISTRATION_TOKEN_AUDIENCE, token) {
        Some(_) => Ok(client),
        None => Err(oauth_error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
        )),
    }
}
