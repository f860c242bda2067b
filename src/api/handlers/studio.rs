//! Studio shell endpoints. State is per-user and process-local; nothing here
//! persists or touches a geometry model.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::state::AppState;
use crate::platform::Platform;
use crate::studio::{DrawTool, Sheet, Shell, StudioError, TransformMode, Workspace};

use super::auth::session::{resolve_user, SessionCookies};
use super::auth::types::ErrorResponse;

#[derive(ToSchema, Deserialize, Debug)]
pub struct SelectToolRequest {
    pub tool: Option<DrawTool>,
    pub mode: Option<TransformMode>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SheetPatchRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// The caller's shell, created with defaults on first use.
#[utoipa::path(
    get,
    path = "/api/studio/state",
    responses(
        (status = 200, description = "Shell state", body = Shell),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn shell_state(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };
    (StatusCode::OK, Json(state.studio().snapshot(user_id))).into_response()
}

/// Select the draw tool and/or transform mode.
#[utoipa::path(
    put,
    path = "/api/studio/tool",
    request_body = SelectToolRequest,
    responses(
        (status = 200, description = "Updated shell", body = Shell),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn select_tool(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SelectToolRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };

    let shell = state.studio().with_shell(user_id, |shell| {
        if let Some(tool) = request.tool {
            shell.select_tool(tool);
        }
        if let Some(mode) = request.mode {
            shell.set_mode(mode);
        }
        shell.clone()
    });
    (StatusCode::OK, Json(shell)).into_response()
}

/// Replace the workspace settings (grid, zoom, dimensions).
#[utoipa::path(
    put,
    path = "/api/studio/workspace",
    request_body = Workspace,
    responses(
        (status = 200, description = "Updated shell", body = Shell),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn set_workspace(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<Workspace>>,
) -> impl IntoResponse {
    let Some(Json(workspace)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };

    let shell = state.studio().with_shell(user_id, |shell| {
        shell.set_workspace(workspace.clone());
        shell.clone()
    });
    (StatusCode::OK, Json(shell)).into_response()
}

/// Append a new sheet tab.
#[utoipa::path(
    post,
    path = "/api/studio/sheets",
    responses(
        (status = 201, description = "Added sheet", body = Sheet),
        (status = 401, description = "No session", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn add_sheet(
    headers: HeaderMap,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };
    let sheet = state
        .studio()
        .with_shell(user_id, |shell| shell.sheets.add());
    (StatusCode::CREATED, Json(sheet)).into_response()
}

/// Duplicate a sheet under a parenthetical copy name.
#[utoipa::path(
    post,
    path = "/api/studio/sheets/{id}/duplicate",
    params(("id" = String, Path, description = "Sheet id")),
    responses(
        (status = 201, description = "Duplicated sheet", body = Sheet),
        (status = 401, description = "No session", body = ErrorResponse),
        (status = 404, description = "Unknown sheet", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn duplicate_sheet(
    headers: HeaderMap,
    Path(id): Path<String>,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };
    let outcome = state
        .studio()
        .with_shell(user_id, |shell| shell.sheets.duplicate(&id));
    match outcome {
        Ok(sheet) => (StatusCode::CREATED, Json(sheet)).into_response(),
        Err(err) => studio_error(err),
    }
}

/// Rename and/or activate a sheet.
#[utoipa::path(
    patch,
    path = "/api/studio/sheets/{id}",
    params(("id" = String, Path, description = "Sheet id")),
    request_body = SheetPatchRequest,
    responses(
        (status = 200, description = "Updated sheet", body = Sheet),
        (status = 401, description = "No session", body = ErrorResponse),
        (status = 404, description = "Unknown sheet", body = ErrorResponse),
        (status = 422, description = "Empty name", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn update_sheet(
    headers: HeaderMap,
    Path(id): Path<String>,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SheetPatchRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };

    let outcome = state.studio().with_shell(user_id, |shell| {
        if let Some(name) = &request.name {
            shell.sheets.rename(&id, name)?;
        }
        if request.active == Some(true) {
            shell.sheets.activate(&id)?;
        }
        shell
            .sheets
            .get(&id)
            .cloned()
            .ok_or(StudioError::UnknownSheet)
    });
    match outcome {
        Ok(sheet) => (StatusCode::OK, Json(sheet)).into_response(),
        Err(err) => studio_error(err),
    }
}

/// Remove a sheet; the strip never goes empty.
#[utoipa::path(
    delete,
    path = "/api/studio/sheets/{id}",
    params(("id" = String, Path, description = "Sheet id")),
    responses(
        (status = 204, description = "Sheet removed"),
        (status = 401, description = "No session", body = ErrorResponse),
        (status = 404, description = "Unknown sheet", body = ErrorResponse),
        (status = 409, description = "Last sheet", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn remove_sheet(
    headers: HeaderMap,
    Path(id): Path<String>,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };
    let outcome = state
        .studio()
        .with_shell(user_id, |shell| shell.sheets.remove(&id));
    match outcome {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => studio_error(err),
    }
}

/// Flip a layer's visibility.
#[utoipa::path(
    post,
    path = "/api/studio/layers/{id}/toggle",
    params(("id" = String, Path, description = "Layer id")),
    responses(
        (status = 200, description = "Updated shell", body = Shell),
        (status = 401, description = "No session", body = ErrorResponse),
        (status = 404, description = "Unknown layer", body = ErrorResponse)
    ),
    tag = "studio"
)]
pub async fn toggle_layer(
    headers: HeaderMap,
    Path(id): Path<String>,
    platform: Extension<Arc<Platform>>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(user_id) = caller(&headers, &platform).await else {
        return unauthorized();
    };
    let outcome = state.studio().with_shell(user_id, |shell| {
        shell.toggle_layer(&id)?;
        Ok::<Shell, StudioError>(shell.clone())
    });
    match outcome {
        Ok(shell) => (StatusCode::OK, Json(shell)).into_response(),
        Err(err) => studio_error(err),
    }
}

async fn caller(headers: &HeaderMap, platform: &Platform) -> Option<uuid::Uuid> {
    let cookies = SessionCookies::from_headers(headers);
    resolve_user(platform, &cookies)
        .await
        .map(|authed| authed.user.id)
}

fn studio_error(err: StudioError) -> Response {
    let status = match err {
        StudioError::UnknownSheet | StudioError::UnknownLayer => StatusCode::NOT_FOUND,
        StudioError::LastSheet => StatusCode::CONFLICT,
        StudioError::EmptyName => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::super::auth::test_support::{platform, state};
    use super::*;

    #[tokio::test]
    async fn shell_state_without_cookies_is_unauthorized() {
        let response = shell_state(HeaderMap::new(), Extension(platform()), Extension(state()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn select_tool_missing_payload() {
        let response = select_tool(
            HeaderMap::new(),
            Extension(platform()),
            Extension(state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
