// Book theme request handlers
// Core calls are synchronous (SQLite + std::fs) and run on the blocking pool.

use std::path::Path;
use std::sync::Arc;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::ADMIN_ROLE;
use crate::db::schema;
use crate::error::ThemeError;
use crate::themes::assets::{mime_type_for, validate_upload_file_name};
use super::{ApiError, AppState, BookThemeDto, Caller, SharedState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookThemeQuery {
    pub book_theme_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookThemeQuery {
    pub book_theme_id: i64,
    #[serde(default)]
    pub force: bool,
}

/// Run a core operation with a fresh connection on the blocking pool
async fn run_blocking<T, F>(state: &SharedState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppState, &Connection) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || -> crate::error::Result<T> {
        let conn = state.connect()?;
        f(&state, &conn)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Blocking task failed: {}", e)))?;

    Ok(result?)
}

pub async fn health() -> &'static str {
    "ok"
}

/// GET /all
pub async fn list_book_themes(
    State(state): State<SharedState>,
    _caller: Caller,
) -> Result<Json<Vec<BookThemeDto>>, ApiError> {
    let themes = run_blocking(&state, |_, conn| schema::list_book_themes(conn)).await?;
    Ok(Json(themes.into_iter().map(BookThemeDto::from).collect()))
}

/// GET /?bookThemeId= - streams the theme file. System themes are bundled with the reader.
pub async fn get_book_theme(
    State(state): State<SharedState>,
    _caller: Caller,
    Query(query): Query<BookThemeQuery>,
) -> Result<Response, ApiError> {
    let id = query.book_theme_id;
    let (theme, bytes) = run_blocking(&state, move |state, conn| {
        state.service.read_theme_file(conn, id)
    })
    .await?;

    let content_type = mime_type_for(&theme.file_name);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// DELETE /?bookThemeId=&force= - force is only honored for admins
pub async fn delete_book_theme(
    State(state): State<SharedState>,
    caller: Caller,
    Query(query): Query<DeleteBookThemeQuery>,
) -> Result<StatusCode, ApiError> {
    let id = query.book_theme_id;
    let force = query.force && caller.is_in_role(ADMIN_ROLE);
    if query.force && !force {
        log::info!("Ignoring force delete of theme {} from non-admin user {}", id, caller.user_id);
    }

    run_blocking(&state, move |state, conn| state.service.delete(conn, id, force)).await?;
    Ok(StatusCode::OK)
}

/// POST /upload - a single .css file as multipart form data
pub async fn upload_book_theme(
    State(state): State<SharedState>,
    caller: Caller,
    mut multipart: Multipart,
) -> Result<Json<BookThemeDto>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        // Non-file form fields are ignored
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if upload.is_some() {
            return Err(ApiError::BadRequest("Only one theme file may be uploaded per request".to_string()));
        }

        validate_upload_file_name(&file_name)?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) = upload
        .ok_or_else(|| ApiError::BadRequest("No theme file in request".to_string()))?;

    log::info!("User {} uploading book theme {}", caller.user_id, file_name);

    // Each upload gets its own staging directory so the original file name survives
    let staging_dir = state.config.temp_dir().join(Uuid::new_v4().to_string());
    let staged_path = staging_dir.join(&file_name);

    let staged = stage_upload(&staging_dir, &staged_path, &data).await;
    let result = match staged {
        Ok(()) => {
            run_blocking(&state, move |state, conn| {
                state.service.create_book_theme_from_file(conn, &staged_path)
            })
            .await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = tokio::fs::remove_dir_all(&staging_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to clean upload staging {}: {}", staging_dir.display(), e);
        }
    }

    Ok(Json(BookThemeDto::from(result?)))
}

async fn stage_upload(staging_dir: &Path, staged_path: &Path, data: &[u8]) -> Result<(), ThemeError> {
    tokio::fs::create_dir_all(staging_dir).await?;
    tokio::fs::write(staged_path, data).await?;
    Ok(())
}
