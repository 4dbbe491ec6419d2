use super::{
    page,
    types::{ErrorResponse, HealthResponse, SessionResponse},
};
use crate::{
    Error,
    config::Config,
    flow::{AvatarApi, AvatarRequestFlow, HttpAvatarApi, Notice, SessionStore},
    photo::UploadedImage,
};
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "facematch_session";

type HandlerError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub flow: Arc<AvatarRequestFlow>,
}

impl AppState {
    pub fn new(config: &Config) -> crate::Result<Self> {
        Self::with_api(Arc::new(HttpAvatarApi::new(&config.api)), config)
    }

    pub fn with_api(api: Arc<dyn AvatarApi>, config: &Config) -> crate::Result<Self> {
        Ok(Self {
            sessions: SessionStore::new(config.server.session_ttl_secs)?,
            flow: Arc::new(AvatarRequestFlow::new(api, config.image.clone())),
        })
    }
}

fn internal_error(e: Error) -> HandlerError {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Processing error: {}", e),
        }),
    )
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Returns the caller's session id, creating a session when the cookie is
/// missing or names one that no longer exists. The flag is true for new ids.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> crate::Result<(Uuid, bool)> {
    state.sessions.prune_expired()?;

    if let Some(id) = session_id_from_headers(headers) {
        if state.sessions.contains(&id)? {
            return Ok((id, false));
        }
    }
    Ok((state.sessions.create()?, true))
}

fn with_session_cookie(mut response: Response, id: Uuid, is_new: bool) -> Response {
    if is_new {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Could not build session cookie: {}", e),
        }
    }
    response
}

async fn render_page(
    state: &AppState,
    id: Uuid,
    is_new: bool,
    notice: Option<Notice>,
) -> Result<Response, HandlerError> {
    let session = state.sessions.get(&id).map_err(internal_error)?;
    let view = state.flow.render(&session).await;
    let body = page::render(&view, notice.as_ref());
    Ok(with_session_cookie(Html(body).into_response(), id, is_new))
}

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    let (id, is_new) = resolve_session(&state, &headers).map_err(internal_error)?;
    render_page(&state, id, is_new, None).await
}

async fn read_upload(multipart: &mut Multipart) -> Result<UploadedImage, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {}", e))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.jpg").to_string();
        let content_type = field.content_type().map(|c| c.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("Read error: {}", e))?;

        if bytes.is_empty() {
            return Err("Image file is empty".to_string());
        }
        return Ok(UploadedImage::new(filename, content_type, bytes.to_vec()));
    }

    Err("No image was uploaded".to_string())
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let (id, is_new) = resolve_session(&state, &headers).map_err(internal_error)?;

    let notice = match read_upload(&mut multipart).await {
        Ok(upload) => {
            info!(
                "Received {} ({} bytes) for session {}",
                upload.filename,
                upload.bytes.len(),
                id
            );
            let mut session = state.sessions.get(&id).map_err(internal_error)?;
            match state.flow.generate(&mut session, upload).await {
                Ok(notice) => {
                    if !notice.is_error() {
                        state.sessions.put(&id, session).map_err(internal_error)?;
                    }
                    notice
                }
                Err(e) => Notice::Error(format!("Failed to process image: {e}")),
            }
        }
        Err(message) => {
            warn!("Rejected upload for session {}: {}", id, message);
            Notice::Error(format!("Failed to process image: {message}"))
        }
    };

    render_page(&state, id, is_new, Some(notice)).await
}

pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    let (id, is_new) = resolve_session(&state, &headers).map_err(internal_error)?;
    let session = state.sessions.get(&id).map_err(internal_error)?;
    let body = Json(SessionResponse {
        session_id: id.to_string(),
        state: session,
    });
    Ok(with_session_cookie(body.into_response(), id, is_new))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, HandlerError> {
    let sessions = state.sessions.len().map_err(internal_error)?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        sessions,
    }))
}
