// Gateway tests: routes driven through the router with tower's oneshot

use super::*;
use crate::constants::{USER_ID_HEADER, USER_ROLES_HEADER};
use crate::db::{init_data_folders, schema};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "BOOKTHEMESBOUNDARY";

fn setup() -> (TempDir, SharedState) {
    let tmp = TempDir::new().unwrap();
    let config = ServerConfig::new(tmp.path().join("data"));
    init_data_folders(&config.data_dir).unwrap();

    let state = Arc::new(AppState::new(config));
    // Applies migrations
    state.connect().unwrap();
    (tmp, state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, "1")
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str, roles: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(USER_ID_HEADER, "2")
        .header(USER_ROLES_HEADER, roles)
        .body(Body::empty())
        .unwrap()
}

fn upload(files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, content) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"formFile\"; filename=\"{}\"\r\nContent-Type: text/css\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/book-theme/upload")
        .header(USER_ID_HEADER, "1")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

async fn send(state: &SharedState, request: Request<Body>) -> Response {
    router(Arc::clone(state)).oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn upload_ok(state: &SharedState, name: &str, content: &[u8]) -> BookThemeDto {
    let response = send(state, upload(&[(name, content)])).await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn staging_is_empty(state: &SharedState) -> bool {
    std::fs::read_dir(state.config.temp_dir()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_health() {
    let (_tmp, state) = setup();
    let response = send(&state, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requests_without_identity_are_rejected() {
    let (_tmp, state) = setup();
    let request = Request::builder().uri("/api/book-theme/all").body(Body::empty()).unwrap();

    let response = send(&state, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "errors.unauthorized");
}

#[tokio::test]
async fn test_list_returns_default_first() {
    let (_tmp, state) = setup();

    let response = send(&state, get("/api/book-theme/all")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let themes = body_json(response).await;
    let themes = themes.as_array().unwrap();
    assert_eq!(themes.len(), 3);
    assert_eq!(themes[0]["name"], "Dark");
    assert_eq!(themes[0]["isDefault"], true);
    assert_eq!(themes[0]["provider"], "System");
}

#[tokio::test]
async fn test_upload_then_fetch_file() {
    let (_tmp, state) = setup();
    let css = b"body { background: #e0f7fa; }";

    let created = upload_ok(&state, "Ocean Breeze.css", css).await;
    assert_eq!(created.name, "Ocean Breeze");
    assert_eq!(created.selector, "brtheme-oceanbreeze");
    assert_eq!(created.provider, crate::db::schema::ThemeProvider::Custom);
    assert!(staging_is_empty(&state), "Upload staging must be cleaned up");

    let response = send(&state, get(&format!("/api/book-theme?bookThemeId={}", created.id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    assert_eq!(body_bytes(response).await, css);
}

#[tokio::test]
async fn test_upload_rejects_bad_names() {
    let (_tmp, state) = setup();

    for name in ["theme.txt", "..sneaky.css", "nested/theme.css"] {
        let response = send(&state, upload(&[(name, b"a{}")])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", name);
    }

    assert!(staging_is_empty(&state));
    assert!(state.service.assets().list_files().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_accepts_one_file_only() {
    let (_tmp, state) = setup();

    let response = send(&state, upload(&[("a.css", b"a{}"), ("b.css", b"b{}")])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.service.assets().list_files().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let (_tmp, state) = setup();
    let response = send(&state, upload(&[])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_duplicate_name() {
    let (_tmp, state) = setup();
    upload_ok(&state, "Ocean Breeze.css", b"a{}").await;

    let response = send(&state, upload(&[("ocean-breeze.css", b"b{}")])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "errors.book-theme-already-in-use");
    assert!(staging_is_empty(&state), "Rejected uploads must not linger in staging");
}

#[tokio::test]
async fn test_fetch_system_theme_is_bad_request() {
    let (_tmp, state) = setup();
    let conn = state.connect().unwrap();
    let dark = schema::get_book_theme_by_normalized_name(&conn, "dark").unwrap().unwrap();

    let response = send(&state, get(&format!("/api/book-theme?bookThemeId={}", dark.id))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "errors.book-theme-system");
}

#[tokio::test]
async fn test_fetch_unknown_theme_is_not_found() {
    let (_tmp, state) = setup();
    let response = send(&state, get("/api/book-theme?bookThemeId=777")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fetch_without_id_is_bad_request() {
    let (_tmp, state) = setup();
    let response = send(&state, get("/api/book-theme")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_force_requires_admin() {
    let (_tmp, state) = setup();
    let created = upload_ok(&state, "forest.css", b"a{}").await;
    let conn = state.connect().unwrap();
    schema::set_user_book_theme(&conn, 5, &created.name).unwrap();

    let uri = format!("/api/book-theme?bookThemeId={}&force=true", created.id);

    // Non-admin: force is dropped, theme in use
    let response = send(&state, delete(&uri, "Reader")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "errors.book-theme-in-use");
    assert!(schema::get_book_theme(&conn, created.id).unwrap().is_some());

    // Admin: force honored
    let response = send(&state, delete(&uri, "Reader, Admin")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(schema::get_book_theme(&conn, created.id).unwrap().is_none());
    assert!(!state.service.assets().exists(&created.file_name));
}

#[tokio::test]
async fn test_delete_unused_theme() {
    let (_tmp, state) = setup();
    let created = upload_ok(&state, "forest.css", b"a{}").await;

    let response = send(&state, delete(&format!("/api/book-theme?bookThemeId={}", created.id), "")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&state, get(&format!("/api/book-theme?bookThemeId={}", created.id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_system_theme_refused() {
    let (_tmp, state) = setup();
    let conn = state.connect().unwrap();
    let white = schema::get_book_theme_by_normalized_name(&conn, "white").unwrap().unwrap();

    let response = send(
        &state,
        delete(&format!("/api/book-theme?bookThemeId={}&force=true", white.id), "Admin"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(schema::get_book_theme(&conn, white.id).unwrap().is_some());
}

struct DarkBackgrounds;

impl crate::themes::palette::PaletteInspector for DarkBackgrounds {
    fn inspect(&self, css: &[u8]) -> crate::themes::palette::Palette {
        let dark = String::from_utf8_lossy(css).contains("#000");
        crate::themes::palette::Palette {
            color_hash: if dark { "#000000".to_string() } else { String::new() },
            is_dark_theme: dark,
        }
    }
}

#[tokio::test]
async fn test_upload_uses_configured_palette_inspector() {
    let (tmp, _) = setup();
    let config = ServerConfig::new(tmp.path().join("data"));
    let service = ThemeService::new(config.themes_dir()).with_palette_inspector(DarkBackgrounds);
    let state = Arc::new(AppState::with_service(config, service));

    let created = upload_ok(&state, "midnight.css", b"body { background: #000; }").await;

    assert!(created.is_dark_theme);
    assert_eq!(created.color_hash, "#000000");
}
