use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::debug;

/// API key accepted when none is configured.
pub const DEFAULT_KEY: &str = "mock-key";

/// The one user the fixtures describe.
pub const USER_ID: &str = "1";
pub const USER_NAME: &str = "jdoe";

/// Every endpoint answers 500 for this user.
pub const FAILING_USER_ID: &str = "500";

pub const USER_SHOW: &str = include_str!("../../test-vectors/user_show.xml");
pub const GROUP_LIST: &str = include_str!("../../test-vectors/group_list.xml");
pub const GROUP_LIST_EMPTY: &str = include_str!("../../test-vectors/group_list_empty.xml");
pub const OWNED_BOOKS: &str = include_str!("../../test-vectors/owned_books.xml");
pub const READ_STATUS: &str = include_str!("../../test-vectors/read_status.xml");
pub const REVIEW_LIST: &str = include_str!("../../test-vectors/review_list.xml");
pub const SHELF_READ: &str = include_str!("../../test-vectors/shelf_read.xml");
pub const SHELF_LIST: &str = include_str!("../../test-vectors/shelf_list.xml");

const EMPTY_REVIEWS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GoodreadsResponse>
  <reviews start="0" end="0" total="0"/>
</GoodreadsResponse>
"#;

#[derive(Clone)]
struct MockState {
    key: Arc<str>,
}

type Params = Query<HashMap<String, String>>;

pub fn app() -> Router {
    app_with_key(DEFAULT_KEY)
}

pub fn app_with_key(key: &str) -> Router {
    let state = MockState { key: Arc::from(key) };
    Router::new()
        .route("/user/show.xml", get(show_user_by_name))
        .route("/user/show/{file}", get(show_user))
        .route("/group/list/{file}", get(list_groups))
        .route("/owned_books/user/{file}", get(list_owned_books))
        .route("/read_statuses/{id}", get(show_read_status))
        .route("/review/list.xml", get(list_reviews))
        .route("/review/list/{id}", get(list_shelf))
        .route("/shelf/list.xml", get(list_shelves))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(key)).await
}

async fn show_user(State(state): State<MockState>, Path(file): Path<String>, Query(params): Params) -> Response {
    serve(&state, &params, strip_xml(&file), || USER_SHOW)
}

async fn show_user_by_name(State(state): State<MockState>, Query(params): Params) -> Response {
    let user = match params.get("username").map(String::as_str) {
        Some(USER_NAME) => USER_ID,
        _ => "",
    };
    serve(&state, &params, user, || USER_SHOW)
}

async fn list_groups(State(state): State<MockState>, Path(file): Path<String>, Query(params): Params) -> Response {
    let page = page_of(&params);
    serve(&state, &params, strip_xml(&file), || {
        if page > 1 {
            GROUP_LIST_EMPTY
        } else {
            GROUP_LIST
        }
    })
}

async fn list_owned_books(
    State(state): State<MockState>,
    Path(file): Path<String>,
    Query(params): Params,
) -> Response {
    serve(&state, &params, strip_xml(&file), || OWNED_BOOKS)
}

async fn show_read_status(State(state): State<MockState>, Path(id): Path<String>, Query(params): Params) -> Response {
    serve(&state, &params, &id, || READ_STATUS)
}

async fn list_reviews(State(state): State<MockState>, Query(params): Params) -> Response {
    let user = params.get("id").cloned().unwrap_or_default();
    serve(&state, &params, &user, || REVIEW_LIST)
}

async fn list_shelf(State(state): State<MockState>, Path(id): Path<String>, Query(params): Params) -> Response {
    let read = params.get("shelf").is_some_and(|s| s == "read");
    serve(&state, &params, &id, || if read { SHELF_READ } else { EMPTY_REVIEWS })
}

async fn list_shelves(State(state): State<MockState>, Query(params): Params) -> Response {
    let user = params.get("user_id").cloned().unwrap_or_default();
    serve(&state, &params, &user, || SHELF_LIST)
}

/// Check the key and the user, then answer with `body` as XML.
fn serve(
    state: &MockState,
    params: &HashMap<String, String>,
    user: &str,
    body: impl FnOnce() -> &'static str,
) -> Response {
    if params.get("key").map(String::as_str) != Some(&*state.key) {
        debug!("rejecting request with missing or wrong key");
        return (StatusCode::UNAUTHORIZED, "invalid API key").into_response();
    }
    match user {
        FAILING_USER_ID => (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response(),
        USER_ID => ([(header::CONTENT_TYPE, "application/xml")], body()).into_response(),
        other => {
            debug!(user = other, "unknown user");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn strip_xml(file: &str) -> &str {
    file.strip_suffix(".xml").unwrap_or(file)
}

fn page_of(params: &HashMap<String, String>) -> u32 {
    params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1)
}
