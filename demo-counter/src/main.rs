use std::sync::Arc;

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use http::{HeaderMap, StatusCode};

use redb_sessions_axum::redb_sessions::SessionStore;
use redb_sessions_axum::{CookieSession, destroy_session, init_store, save_session};

mod server;

#[derive(Template)]
#[template(path = "index.j2")]
struct IndexTemplate<'a> {
    visits: u64,
    session_id: &'a str,
    flashes: Vec<String>,
}

async fn index(
    State(store): State<Arc<SessionStore>>,
    CookieSession(mut session): CookieSession,
) -> Result<(HeaderMap, Html<String>), (StatusCode, String)> {
    let flashes = session
        .flashes()
        .into_iter()
        .filter_map(|f| f.as_str().map(str::to_string))
        .collect();

    let visits = session.get::<u64>("visits").unwrap_or(0) + 1;
    session
        .insert("visits", visits)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let headers = save_session(store, &mut session).await?;

    let template = IndexTemplate {
        visits,
        session_id: &session.id,
        flashes,
    };
    let body = template
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok((headers, Html(body)))
}

async fn reset(
    State(store): State<Arc<SessionStore>>,
    CookieSession(session): CookieSession,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if session.is_new {
        return Ok((HeaderMap::new(), Redirect::to("/")));
    }
    let headers = destroy_session(store, &session).await?;
    tracing::debug!("Session reset");
    Ok((headers, Redirect::to("/")))
}

async fn flash(
    State(store): State<Arc<SessionStore>>,
    CookieSession(mut session): CookieSession,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    session
        .add_flash("Hello from the previous request")
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let headers = save_session(store, &mut session).await?;
    Ok((headers, Redirect::to("/")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    server::init_tracing("demo_counter");

    let store = init_store()?;

    let app = Router::new()
        .route("/", get(index))
        .route("/flash", post(flash))
        .route("/reset", post(reset))
        .with_state(store);

    tracing::info!("Starting server on http://localhost:3001");
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    axum::serve(listener, app).await?;
    Ok(())
}
