use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use http::{HeaderMap, StatusCode, request::Parts};
use redb_sessions::{Database, SameSite, Session, SessionError, SessionOptions, SessionStore};

use super::config::{
    SESSION_COOKIE_NAME, SESSION_COOKIE_SECURE, SESSION_DB_PATH, SESSION_REISSUE_ON_MISSING,
    key_pairs_from_env,
};
use super::error::IntoResponseError;

/// Open the database at `SESSION_DB_PATH` and build a store keyed from
/// `SESSION_KEYS`. The returned handle is meant to live in the router state.
pub fn init_store() -> Result<Arc<SessionStore>, SessionError> {
    let db = Database::create(SESSION_DB_PATH.as_str())
        .map_err(|e| SessionError::Storage(e.into()))?;

    let store = SessionStore::builder(Arc::new(db))
        .key_pairs(key_pairs_from_env()?)
        .options(SessionOptions {
            secure: *SESSION_COOKIE_SECURE,
            http_only: true,
            same_site: Some(SameSite::Lax),
            ..SessionOptions::default()
        })
        .build()?;

    tracing::info!(
        "Session store opened: path={}, bucket={}",
        SESSION_DB_PATH.as_str(),
        store.bucket_name()
    );
    Ok(Arc::new(store))
}

async fn run_blocking<T, F>(f: F) -> Result<T, (StatusCode, String)>
where
    F: FnOnce() -> Result<T, SessionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .into_response_error()?
        .into_response_error()
}

/// Load the session named `name` from the request headers.
///
/// With `reissue_on_missing`, a cookie that references no stored session is
/// answered with a fresh session instead of an error.
pub async fn load_session(
    store: Arc<SessionStore>,
    headers: HeaderMap,
    name: &str,
    reissue_on_missing: bool,
) -> Result<Session, (StatusCode, String)> {
    let name = name.to_string();
    run_blocking(move || match store.get(&headers, &name) {
        Err(SessionError::NotStored) if reissue_on_missing => {
            tracing::debug!("Session cookie '{}' has no stored session, reissuing", name);
            store.new_session(&headers, &name)
        }
        other => other,
    })
    .await
}

/// Save the session and return the `Set-Cookie` headers to send back.
pub async fn save_session(
    store: Arc<SessionStore>,
    session: &mut Session,
) -> Result<HeaderMap, (StatusCode, String)> {
    let mut pending = session.clone();
    let (headers, saved) = run_blocking(move || {
        let mut headers = HeaderMap::new();
        store.save(&mut headers, &mut pending)?;
        Ok((headers, pending))
    })
    .await?;
    *session = saved;
    Ok(headers)
}

/// Delete the session and return the headers expiring its cookie.
pub async fn destroy_session(
    store: Arc<SessionStore>,
    session: &Session,
) -> Result<HeaderMap, (StatusCode, String)> {
    let session = session.clone();
    run_blocking(move || {
        let mut headers = HeaderMap::new();
        store.destroy(&mut headers, &session)?;
        Ok(headers)
    })
    .await
}

/// Session of the current request, available as an Axum extractor
///
/// Loads the session named by `SESSION_COOKIE_NAME`, creating a new one when
/// the request carries no session cookie. The router state must provide an
/// `Arc<SessionStore>`.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use redb_sessions_axum::{CookieSession, init_store};
///
/// async fn handler(CookieSession(session): CookieSession) -> String {
///     format!("new session: {}", session.is_new)
/// }
///
/// let store = init_store().unwrap();
/// let app: Router = Router::new().route("/", get(handler)).with_state(store);
/// ```
#[derive(Debug, Clone)]
pub struct CookieSession(pub Session);

impl<S> FromRequestParts<S> for CookieSession
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Arc::<SessionStore>::from_ref(state);
        load_session(
            store,
            parts.headers.clone(),
            SESSION_COOKIE_NAME.as_str(),
            *SESSION_REISSUE_ON_MISSING,
        )
        .await
        .map(CookieSession)
    }
}
