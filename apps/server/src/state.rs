//! Shared application state handed to every handler.

use std::sync::Arc;

use bazaar_db::Database;

use crate::auth::JwtManager;

/// Application state.
///
/// Cloned per request by axum; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (shares one connection pool across clones).
    pub db: Database,

    /// Token signer/verifier.
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    /// Creates the application state.
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }
}
