use crate::storage::DynStorage;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    /// Bearer token required on `/api/admin/*`. `None` leaves the admin surface open.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(storage: DynStorage) -> Self {
        Self {
            storage,
            admin_token: None,
        }
    }

    /// State with the admin token taken from `ADMIN_API_TOKEN`.
    pub fn from_env(storage: DynStorage) -> Self {
        let admin_token = std::env::var("ADMIN_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            storage,
            admin_token,
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }
}
