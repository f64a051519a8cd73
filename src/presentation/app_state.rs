// Application state for the settings form handlers
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppState {
    /// Credentials file the form reads and rewrites
    pub credentials_path: PathBuf,
}
