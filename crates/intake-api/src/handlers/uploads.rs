//! Read-only access to stored proof files

use std::path::Path;

use tower_http::services::ServeDir;

/// Service for `/uploads`: any stored filename can be fetched by name,
/// unknown names get 404. There is no access control.
pub fn serve_uploads(dir: &Path) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(false)
}
