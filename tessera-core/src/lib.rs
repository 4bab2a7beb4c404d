pub mod url_guard;

pub use url_guard::{is_local_redirect_target, is_safe_external_url, resolve_safe_redirect};
