use url::form_urlencoded;

use super::{EdgeDecision, RouteTables};
use crate::session::SessionLookup;

/// Session-aware access gate for non-tenant requests.
///
/// `LookupFailed` is treated exactly like `Anonymous` by every rule: protected
/// routes fail closed (login redirect) and public routes fail open.
pub fn gate(session: &SessionLookup, path: &str, has_error: bool, tables: &RouteTables) -> EdgeDecision {
    if let SessionLookup::LookupFailed(reason) = session {
        tracing::warn!("Session lookup failed, treating caller as anonymous: {}", reason);
    }

    // Signed-in users are sent from public pages to their home area,
    // unless an error is being reported on that page
    if tables.is_public(path) && !has_error {
        if let Some(user) = session.user() {
            if let Some(home) = tables.home_area(user.user_type) {
                if path != home {
                    return EdgeDecision::Redirect {
                        location: home.to_string(),
                    };
                }
            }
        }
    }

    if tables.is_protected(path) && !session.is_authenticated() {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair(&tables.redirect_param, path)
            .finish();
        return EdgeDecision::Redirect {
            location: format!("{}?{}", tables.login_path, query),
        };
    }

    EdgeDecision::PassThrough
}
