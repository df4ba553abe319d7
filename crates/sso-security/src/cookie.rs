//! The `user_id` session cookie set by the login endpoint

use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use sso_shared::constants::USER_ID_COOKIE;

/// httpOnly, `SameSite=Lax`, path `/`; `Secure` only in production.
pub fn user_cookie(user_id: &str, max_age_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((USER_ID_COOKIE, user_id.to_string()))
        .http_only(true)
        .path("/")
        .max_age(Duration::days(max_age_days))
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie that, once sent, makes the browser drop `user_id`.
pub fn clear_user_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = user_cookie("", 0, secure);
    cookie.make_removal();
    cookie
}
