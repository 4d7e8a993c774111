use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;

use crate::auth::models::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// The refresh cookie travels only to the refresh route, so a compromised
/// page elsewhere in the app never sees it on the wire.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth/refresh";

fn build(name: &'static str, value: String, path: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path(path)
        .build()
}

/// Attach both auth cookies to the response.
///
/// Both are script-inaccessible; `secure` is on in production so they only
/// travel over TLS.
pub fn set_auth_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(build(ACCESS_COOKIE, pair.access_token.clone(), "/", secure))
        .add(build(
            REFRESH_COOKIE,
            pair.refresh_token.clone(),
            REFRESH_COOKIE_PATH,
            secure,
        ))
}

/// Expire both auth cookies. Attributes must match the originals or the
/// browser treats them as different cookies.
pub fn clear_auth_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.remove(build(ACCESS_COOKIE, String::new(), "/", secure))
        .remove(build(
            REFRESH_COOKIE,
            String::new(),
            REFRESH_COOKIE_PATH,
            secure,
        ))
}
