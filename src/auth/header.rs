//! Bearer credential extraction from the `Authorization` header.

use super::AuthError;

/// Pull the token out of a raw `Authorization` header value.
///
/// The value must be exactly two space-separated parts, the first being the
/// `Bearer` scheme (case-insensitive).
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AuthError::MalformedHeader),
    }
}
