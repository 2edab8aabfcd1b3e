//! Permission gate: scope checks in front of guarded operations.

use std::future::Future;

use tracing::warn;

use super::{AuthError, Claims, TokenVerifier};

/// A static permission requirement attached to an operation
pub trait Permission: Send + Sync + 'static {
    const SCOPE: &'static str;
}

/// Read full drink recipes
#[derive(Debug, Clone, Copy)]
pub struct GetDrinkDetails;

impl Permission for GetDrinkDetails {
    const SCOPE: &'static str = "get:drink-details";
}

/// Create drinks
#[derive(Debug, Clone, Copy)]
pub struct PostDrinks;

impl Permission for PostDrinks {
    const SCOPE: &'static str = "post:drinks";
}

/// Update drinks
#[derive(Debug, Clone, Copy)]
pub struct PatchDrinks;

impl Permission for PatchDrinks {
    const SCOPE: &'static str = "patch:drinks";
}

/// Delete drinks
#[derive(Debug, Clone, Copy)]
pub struct DeleteDrinks;

impl Permission for DeleteDrinks {
    const SCOPE: &'static str = "delete:drinks";
}

/// Check that `claims` grant `required`.
///
/// Claims with no permission list at all are distinguished from claims
/// whose list lacks the scope.
pub fn check_permissions(required: &str, claims: &Claims) -> Result<(), AuthError> {
    let granted = claims
        .permissions
        .as_deref()
        .ok_or(AuthError::MissingPermissions)?;

    if granted.iter().any(|p| p == required) {
        Ok(())
    } else {
        warn!(
            "Permission '{}' denied for subject {:?}",
            required,
            claims.sub.as_deref().unwrap_or("<none>")
        );
        Err(AuthError::PermissionDenied(required.to_owned()))
    }
}

/// Run `operation` only if `header` carries a valid credential granting
/// `required`. The decoded claims are handed to the operation.
pub async fn requires_auth<F, Fut, T>(
    verifier: &TokenVerifier,
    header: Option<&str>,
    required: &str,
    operation: F,
) -> Result<T, AuthError>
where
    F: FnOnce(Claims) -> Fut,
    Fut: Future<Output = T>,
{
    let claims = verifier.verify_header(header).await?;
    check_permissions(required, &claims)?;
    Ok(operation(claims).await)
}
