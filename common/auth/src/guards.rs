use crate::extract::CurrentUser;
use crate::roles::Role;

/// A resolved identity failed a role requirement. Distinct from the 401
/// family: the caller is known, just not allowed. Services own the HTTP
/// rendering of this error.
#[derive(Debug, Clone)]
pub enum GuardError {
    Forbidden { required: Role },
}

/// Composable role requirement, run after identity resolution.
pub fn ensure_role(user: &CurrentUser, required: Role) -> Result<(), GuardError> {
    match required {
        // Any resolved identity satisfies the base tier.
        Role::User => Ok(()),
        Role::Admin if user.role.is_admin() => Ok(()),
        Role::Admin => Err(GuardError::Forbidden { required }),
    }
}

pub fn ensure_admin(user: &CurrentUser) -> Result<(), GuardError> {
    ensure_role(user, Role::Admin)
}
