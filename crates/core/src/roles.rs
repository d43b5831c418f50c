//! Well-known role name constants.
//!
//! Roles arrive in the identity token issued by the platform's auth service.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_GROWER: &str = "grower";
pub const ROLE_VIEWER: &str = "viewer";

/// Whether the role may perform mutating cultivation operations.
pub fn can_cultivate(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_GROWER
}

/// Whether the role is one this service understands at all.
pub fn is_known_role(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_GROWER | ROLE_VIEWER)
}
