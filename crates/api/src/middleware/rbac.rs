//! Role gates layered on [`AuthUser`].
//!
//! Each gate authenticates first (401 on a missing or bad token) and then
//! checks the role (403). Facility scoping is a separate step: handlers call
//! [`AuthUser::ensure_facility`] once they know which facility the target
//! entity belongs to.
//!
//! ```ignore
//! async fn move_plant(RequireGrower(user): RequireGrower, ...) -> AppResult<...> { ... }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use canopy_core::error::CoreError;
use canopy_core::roles::{can_cultivate, is_known_role};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

macro_rules! role_gate {
    ($(#[$meta:meta])* $name:ident, $allowed:expr, $denied:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let user = AuthUser::from_request_parts(parts, state).await?;
                let allowed: fn(&AuthUser) -> bool = $allowed;
                if !allowed(&user) {
                    tracing::debug!(
                        user_id = user.user_id,
                        role = %user.role,
                        gate = stringify!($name),
                        "Role gate rejected request",
                    );
                    return Err(AppError::Core(CoreError::Forbidden($denied.into())));
                }
                Ok($name(user))
            }
        }
    };
}

role_gate!(
    /// Layout changes (facilities, rooms, racks, trays) and harvest review.
    RequireAdmin,
    AuthUser::is_admin,
    "Admin role required"
);

role_gate!(
    /// Cultivation writes: plants, tags, batches, harvests, strains, photos
    /// and notes.
    RequireGrower,
    |user| can_cultivate(&user.role),
    "Grower or Admin role required"
);

role_gate!(
    /// Any recognised role. Used by read endpoints.
    RequireAuth,
    |user| is_known_role(&user.role),
    "Unknown role"
);
