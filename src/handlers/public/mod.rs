pub mod health;
pub mod logout;

use crate::error::ApiError;

pub use health::health;
pub use logout::logout;

/// Unmatched paths; registered as the router fallback so the access policy
/// still sees them.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
