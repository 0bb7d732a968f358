pub mod access;
pub mod extract;
pub mod input;
pub mod response;

pub use access::access_policy_middleware;
pub use extract::{CurrentSession, ManagerAccess, MemberAccess, OwnerAccess};
pub use input::{Json, Path, Query};
pub use response::{ApiResponse, ApiResult};
