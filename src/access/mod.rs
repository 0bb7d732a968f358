//! Role-based access control: route classification, the redirect policy for
//! page routes, per-request session resolution, and the authorization check
//! shared by the API endpoints.

pub mod authorize;
pub mod policy;
pub mod routes;
pub mod session;

pub use authorize::{authorize, Authorization, Requirement};
pub use policy::{AccessPolicy, Decision, SessionState, UnknownRolePolicy};
pub use routes::{RedirectTarget, RouteClass, RouteTable};
pub use session::{
    resolve_request, MembershipLookup, MembershipStore, ResolvedSession, SessionResolver, SessionUser,
};
