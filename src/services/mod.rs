//! Typed data access, one service per entity. Services take a connection so
//! handlers can run them inside a user-scoped transaction; membership work
//! goes through the service-role pool.

pub mod client_service;
pub mod dashboard_service;
pub mod membership_service;
pub mod organization_service;
pub mod payment_service;
pub mod project_service;
pub mod task_service;

pub use client_service::ClientService;
pub use dashboard_service::DashboardService;
pub use membership_service::{MembershipService, PgMembershipStore};
pub use organization_service::OrganizationService;
pub use payment_service::PaymentService;
pub use project_service::ProjectService;
pub use task_service::TaskService;
