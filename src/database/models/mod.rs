pub mod client;
pub mod membership;
pub mod organization;
pub mod payment;
pub mod profile;
pub mod project;
pub mod task;

pub use client::Client;
pub use membership::{Membership, TeamMember};
pub use organization::Organization;
pub use payment::Payment;
pub use profile::Profile;
pub use project::Project;
pub use task::Task;
