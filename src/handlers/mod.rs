// Handlers by access tier:
//   public    - no session needed (/health, /api/auth/logout)
//   pages     - view models for the routed pages, behind the access policy
//   protected - /api/* endpoints, each guarded by a role extractor
pub mod pages;
pub mod protected;
pub mod public;
