pub mod check_access;
pub mod migrate;
pub mod serve;
