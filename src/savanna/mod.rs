/// Savanna cluster-management API client implementation
pub mod client;
pub mod models;
pub mod roles;

pub use client::{Outcome, SavannaClient};
