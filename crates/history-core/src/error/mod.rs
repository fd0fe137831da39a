//! Error types for the domain layer

mod domain_error;
mod fetch_error;

pub use domain_error::DomainError;
pub use fetch_error::FetchError;
