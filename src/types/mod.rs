//! Public types for the Huginn API.

mod resource;

pub use resource::{CacheKey, ResourceKind};
