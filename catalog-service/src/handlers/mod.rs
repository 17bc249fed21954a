pub mod health;
pub mod products;

pub use health::{health_check, liveness, metrics_endpoint, readiness_check};
pub use products::{create_or_lookup_products, list_products, lookup_products};
