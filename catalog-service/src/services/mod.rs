pub mod database;
pub mod metrics;
pub mod query;

pub use database::MongoDb;
pub use metrics::{get_metrics, init_metrics};
pub use query::Pagination;
