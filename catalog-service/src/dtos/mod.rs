pub mod envelope;
pub mod products;

pub use envelope::{Envelope, PageMeta};
pub use products::{bson_to_json, document_to_json, InsertResult, ProductQuery};
