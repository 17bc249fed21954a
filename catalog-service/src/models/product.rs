use mongodb::bson::Document;

/// A catalog entry. Products are schemaless: apart from the store-assigned
/// `_id`, every field is whatever the client sent at creation time.
pub type Product = Document;

/// Field matched by free-text search.
pub const NAME_FIELD: &str = "name";
