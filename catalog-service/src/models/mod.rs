pub mod product;

pub use product::{Product, NAME_FIELD};
