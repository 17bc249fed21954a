//! Translation of request parameters into store queries.
//!
//! Everything here is pure so the handlers stay thin and the rules can be
//! tested without a running store.

use crate::config::PaginationConfig;
use crate::dtos::PageMeta;
use crate::models::{Product, NAME_FIELD};
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde_json::Value;
use service_core::error::AppError;

/// A validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Missing, non-integer and zero values fall back to the defaults; the
    /// result is then clamped to `page >= 1` and `1 <= limit <= max_limit`.
    pub fn from_params(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Self {
        let page = coerce(page).unwrap_or(1).max(1);
        let limit = coerce(limit)
            .unwrap_or(config.default_limit)
            .clamp(1, config.max_limit);

        Self { page, limit }
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            page: self.page,
            limit: self.limit,
            skip: self.skip(),
            total,
        }
    }
}

/// Integers, plus whole numbers written as floats or exponents (`2.0`,
/// `1e2`). Fractions, unparsable input and zero yield `None`.
fn coerce(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let v = raw.parse::<f64>().ok()?;
            if !v.is_finite() || v.fract() != 0.0 || v.abs() >= i64::MAX as f64 {
                return None;
            }
            v as i64
        }
    };
    Some(value).filter(|v| *v != 0)
}

/// Case-insensitive substring match on the product name. The input is
/// escaped, so `.` or `(` match literally.
pub fn search_filter(search: Option<&str>) -> Document {
    let mut filter = Document::new();

    if let Some(term) = search.filter(|term| !term.is_empty()) {
        filter.insert(
            NAME_FIELD,
            doc! { "$regex": regex::escape(term), "$options": "i" },
        );
    }

    filter
}

/// Parses a JSON array of 24-hex-character identifiers, failing on the
/// first entry that is not one.
pub fn parse_ids(body: &Value) -> Result<Vec<ObjectId>, AppError> {
    let items = body.as_array().ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Expected a JSON array of product ids"))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .and_then(|raw| ObjectId::parse_str(raw).ok())
                .ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "Invalid product id at index {}: {}",
                        index,
                        item
                    ))
                })
        })
        .collect()
}

pub fn ids_filter(ids: &[ObjectId]) -> Document {
    doc! { "_id": { "$in": ids.to_vec() } }
}

/// Single aggregation returning one page and the total match count from the
/// same snapshot, so `meta.total` and `data` cannot disagree.
pub fn paged_pipeline(filter: Document, pagination: &Pagination) -> Vec<Document> {
    vec![
        doc! { "$match": filter },
        doc! { "$sort": { "_id": 1 } },
        doc! {
            "$facet": {
                "data": [
                    { "$skip": pagination.skip() },
                    { "$limit": pagination.limit },
                ],
                "total": [ { "$count": "count" } ],
            }
        },
    ]
}

/// Unpacks the single document produced by [`paged_pipeline`]. An empty
/// match yields `total: []`, which reads as zero.
pub fn split_facet(facet: Document) -> (Vec<Product>, u64) {
    let data: Vec<Product> = facet
        .get_array("data")
        .map(|items| {
            items
                .iter()
                .filter_map(Bson::as_document)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let total = facet
        .get_array("total")
        .ok()
        .and_then(|counts| counts.first())
        .and_then(Bson::as_document)
        .and_then(|count| match count.get("count") {
            Some(Bson::Int32(n)) => u64::try_from(*n).ok(),
            Some(Bson::Int64(n)) => u64::try_from(*n).ok(),
            _ => None,
        })
        .unwrap_or(0);

    (data, total)
}
