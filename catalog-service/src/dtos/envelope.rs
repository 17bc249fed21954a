use serde::Serialize;

pub const FETCHED_MESSAGE: &str = "Fetched successful!";
pub const CREATED_MESSAGE: &str = "Created successfully!";

/// Uniform wrapper for every successful product response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub skip: i64,
    pub total: u64,
}

impl<T> Envelope<T> {
    pub fn fetched(meta: PageMeta, data: T) -> Self {
        Self {
            success: true,
            status_code: 200,
            message: FETCHED_MESSAGE.to_string(),
            meta: Some(meta),
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            success: true,
            status_code: 200,
            message: CREATED_MESSAGE.to_string(),
            meta: None,
            data,
        }
    }
}
