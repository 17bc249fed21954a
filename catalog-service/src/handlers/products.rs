use crate::dtos::{bson_to_json, document_to_json, Envelope, InsertResult, ProductQuery};
use crate::models::Product;
use crate::services::metrics::{record_product_created, record_product_query};
use crate::services::query::{ids_filter, parse_ids, search_filter};
use crate::services::{MongoDb, Pagination};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::Document;
use serde_json::Value;
use service_core::error::AppError;

type ProductPage = Json<Envelope<Vec<Value>>>;

/// `GET /products?page=&limit=&search=`
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<ProductPage, AppError> {
    let pagination = pagination(&state, &params);
    let filter = search_filter(params.search.as_deref());

    let db = state.store()?;
    record_product_query("list");
    fetch_page(db, filter, pagination).await
}

/// `POST /products`: bulk lookup when `?ids` is set, single insert otherwise.
pub async fn create_or_lookup_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;

    if params.wants_lookup() {
        Ok(lookup(&state, &params, body).await?.into_response())
    } else {
        Ok(create(&state, body).await?.into_response())
    }
}

/// `POST /products/lookup?page=&limit=` with a JSON array of ids.
pub async fn lookup_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ProductPage, AppError> {
    lookup(&state, &params, json_body(body)?).await
}

async fn lookup(
    state: &AppState,
    params: &ProductQuery,
    body: Value,
) -> Result<ProductPage, AppError> {
    let pagination = pagination(state, params);
    // Validate before touching the store so bad input is always a 400.
    let ids = parse_ids(&body)?;

    let db = state.store()?;
    record_product_query("lookup");
    fetch_page(db, ids_filter(&ids), pagination).await
}

async fn create(state: &AppState, body: Value) -> Result<Json<Envelope<InsertResult>>, AppError> {
    let product = to_product(body)?;

    let db = state.store()?;
    let inserted_id = db.insert(product).await?;
    record_product_created();

    tracing::info!(product_id = %inserted_id, "Product created");

    Ok(Json(Envelope::created(InsertResult {
        acknowledged: true,
        inserted_id: bson_to_json(inserted_id),
    })))
}

async fn fetch_page(
    db: &MongoDb,
    filter: Document,
    pagination: Pagination,
) -> Result<ProductPage, AppError> {
    let (products, total) = db.page(filter, &pagination).await?;

    tracing::debug!(
        page = pagination.page,
        limit = pagination.limit,
        returned = products.len(),
        total,
        "Fetched product page"
    );

    let data = products.into_iter().map(document_to_json).collect();
    Ok(Json(Envelope::fetched(pagination.meta(total), data)))
}

fn pagination(state: &AppState, params: &ProductQuery) -> Pagination {
    Pagination::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.config.pagination,
    )
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))
}

fn to_product(body: Value) -> Result<Product, AppError> {
    if !body.is_object() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Expected a JSON object describing the product"
        )));
    }

    mongodb::bson::to_document(&body).map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Product cannot be stored: {}", e))
    })
}
