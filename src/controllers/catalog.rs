use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::catalog::{
        BatchAction, BatchOutcome, CatalogEntry, CatalogFilters, CatalogService, CatalogUpdate,
        DEFAULT_PAGE_SIZE,
    },
    error::AppResult,
};

#[derive(Debug, Deserialize)]
pub struct CatalogQueryParams {
    pub user: Option<String>,
    pub tenant: Option<String>,
    pub date: Option<String>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub export: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub results: Vec<CatalogEntry>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub action: BatchAction,
    pub indices: Vec<usize>,
    pub update: Option<CatalogUpdate>,
}

#[derive(Debug, Serialize)]
pub struct BatchEditResponse {
    pub updated: usize,
}

pub struct CatalogController {
    catalog_service: Arc<CatalogService>,
}

impl CatalogController {
    pub fn new(catalog_service: Arc<CatalogService>) -> Self {
        Self { catalog_service }
    }

    /// GET /catalog - Filterable, paginated listing; `?export=csv` streams
    /// the full filtered set instead
    pub async fn list(
        State(controller): State<Arc<CatalogController>>,
        Query(params): Query<CatalogQueryParams>,
    ) -> AppResult<axum::response::Response> {
        let filters = CatalogFilters {
            user: params.user,
            tenant: params.tenant,
            date: params.date,
            format: params.format,
            title: params.title,
        };

        if params.export.as_deref() == Some("csv") {
            let bytes = controller.catalog_service.export_csv(&filters).await?;
            return Ok(csv_response("catalog.csv", bytes));
        }

        let page = params.page.unwrap_or(1).max(1);
        let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let (results, total) = controller
            .catalog_service
            .query(&filters, page, page_size)
            .await?;

        Ok(axum::response::IntoResponse::into_response(Json(
            CatalogListResponse {
                results,
                total,
                page,
                page_size,
            },
        )))
    }

    /// PUT /catalog/{index} - Update declared fields on a row by ordinal
    pub async fn update(
        State(controller): State<Arc<CatalogController>>,
        Path(index): Path<usize>,
        Json(update): Json<CatalogUpdate>,
    ) -> AppResult<Json<CatalogEntry>> {
        let entry = controller
            .catalog_service
            .update_by_index(index, update)
            .await?;
        Ok(Json(entry))
    }

    /// DELETE /catalog/{index} - Remove a row and its audio file by ordinal
    pub async fn delete(
        State(controller): State<Arc<CatalogController>>,
        Path(index): Path<usize>,
    ) -> AppResult<StatusCode> {
        controller.catalog_service.delete_by_index(index).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// POST /catalog/batch - Zip download, CSV export or bulk edit over a
    /// set of ordinals
    pub async fn batch(
        State(controller): State<Arc<CatalogController>>,
        Json(request): Json<BatchRequest>,
    ) -> AppResult<axum::response::Response> {
        let outcome = controller
            .catalog_service
            .batch(request.action, &request.indices, request.update)
            .await?;

        Ok(match outcome {
            BatchOutcome::Zip(bytes) => {
                let mut headers = HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, "application/zip".parse().unwrap());
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"catalog_batch.zip\"".parse().unwrap(),
                );
                axum::response::IntoResponse::into_response((
                    StatusCode::OK,
                    headers,
                    Body::from(bytes),
                ))
            }
            BatchOutcome::Csv(bytes) => csv_response("catalog_batch.csv", bytes),
            BatchOutcome::Edited(updated) => {
                axum::response::IntoResponse::into_response(Json(BatchEditResponse { updated }))
            }
        })
    }
}

fn csv_response(filename: &str, bytes: Vec<u8>) -> axum::response::Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, "text/csv".parse().unwrap());
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", filename)
            .parse()
            .unwrap(),
    );
    axum::response::IntoResponse::into_response((StatusCode::OK, headers, Body::from(bytes)))
}
