use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::{
        catalog::DEFAULT_PAGE_SIZE,
        job::{JobFilters, JobRecord, JobService},
        ratelimit::{Admission, RateLimiter},
        speech::SpeakRequest,
    },
    error::{AppError, AppResult},
    infrastructure::auth::AuthUser,
};

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobListParams {
    pub user: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub results: Vec<JobRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

pub struct JobsController {
    job_service: Arc<JobService>,
    rate_limiter: Arc<RateLimiter>,
}

impl JobsController {
    pub fn new(job_service: Arc<JobService>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            job_service,
            rate_limiter,
        }
    }

    /// POST /speak-async - Enqueue a synthesis job
    pub async fn submit(
        State(controller): State<Arc<JobsController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<SpeakRequest>,
    ) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
        if controller.rate_limiter.admit(&auth_user.username) == Admission::RateLimited {
            return Err(AppError::RateLimited(
                "too many requests, slow down".to_string(),
            ));
        }

        let job_id = controller
            .job_service
            .submit(&auth_user.username, &auth_user.tenant, request)
            .await?;
        Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
    }

    /// GET /job/{id} - Poll one job's reconciled status
    pub async fn get_job(
        State(controller): State<Arc<JobsController>>,
        Path(job_id): Path<String>,
    ) -> AppResult<Json<JobRecord>> {
        let record = controller.job_service.poll(&job_id).await?;
        Ok(Json(record))
    }

    /// GET /jobs - Paginated job history
    pub async fn list_jobs(
        State(controller): State<Arc<JobsController>>,
        Query(params): Query<JobListParams>,
    ) -> AppResult<Json<JobListResponse>> {
        let filters = JobFilters {
            user: params.user,
            status: params.status,
        };
        let page = params.page.unwrap_or(1).max(1);
        let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

        let (results, total) = controller.job_service.list(&filters, page, page_size).await?;
        Ok(Json(JobListResponse {
            results,
            total,
            page,
            page_size,
        }))
    }
}
