//! Instructor API endpoints.

use axum::extract::{Path, Query, State};

use super::{created, parse_id, success, ApiJson, ApiResponse, ApiResult, MessageResponse};
use crate::errors::AppError;
use crate::filters::{read_string, Filters, QueryParams};
use crate::models::{
    validate_instructor, CreateInstructorRequest, Instructor, UpdateInstructorRequest,
    INSTRUCTOR_SORT_SAFE_LIST,
};
use crate::validator::Validator;
use crate::AppState;

/// GET /v1/instructors
pub async fn list_instructors(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<Instructor>> {
    let first_name = read_string(&params, "first_name", "");
    let last_name = read_string(&params, "last_name", "");
    let filters =
        Filters::from_query(&params, INSTRUCTOR_SORT_SAFE_LIST).map_err(AppError::Validation)?;
    tracing::debug!(sort = filters.sort(), page = filters.page(), "listing instructors");

    let (instructors, metadata) = state
        .repo
        .list_instructors(&first_name, &last_name, &filters)
        .await?;
    Ok(ApiResponse::new(instructors).with_metadata(metadata))
}

/// GET /v1/instructors/{id}
pub async fn get_instructor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Instructor> {
    let id = parse_id(&id)?;
    success(state.repo.get_instructor(id).await?)
}

/// POST /v1/instructors
pub async fn create_instructor(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateInstructorRequest>,
) -> ApiResult<Instructor> {
    let instructor = Instructor::from(request);

    let mut v = Validator::new();
    validate_instructor(&mut v, &instructor);
    v.finish().map_err(AppError::Validation)?;

    let instructor = state.repo.insert_instructor(&instructor).await?;
    let location = format!("/v1/instructors/{}", instructor.id);
    created(instructor, location)
}

/// PATCH /v1/instructors/{id}
pub async fn update_instructor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateInstructorRequest>,
) -> ApiResult<Instructor> {
    let id = parse_id(&id)?;
    let mut instructor = state.repo.get_instructor(id).await?;

    if request
        .expected_version
        .is_some_and(|expected| expected != instructor.version)
    {
        return Err(AppError::EditConflict);
    }
    instructor.apply(request);

    let mut v = Validator::new();
    validate_instructor(&mut v, &instructor);
    v.finish().map_err(AppError::Validation)?;

    success(state.repo.update_instructor(&instructor).await?)
}

/// DELETE /v1/instructors/{id}
pub async fn delete_instructor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;
    state.repo.delete_instructor(id).await?;
    success(MessageResponse::new("instructor successfully deleted"))
}
