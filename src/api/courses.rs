//! Course API endpoints.

use axum::extract::{Path, Query, State};

use super::{created, parse_id, success, ApiJson, ApiResponse, ApiResult, MessageResponse};
use crate::errors::AppError;
use crate::filters::{read_csv, read_string, Filters, QueryParams};
use crate::models::{
    validate_course, Course, CreateCourseRequest, UpdateCourseRequest, COURSE_SORT_SAFE_LIST,
};
use crate::validator::Validator;
use crate::AppState;

/// GET /v1/courses - List courses with search, sorting and pagination.
pub async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<Course>> {
    let title = read_string(&params, "title", "");
    let lectures = read_csv(&params, "lectures");
    let filters =
        Filters::from_query(&params, COURSE_SORT_SAFE_LIST).map_err(AppError::Validation)?;
    tracing::debug!(sort = filters.sort(), page = filters.page(), "listing courses");

    let (courses, metadata) = state.repo.list_courses(&title, &lectures, &filters).await?;
    Ok(ApiResponse::new(courses).with_metadata(metadata))
}

/// GET /v1/courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Course> {
    let id = parse_id(&id)?;
    success(state.repo.get_course(id).await?)
}

/// POST /v1/courses
pub async fn create_course(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> ApiResult<Course> {
    let mut v = Validator::new();
    let course = request.into_course(&mut v);
    validate_course(&mut v, &course);
    v.finish().map_err(AppError::Validation)?;

    let course = state.repo.insert_course(&course).await?;
    tracing::info!(id = course.id, "course created");

    let location = format!("/v1/courses/{}", course.id);
    created(course, location)
}

/// PATCH /v1/courses/{id} - Partial update guarded by the record version.
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCourseRequest>,
) -> ApiResult<Course> {
    let id = parse_id(&id)?;
    let mut course = state.repo.get_course(id).await?;

    if let Some(expected) = request.expected_version {
        if expected != course.version {
            return Err(AppError::EditConflict);
        }
    }

    course.apply(request);

    let mut v = Validator::new();
    validate_course(&mut v, &course);
    v.finish().map_err(AppError::Validation)?;

    success(state.repo.update_course(&course).await?)
}

/// DELETE /v1/courses/{id}
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;
    state.repo.delete_course(id).await?;
    success(MessageResponse::new("course successfully deleted"))
}
