use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Attachment, CreateFeedItemRequest, FeedItemView, TypeClass},
    error::{AppError, Result},
};

/// Response header carrying page metadata, so the body stays a plain array.
pub const PAGINATION_HEADER: &str = "x-pagination";

/// Paging values stay raw strings so that blank or malformed ones fall back
/// to the defaults instead of failing extraction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub page_number: Option<String>,
    pub page_size: Option<String>,
    pub type_filter: Option<String>,
}

fn paging_value(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<FeedQuery>,
) -> Result<(HeaderMap, Json<Vec<FeedItemView>>)> {
    let service = &state.service_context.feed_query_service;
    let request = service.page_request(
        paging_value(params.page_number.as_deref()),
        paging_value(params.page_size.as_deref()),
    );
    let type_class = params.type_filter.as_deref().and_then(TypeClass::parse);

    let page = service.get_page(&user.user_name, type_class, request).await?;

    let metadata = serde_json::to_string(&page.metadata())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(
        PAGINATION_HEADER,
        HeaderValue::from_str(&metadata).map_err(|e| AppError::Internal(e.to_string()))?,
    );

    Ok((headers, Json(page.items)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FeedItemView>)> {
    let request = parse_create_form(&mut multipart).await?;

    let created = state
        .service_context
        .feed_creation_service
        .create(request, &user.user_name)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state
        .service_context
        .feed_creation_service
        .delete(id, &user.user_name)
        .await?;

    Ok(Json(json!({ "message": "Feed item deleted successfully." })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state
        .service_context
        .read_receipt_service
        .mark_read(id, user.user_id)
        .await?;

    Ok(Json(json!({ "message": "Marked as read." })))
}

pub async fn mark_unread(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state
        .service_context
        .read_receipt_service
        .mark_unread(id, user.user_id)
        .await?;

    Ok(Json(json!({ "message": "Marked as unread." })))
}

async fn parse_create_form(multipart: &mut Multipart) -> Result<CreateFeedItemRequest> {
    let mut request = CreateFeedItemRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "kind" | "type" => request.kind = field_text(field).await?,
            "title" => request.title = field_text(field).await?,
            "message" => request.message = field_text(field).await?,
            "audience" => {
                let audience = field_text(field).await?;
                request.audience = Some(audience).filter(|a| !a.trim().is_empty());
            }
            "moduleId" => {
                let raw = field_text(field).await?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let module_id = raw
                        .parse::<i64>()
                        .map_err(|_| AppError::BadRequest(format!("Invalid moduleId: {}", raw)))?;
                    request.module_id = Some(module_id);
                }
            }
            "image" | "attachment" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid attachment: {}", e)))?;
                if !file_name.is_empty() && !data.is_empty() {
                    request.attachment = Some(Attachment {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    if request.kind.trim().is_empty() {
        return Err(AppError::BadRequest("kind is required".to_string()));
    }

    Ok(request)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e)))
}
