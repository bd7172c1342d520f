use super::response::{ApiError, GenerateLookResponse, SessionResponse, UserResponse};
use super::AppState;
use crate::auth::{LoginInput, RegisterInput};
use crate::models::{GarmentCategory, UserProfile};
use crate::tryon::{TryOnRequest, UploadedImage};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use tracing::{info, warn};

const SUBJECT_FIELD: &str = "userImage";
const GARMENT_FIELD: &str = "clothesImage";
const CATEGORY_FIELD: &str = "pieceType";

fn multipart_error(err: MultipartError) -> ApiError {
    warn!("Malformed multipart body: {}", err);
    ApiError::new(err.status(), err.body_text())
}

fn upload(bytes: axum::body::Bytes, content_type: Option<String>) -> Option<UploadedImage> {
    (!bytes.is_empty()).then(|| UploadedImage {
        bytes: bytes.to_vec(),
        content_type,
    })
}

pub async fn generate_look(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateLookResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected generate-look body: {}", e);
        ApiError::bad_request("Expected a multipart/form-data body.")
    })?;

    let mut subject = None;
    let mut garment = None;
    let mut category = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        match name.as_deref() {
            Some(SUBJECT_FIELD) => {
                subject = upload(field.bytes().await.map_err(multipart_error)?, content_type);
            }
            Some(GARMENT_FIELD) => {
                garment = upload(field.bytes().await.map_err(multipart_error)?, content_type);
            }
            Some(CATEGORY_FIELD) => {
                category = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let category = category
        .as_deref()
        .map(GarmentCategory::from_label)
        .unwrap_or_default();

    info!(
        "generate-look: pieceType={}, userImage={}, clothesImage={}",
        category,
        subject.is_some(),
        garment.is_some()
    );

    let (Some(subject_image), Some(garment_image)) = (subject, garment) else {
        warn!("generate-look rejected: missing images");
        return Err(ApiError::bad_request(
            "Missing images (userImage or clothesImage).",
        ));
    };

    let result = state
        .looks
        .generate(TryOnRequest {
            category,
            subject_image,
            garment_image,
        })
        .await?;

    Ok(Json(result.into()))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!("Rejected JSON body: {}", e);
        ApiError::bad_request("Invalid JSON body.")
    })
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.auth.register(json_body(payload)?).await?;
    Ok(Json(session.into()))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.auth.login(json_body(payload)?).await?;
    Ok(Json(session.into()))
}

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse<UserProfile>>, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user = state.auth.current_user(authorization).await?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}
