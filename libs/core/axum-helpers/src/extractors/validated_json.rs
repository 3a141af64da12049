//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed `validator::Validate`.
///
/// Malformed JSON is rejected through [`AppError::JsonExtractorRejection`];
/// constraint violations through [`AppError::ValidationError`], which puts the
/// per-field errors in `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct UpdateCount {
///     #[validate(range(min = 0.0))]
///     count: f64,
/// }
///
/// async fn update(ValidatedJson(body): ValidatedJson<UpdateCount>) -> String {
///     body.count.to_string()
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
