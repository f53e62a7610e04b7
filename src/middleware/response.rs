use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::pager::{continue_header, CONTINUE_HEADER};
use crate::store::SelectionPredicate;

/// Uniform success writer for every resource route.
///
/// A body renders as 200. Without a body the status follows the method:
/// 201 for POST and PUT, 204 for everything else.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Option<Value>,
    continue_token: Option<HeaderValue>,
}

impl ApiResponse {
    /// 200 with a JSON body
    pub fn ok<T: Serialize>(data: T) -> Result<Self, Error> {
        let body = serde_json::to_value(data).map_err(|e| {
            tracing::error!("failed to serialize response data: {}", e);
            Error::internal("failed to serialize response data")
        })?;
        Ok(Self {
            status: StatusCode::OK,
            body: Some(body),
            continue_token: None,
        })
    }

    /// Success with no result
    pub fn empty(method: &Method) -> Self {
        let status = if *method == Method::POST || *method == Method::PUT {
            StatusCode::CREATED
        } else {
            StatusCode::NO_CONTENT
        };
        Self {
            status,
            body: None,
            continue_token: None,
        }
    }

    /// One list page; the store's resume token travels in the `Continue` header
    pub fn page<T: Serialize>(items: Vec<T>, pred: &SelectionPredicate) -> Result<Self, Error> {
        let mut response = Self::ok(items)?;
        response.continue_token = continue_header(pred);
        Ok(response)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };
        if let Some(token) = self.continue_token {
            response.headers_mut().insert(CONTINUE_HEADER, token);
        }
        response
    }
}

pub type ApiResult = Result<ApiResponse, Error>;
