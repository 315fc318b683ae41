//! Response envelope shared by routers and servers

use actix_web::{
    HttpResponse, HttpResponseBuilder,
    error::InternalError,
    http::StatusCode,
    web::{JsonConfig, QueryConfig},
};
use serde::{Deserialize, Serialize};
use shopring_common::{ShopringError, error};

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: error::SUCCESS.code,
            message: error::SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }

    pub fn http_response(
        status: u16,
        code: i32,
        message: String,
        data: impl Serialize,
    ) -> HttpResponse {
        HttpResponseBuilder::new(StatusCode::from_u16(status).unwrap_or_default())
            .json(Result::new(code, message, data))
    }

    /// Unwrap the payload of a decoded envelope, turning error codes into errors
    pub fn into_data(self) -> std::result::Result<T, ShopringError> {
        if self.code == error::SUCCESS.code {
            Ok(self.data)
        } else {
            Err(ShopringError::ApiError(self.code, self.message))
        }
    }
}

/// Map an application error onto an HTTP status and error code
pub fn http_error(err: &ShopringError) -> HttpResponse {
    let (status, code) = match err {
        ShopringError::IllegalArgument(_) => (400, error::PARAMETER_VALIDATE_ERROR.code),
        ShopringError::MalformedContent(_) => (400, error::PARAMETER_VALIDATE_ERROR.code),
        ShopringError::ListNotFound(_)
        | ShopringError::ProductNotFound(_)
        | ShopringError::ServerNotFound(_) => (404, error::RESOURCE_NOT_FOUND.code),
        ShopringError::ListAlreadyExists(_) | ShopringError::ProductAlreadyExists(_) => {
            (409, error::RESOURCE_CONFLICT.code)
        }
        ShopringError::NodeUnavailable(..) => (503, error::NODE_DOWN_FAILURE.code),
        ShopringError::RingEmpty => (503, error::RING_EMPTY.code),
        ShopringError::ApiError(code, _) => (status_for_code(*code), *code),
        _ => (500, error::SERVER_ERROR.code),
    };
    Result::<()>::http_response(status, code, err.to_string(), ())
}

/// Map an `anyhow` failure, keeping the status of a wrapped [`ShopringError`]
pub fn http_failure(err: &anyhow::Error) -> HttpResponse {
    match err.downcast_ref::<ShopringError>() {
        Some(e) => http_error(e),
        None => http_error(&ShopringError::InternalError(err.to_string())),
    }
}

fn status_for_code(code: i32) -> u16 {
    match code {
        c if c == error::PARAMETER_MISSING.code || c == error::PARAMETER_VALIDATE_ERROR.code => 400,
        c if c == error::RESOURCE_NOT_FOUND.code => 404,
        c if c == error::RESOURCE_CONFLICT.code => 409,
        c if c == error::NODE_DOWN_FAILURE.code || c == error::RING_EMPTY.code => 503,
        _ => 500,
    }
}

/// 400 response for a missing request field
pub fn http_parameter_missing(name: &str) -> HttpResponse {
    Result::<()>::http_response(
        400,
        error::PARAMETER_MISSING.code,
        format!("Required parameter '{}' is missing", name),
        (),
    )
}

fn bad_request_code(message: &str) -> i32 {
    if message.contains("missing field") {
        error::PARAMETER_MISSING.code
    } else {
        error::PARAMETER_VALIDATE_ERROR.code
    }
}

/// JSON extractor settings answering bad bodies with the envelope
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        let response = Result::<()>::http_response(400, bad_request_code(&message), message, ());
        InternalError::from_response(err, response).into()
    })
}

/// Query extractor settings answering bad parameters with the envelope
pub fn query_config() -> QueryConfig {
    QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        let response = Result::<()>::http_response(400, bad_request_code(&message), message, ());
        InternalError::from_response(err, response).into()
    })
}
