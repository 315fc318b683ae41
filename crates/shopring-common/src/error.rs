//! Error types and error codes for shopring
//!
//! This module defines:
//! - `ShopringError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum ShopringError {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("shopping list '{0}' not found")]
    ListNotFound(String),

    #[error("shopping list '{0}' already exists")]
    ListAlreadyExists(String),

    #[error("product '{0}' not found")]
    ProductNotFound(String),

    #[error("product '{0}' already exists")]
    ProductAlreadyExists(String),

    #[error("server {0} is not a ring member")]
    ServerNotFound(u32),

    #[error("node '{0}' unavailable: {1}")]
    NodeUnavailable(String, String),

    #[error("hash ring is empty")]
    RingEmpty,

    #[error("malformed list content: {0}")]
    MalformedContent(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("{1}")]
    ApiError(i32, String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl ShopringError {
    /// Whether the error means a peer could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ShopringError::NodeUnavailable(..))
    }

    /// Whether the error, local or reported by a peer, means "no such resource"
    pub fn is_not_found(&self) -> bool {
        match self {
            ShopringError::ListNotFound(_)
            | ShopringError::ProductNotFound(_)
            | ShopringError::ServerNotFound(_) => true,
            ShopringError::ApiError(code, _) => *code == RESOURCE_NOT_FOUND.code,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ShopringError {
    fn from(e: serde_json::Error) -> Self {
        ShopringError::MalformedContent(e.to_string())
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const NODE_DOWN_FAILURE: ErrorCode<'static> = ErrorCode {
    code: 23002,
    message: "node down failure",
};

pub const RING_EMPTY: ErrorCode<'static> = ErrorCode {
    code: 23003,
    message: "hash ring is empty",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};
