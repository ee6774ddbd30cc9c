//! Request extractors whose rejections render as [`ApiError`].

use agencydesk_core::repository::Pagination;
use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Largest page a list endpoint returns.
pub const MAX_PAGE: u64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            offset: self.offset.unwrap_or(default.offset),
            limit: self.limit.unwrap_or(default.limit).clamp(1, MAX_PAGE),
        }
    }
}
