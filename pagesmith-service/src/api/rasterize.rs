//! PDF rasterization API endpoints.
//!
//! Handlers accept a multipart upload (`file`, optional `dpi`) and return
//! rasterized pages as data-URI PNG payloads.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::rasterize::PageImage;

use super::AppState;

/// One rasterized page, image encoded as a data URI
#[derive(Serialize)]
pub struct PageImagePayload {
    pub page_number: u32,
    pub image: String,
}

impl From<&PageImage> for PageImagePayload {
    fn from(page: &PageImage) -> Self {
        Self {
            page_number: page.page_number,
            image: page.data_uri(),
        }
    }
}

/// Response for full-document rasterization
#[derive(Serialize)]
pub struct RasterizeResponse {
    pub page_count: usize,
    pub pages: Vec<PageImagePayload>,
}

struct Upload {
    data: Vec<u8>,
    dpi: u32,
}

async fn read_upload(state: &AppState, multipart: &mut Multipart) -> ServiceResult<Upload> {
    let mut data: Option<Vec<u8>> = None;
    let mut dpi = state.rasterizer.default_dpi();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::InvalidArgument {
                        message: e.to_string(),
                    })?;
                data = Some(bytes.to_vec());
            }
            "dpi" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::InvalidArgument {
                        message: e.to_string(),
                    })?;
                dpi = parse_dpi(&text)?;
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| ServiceError::InvalidArgument {
        message: "No file provided".to_string(),
    })?;

    Ok(Upload { data, dpi })
}

/// Parse a dpi form field, rejecting non-positive and non-numeric values.
fn parse_dpi(text: &str) -> ServiceResult<u32> {
    match text.trim().parse::<i64>() {
        Ok(dpi) if dpi > 0 && dpi <= i64::from(u32::MAX) => Ok(dpi as u32),
        _ => Err(ServiceError::InvalidArgument {
            message: format!("dpi must be a positive integer, got '{text}'"),
        }),
    }
}

/// Rasterize every page of an uploaded PDF
pub async fn rasterize_document_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<RasterizeResponse>, ServiceError> {
    let upload = read_upload(&state, &mut multipart).await?;

    let pages = state
        .rasterizer
        .rasterize_all(&upload.data, upload.dpi)
        .await?;

    Ok(Json(RasterizeResponse {
        page_count: pages.len(),
        pages: pages.iter().map(PageImagePayload::from).collect(),
    }))
}

/// Rasterize a single 1-indexed page of an uploaded PDF
pub async fn rasterize_single_page_handler(
    State(state): State<Arc<AppState>>,
    Path(page): Path<u32>,
    mut multipart: Multipart,
) -> Result<Json<PageImagePayload>, ServiceError> {
    let upload = read_upload(&state, &mut multipart).await?;

    let image = state
        .rasterizer
        .rasterize_page(&upload.data, page, upload.dpi)
        .await?;

    Ok(Json(PageImagePayload::from(&image)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dpi_accepts_positive_integers() {
        assert_eq!(parse_dpi("150").unwrap(), 150);
        assert_eq!(parse_dpi(" 300 ").unwrap(), 300);
    }

    #[test]
    fn parse_dpi_rejects_non_positive_and_garbage() {
        assert!(parse_dpi("0").is_err());
        assert!(parse_dpi("-5").is_err());
        assert!(parse_dpi("150.5").is_err());
        assert!(parse_dpi("high").is_err());
        assert!(parse_dpi("").is_err());
    }

    #[test]
    fn page_payload_serializes_with_data_uri() {
        let payload = PageImagePayload::from(&PageImage {
            page_number: 2,
            png: b"png".to_vec(),
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["page_number"], 2);
        assert_eq!(value["image"], "data:image/png;base64,cG5n");
    }
}
