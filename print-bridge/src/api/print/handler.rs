//! Print API Handlers
//!
//! Every handler follows the same order: request shape, label content,
//! printer resolution, then the device. Nothing reaches the printer until
//! the whole request has passed validation.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
};
use kiosk_printer::zpl;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::ServerState;
use crate::printing::test_label;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};

/// Upper bound on `copies`
pub const MAX_COPIES: i64 = 100;

/// Upper bound on `labelContents` length
pub const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub printer_name: Option<String>,
    pub label_content: Option<String>,
    pub copies: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPrintRequest {
    pub printer_name: Option<String>,
    pub label_contents: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPrintRequest {
    pub printer_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOutcome {
    pub printer_name: String,
    pub copies: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub printer_name: String,
    pub printed: usize,
}

/// POST /print - print one label `copies` times
pub async fn print(
    State(state): State<ServerState>,
    payload: Result<Json<PrintRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<PrintOutcome>>> {
    let Json(req) = payload?;

    let content = req
        .label_content
        .ok_or_else(|| AppError::required_field("labelContent"))?;
    let copies = validate_copies(req.copies)?;
    zpl::security_valid(&content)?;

    let printer = state
        .print_service
        .resolve_printer(req.printer_name.as_deref())
        .await?;

    let label: Arc<str> = Arc::from(content);
    let printed = state
        .print_service
        .print_sequence(&printer, vec![label; copies], &state.request_token())
        .await?;

    info!(printer = %printer, copies = printed, "Label printed");
    Ok(ok(PrintOutcome {
        printer_name: printer,
        copies: printed,
    }))
}

/// POST /print/batch - print every label in order, or none if any is invalid
pub async fn print_batch(
    State(state): State<ServerState>,
    payload: Result<Json<BatchPrintRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<BatchOutcome>>> {
    let Json(req) = payload?;

    let contents = req
        .label_contents
        .ok_or_else(|| AppError::required_field("labelContents"))?;
    validate_batch_size(contents.len())?;

    for (index, content) in contents.iter().enumerate() {
        zpl::security_valid(content).map_err(|e| {
            let err = AppError::from(e);
            let message = format!("labelContents[{}]: {}", index, err.message);
            AppError {
                message,
                ..err
            }
            .with_detail("index", index)
        })?;
    }

    let printer = state
        .print_service
        .resolve_printer(req.printer_name.as_deref())
        .await?;

    let labels: Vec<Arc<str>> = contents.into_iter().map(Arc::from).collect();
    let printed = state
        .print_service
        .print_sequence(&printer, labels, &state.request_token())
        .await?;

    info!(printer = %printer, printed, "Batch printed");
    Ok(ok(BatchOutcome {
        printer_name: printer,
        printed,
    }))
}

/// POST /print/test - print a synthesized label; the body is optional
pub async fn print_test(
    State(state): State<ServerState>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<PrintOutcome>>> {
    let req = parse_optional_body(&body)?;

    let content = test_label();
    zpl::security_valid(&content)?;

    let printer = state
        .print_service
        .resolve_printer(req.printer_name.as_deref())
        .await?;

    let printed = state
        .print_service
        .print_sequence(&printer, vec![Arc::from(content)], &state.request_token())
        .await?;

    info!(printer = %printer, "Test label printed");
    Ok(ok(PrintOutcome {
        printer_name: printer,
        copies: printed,
    }))
}

fn validate_copies(copies: Option<i64>) -> AppResult<usize> {
    let copies = copies.unwrap_or(1);
    if !(1..=MAX_COPIES).contains(&copies) {
        return Err(AppError::with_message(
            ErrorCode::CopiesOutOfRange,
            format!("copies must be between 1 and {}, got {}", MAX_COPIES, copies),
        )
        .with_detail("min", 1)
        .with_detail("max", MAX_COPIES)
        .with_detail("actual", copies));
    }
    // In range, so it fits
    Ok(copies as usize)
}

fn validate_batch_size(len: usize) -> AppResult<()> {
    if len == 0 {
        return Err(AppError::with_message(
            ErrorCode::BatchEmpty,
            "labelContents must contain at least one label",
        ));
    }
    if len > MAX_BATCH_SIZE {
        return Err(AppError::with_message(
            ErrorCode::BatchTooLarge,
            format!(
                "labelContents may contain at most {} labels, got {}",
                MAX_BATCH_SIZE, len
            ),
        )
        .with_detail("max", MAX_BATCH_SIZE)
        .with_detail("actual", len));
    }
    Ok(())
}

fn parse_optional_body(body: &[u8]) -> AppResult<TestPrintRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TestPrintRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_format(format!("Failed to parse the request body as JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_bounds() {
        assert_eq!(validate_copies(None).unwrap(), 1);
        assert_eq!(validate_copies(Some(1)).unwrap(), 1);
        assert_eq!(validate_copies(Some(100)).unwrap(), 100);

        for bad in [0, -3, 101] {
            let err = validate_copies(Some(bad)).unwrap_err();
            assert_eq!(err.code, ErrorCode::CopiesOutOfRange);
            assert!(err.message.contains(&bad.to_string()));
        }
    }

    #[test]
    fn test_batch_size_bounds() {
        assert_eq!(validate_batch_size(0).unwrap_err().code, ErrorCode::BatchEmpty);
        assert!(validate_batch_size(1).is_ok());
        assert!(validate_batch_size(MAX_BATCH_SIZE).is_ok());

        let err = validate_batch_size(MAX_BATCH_SIZE + 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::BatchTooLarge);
        assert!(err.message.contains("50"));
        assert!(err.message.contains("51"));
    }

    #[test]
    fn test_optional_body() {
        assert!(parse_optional_body(b"").unwrap().printer_name.is_none());
        assert!(parse_optional_body(b"  \n").unwrap().printer_name.is_none());
        assert!(parse_optional_body(b"{}").unwrap().printer_name.is_none());
        assert_eq!(
            parse_optional_body(br#"{"printerName":"Lobby"}"#)
                .unwrap()
                .printer_name
                .as_deref(),
            Some("Lobby")
        );
        assert_eq!(
            parse_optional_body(b"{not json").unwrap_err().code,
            ErrorCode::InvalidFormat
        );
    }
}
