// ============================================================================
// 购物清单 Commands
// ============================================================================

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::models::dtos::{Page, ShoppingSnapshot};
use crate::services::shopping_list::CLEAR_PROMPT;
use crate::services::view_router::shopping_rows;
use crate::state::{lock, SharedContext};
use crate::utils::error::AppResult;

#[derive(Deserialize)]
pub struct ToggleRequest {
    index: usize,
}

#[derive(Deserialize)]
pub struct ClearRequest {
    /// 用户在确认框中的选择
    confirmed: bool,
}

pub async fn get_shopping(State(ctx): State<SharedContext>) -> AppResult<Json<ShoppingSnapshot>> {
    let guard = lock(&ctx)?;
    Ok(Json(ShoppingSnapshot {
        items: shopping_rows(guard.shopping.items()),
        clear_prompt: CLEAR_PROMPT.to_string(),
    }))
}

/// 勾选/取消勾选一项；下标越界时什么也不做
pub async fn toggle_item(
    State(ctx): State<SharedContext>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<Json<Page>> {
    let mut guard = lock(&ctx)?;
    if !guard.shopping.toggle_item(req.index)? {
        log::debug!("忽略越界的勾选下标 {}", req.index);
    }
    Ok(Json(guard.page(false)))
}

/// 清空清单，用户未确认时保持不变
pub async fn clear_list(
    State(ctx): State<SharedContext>,
    Json(req): Json<ClearRequest>,
) -> AppResult<Json<Page>> {
    let mut guard = lock(&ctx)?;
    guard.shopping.clear(|_prompt| req.confirmed)?;
    Ok(Json(guard.page(false)))
}
