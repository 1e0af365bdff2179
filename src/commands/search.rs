// ============================================================================
// 搜索 Commands
// 输入只负责启动防抖，结果由前端轮询 GET /search 获取
// ============================================================================

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::models::dtos::{DetailSnapshot, SearchSnapshot};
use crate::state::{self, lock, SharedContext};
use crate::utils::error::AppResult;

#[derive(Deserialize)]
pub struct InputRequest {
    query: String,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    recipe_id: i64,
}

pub async fn get_search(State(ctx): State<SharedContext>) -> AppResult<Json<SearchSnapshot>> {
    let guard = lock(&ctx)?;
    Ok(Json(guard.search.snapshot()))
}

pub async fn input(
    State(ctx): State<SharedContext>,
    Json(req): Json<InputRequest>,
) -> AppResult<Json<SearchSnapshot>> {
    state::input_search(&ctx, &req.query).map(Json)
}

/// 选中一条结果，打开其详情
pub async fn select(
    State(ctx): State<SharedContext>,
    Json(req): Json<SelectRequest>,
) -> AppResult<Json<DetailSnapshot>> {
    state::select_search_result(&ctx, req.recipe_id).map(Json)
}

/// 点击搜索框外部：收起下拉框
pub async fn dismiss(State(ctx): State<SharedContext>) -> AppResult<Json<SearchSnapshot>> {
    let mut guard = lock(&ctx)?;
    guard.search.dismiss();
    Ok(Json(guard.search.snapshot()))
}

pub async fn clear(State(ctx): State<SharedContext>) -> AppResult<Json<SearchSnapshot>> {
    state::clear_search(&ctx).map(Json)
}
