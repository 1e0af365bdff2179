// ============================================================================
// 食谱相关 Commands
// 负责：详情弹窗、图片替换、删除确认、新建表单、重新加载
// ============================================================================

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::models::domain::{NewRecipe, Recipe};
use crate::models::dtos::{DetailSnapshot, Notice, Page};
use crate::state::{self, lock, AppContext, SharedContext};
use crate::utils::error::AppResult;

#[derive(Deserialize)]
pub struct OpenRequest {
    recipe_id: i64,
}

#[derive(Deserialize)]
pub struct ImageRequest {
    /// http(s) 地址或 data:image/...;base64, URI
    image: String,
}

// ============================================================================
// 详情弹窗
// ============================================================================

pub async fn get_detail(State(ctx): State<SharedContext>) -> AppResult<Json<DetailSnapshot>> {
    let guard = lock(&ctx)?;
    Ok(Json(guard.detail.snapshot()))
}

pub async fn open_detail(
    State(ctx): State<SharedContext>,
    Json(req): Json<OpenRequest>,
) -> AppResult<Json<DetailSnapshot>> {
    let mut guard = lock(&ctx)?;
    guard.open_detail(req.recipe_id).map(Json)
}

pub async fn close_detail(State(ctx): State<SharedContext>) -> AppResult<Json<DetailSnapshot>> {
    let mut guard = lock(&ctx)?;
    guard.detail.close();
    Ok(Json(guard.detail.snapshot()))
}

/// 把当前食谱的配料加入购物清单
pub async fn add_to_shopping(State(ctx): State<SharedContext>) -> AppResult<Json<Notice>> {
    let mut guard = lock(&ctx)?;
    let AppContext {
        detail, shopping, ..
    } = &mut *guard;
    let message = detail.add_to_shopping_list(shopping)?;
    Ok(Json(Notice { message }))
}

/// 替换当前食谱的图片（仅本次会话）
pub async fn update_image(
    State(ctx): State<SharedContext>,
    Json(req): Json<ImageRequest>,
) -> AppResult<Json<DetailSnapshot>> {
    let mut guard = lock(&ctx)?;
    let AppContext { detail, store, .. } = &mut *guard;
    detail.update_image(&req.image, store)?;
    Ok(Json(detail.snapshot()))
}

// ============================================================================
// 删除确认
// ============================================================================

pub async fn request_delete(State(ctx): State<SharedContext>) -> AppResult<Json<DetailSnapshot>> {
    let mut guard = lock(&ctx)?;
    guard.detail.request_delete()?;
    Ok(Json(guard.detail.snapshot()))
}

pub async fn cancel_delete(State(ctx): State<SharedContext>) -> AppResult<Json<DetailSnapshot>> {
    let mut guard = lock(&ctx)?;
    guard.detail.cancel_delete();
    Ok(Json(guard.detail.snapshot()))
}

/// 确认删除，成功后返回重新渲染的页面
pub async fn confirm_delete(State(ctx): State<SharedContext>) -> AppResult<Json<Page>> {
    state::confirm_delete(&ctx).await?;
    let guard = lock(&ctx)?;
    Ok(Json(guard.page(false)))
}

// ============================================================================
// 新建与重新加载
// ============================================================================

pub async fn open_form(State(ctx): State<SharedContext>) -> AppResult<Json<Page>> {
    let mut guard = lock(&ctx)?;
    guard.open_form();
    Ok(Json(guard.page(false)))
}

pub async fn close_form(State(ctx): State<SharedContext>) -> AppResult<Json<Page>> {
    let mut guard = lock(&ctx)?;
    guard.close_form();
    Ok(Json(guard.page(false)))
}

pub async fn create_recipe(
    State(ctx): State<SharedContext>,
    Json(new): Json<NewRecipe>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let recipe = state::create_recipe(&ctx, new).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// 重新从数据源加载食谱
pub async fn reload(State(ctx): State<SharedContext>) -> AppResult<Json<Page>> {
    state::reload_recipes(&ctx).await.map(Json)
}
