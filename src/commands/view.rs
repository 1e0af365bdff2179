// ============================================================================
// 视图相关 Commands：页面渲染、主视图切换、子视图切换
// ============================================================================

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::models::dtos::Page;
use crate::state::{lock, SharedContext};
use crate::utils::error::AppResult;

#[derive(Deserialize)]
pub struct NavigateRequest {
    view: String,
}

#[derive(Deserialize)]
pub struct SubViewRequest {
    id: String,
}

/// 当前页面
pub async fn get_page(State(ctx): State<SharedContext>) -> AppResult<Json<Page>> {
    let guard = lock(&ctx)?;
    Ok(Json(guard.page(false)))
}

/// 切换主视图，未知名称回到首页；返回的页面要求滚动到顶部
pub async fn navigate(
    State(ctx): State<SharedContext>,
    Json(req): Json<NavigateRequest>,
) -> AppResult<Json<Page>> {
    let mut guard = lock(&ctx)?;
    let view = guard.router.navigate_to(&req.view);
    log::debug!("切换视图：{} → {:?}", req.view, view);
    Ok(Json(guard.page(true)))
}

/// 切换子视图（制作程序过滤），不重置滚动位置
pub async fn set_sub_view(
    State(ctx): State<SharedContext>,
    Json(req): Json<SubViewRequest>,
) -> AppResult<Json<Page>> {
    let mut guard = lock(&ctx)?;
    guard.router.set_sub_view(&req.id)?;
    Ok(Json(guard.page(false)))
}
