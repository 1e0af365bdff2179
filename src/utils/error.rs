// ============================================================================
// 统一错误类型定义
// 使用 thiserror 派生宏；command 层通过 IntoResponse 转换为 HTTP 响应
// ============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 应用统一错误枚举
///
/// 每个变体对应一类错误，command 层按变体决定 HTTP 状态码。
#[derive(Debug, Error)]
pub enum AppError {
    /// 参数验证失败（如食谱标题为空、没有任何配料）
    #[error("验证失败：{0}")]
    ValidationError(String),

    /// 食谱数据加载失败（网络错误或 JSON 解析错误）
    #[error("加载食谱失败：{0}")]
    LoadError(String),

    /// 搜索请求失败
    #[error("搜索失败：{0}")]
    SearchError(String),

    /// 本地存储读写失败
    #[error("本地存储失败：{0}")]
    StorageError(String),

    /// 远端 REST 接口调用失败
    #[error("远端请求失败：{0}")]
    RemoteError(String),

    /// 多步创建中途失败：食谱行已创建，但配料或步骤写入失败
    #[error("食谱 {recipe_id} 部分写入失败（{stage}），回滚{}", rollback_label(.rolled_back))]
    PartialWrite {
        recipe_id: i64,
        stage: String,
        rolled_back: bool,
    },

    /// 目标记录不存在
    #[error("未找到：{0}")]
    NotFound(String),

    /// 未配置远端后端（静态 JSON 数据源不支持写操作）
    #[error("未配置远端后端：{0}")]
    NotConfigured(String),

    /// 应用状态访问失败（锁被污染）
    #[error("状态访问失败：{0}")]
    StateError(String),
}

fn rollback_label(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        "成功"
    } else {
        "失败"
    }
}

/// 便捷类型别名，统一项目内的 Result 签名
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::NotConfigured(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RemoteError(_) | AppError::PartialWrite { .. } => StatusCode::BAD_GATEWAY,
            AppError::LoadError(_)
            | AppError::SearchError(_)
            | AppError::StorageError(_)
            | AppError::StateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
