// ============================================================================
// Command 层：每个用户操作对应一个 axum handler
// ✅ 只能做：解析请求体、锁定上下文、调用服务、返回 JSON
// ⛔ 禁止：包含业务逻辑
// ============================================================================

pub mod recipe;
pub mod search;
pub mod shopping;
pub mod view;
