// ============================================================================
// 业务层：纯 Rust 核心逻辑
// ✅ 特点：不依赖 axum 路由，保持纯净，方便写 #[test]
// ⛔ 禁止：直接构造 HTTP 响应
// ============================================================================

pub mod crud_gateway;
pub mod detail;
pub mod recipe_source;
pub mod recipe_store;
pub mod search;
pub mod shopping_list;
pub mod view_router;

// ============================================================================
// 常量定义
// ============================================================================

/// 购物清单在本地存储中的键名
pub const SHOPPING_LIST_KEY: &str = "creami_shopping_list";

/// 搜索防抖的静默期（毫秒）
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// 首页“最新作品”展示的食谱数量
pub const LATEST_RECIPE_COUNT: usize = 3;

/// 远端请求超时（秒）
pub const REMOTE_TIMEOUT_SECS: u64 = 30;

/// 携带图片（data: URI）的请求体上限（字节），base64 后约为原图的 4/3
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
