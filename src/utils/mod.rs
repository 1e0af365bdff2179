// ============================================================================
// 工具层：跨模块共享的基础设施
// ============================================================================

pub mod error;
