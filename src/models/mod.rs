// ============================================================================
// 数据模型层
// ✅ 只能做：结构体/枚举定义、序列化派生、简单的取值方法
// ⛔ 禁止：包含 I/O 或业务流程
// ============================================================================

pub mod domain;
pub mod dtos;
