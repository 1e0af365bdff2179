// ============================================================================
// 购物清单服务：追加配料、勾选、清空，并在每次修改后持久化
// ✅ 只能做：清单状态维护、通过 Database 读写本地存储
// ⛔ 禁止：弹出对话框（确认逻辑由调用方以闭包形式传入）
// ============================================================================

use crate::database::Database;
use crate::models::domain::{Recipe, ShoppingItem};
use crate::services::SHOPPING_LIST_KEY;
use crate::utils::error::{AppError, AppResult};

/// 清空清单前向用户展示的确认文案
pub const CLEAR_PROMPT: &str = "确定要清空购物清单吗？";

/// 购物清单
///
/// 内存中的列表与本地存储始终一致：每次修改先写存储，写入成功后才替换内存状态。
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
    db: Database,
}

impl ShoppingList {
    /// 启动时从本地存储读取一次清单
    ///
    /// 键不存在时视为空清单；内容无法解析时返回 `StorageError`。
    pub fn load(db: Database) -> AppResult<Self> {
        let items: Vec<ShoppingItem> = match db.get_value(SHOPPING_LIST_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                AppError::StorageError(format!("购物清单数据已损坏：{}", e))
            })?,
            None => Vec::new(),
        };

        log::info!("已载入购物清单，共 {} 项", items.len());
        Ok(ShoppingList { items, db })
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 把食谱的每条配料追加到清单末尾（未勾选，标记来源食谱）
    ///
    /// 同一食谱重复添加会再次追加，不做去重。
    ///
    /// # 返回
    /// - `Ok(String)`: 给用户的确认提示
    pub fn add_ingredients(&mut self, recipe: &Recipe) -> AppResult<String> {
        let mut next = self.items.clone();
        next.extend(recipe.ingredients.iter().map(|text| ShoppingItem {
            text: text.clone(),
            checked: false,
            recipe: recipe.title.clone(),
        }));
        self.commit(next)?;

        log::info!(
            "已将《{}》的 {} 条配料加入购物清单",
            recipe.title,
            recipe.ingredients.len()
        );
        Ok(format!("已将《{}》的配料加入购物清单！", recipe.title))
    }

    /// 切换指定位置的勾选状态
    ///
    /// 下标以当前长度重新校验：越界（例如清单刚被清空）时不做任何修改。
    ///
    /// # 返回
    /// - `Ok(true)`: 已切换
    /// - `Ok(false)`: 下标越界，未修改
    pub fn toggle_item(&mut self, index: usize) -> AppResult<bool> {
        if index >= self.items.len() {
            log::debug!("忽略越界的勾选操作：{} >= {}", index, self.items.len());
            return Ok(false);
        }

        let mut next = self.items.clone();
        next[index].checked = !next[index].checked;
        self.commit(next)?;
        Ok(true)
    }

    /// 清空清单
    ///
    /// # 参数
    /// - `confirm`: 接收确认文案、返回用户是否同意；不同意时清单保持不变
    ///
    /// # 返回
    /// - `Ok(true)`: 已清空
    /// - `Ok(false)`: 用户取消
    pub fn clear<F>(&mut self, confirm: F) -> AppResult<bool>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CLEAR_PROMPT) {
            return Ok(false);
        }

        self.commit(Vec::new())?;
        log::info!("购物清单已清空");
        Ok(true)
    }

    /// 先写存储，成功后再替换内存状态
    fn commit(&mut self, next: Vec<ShoppingItem>) -> AppResult<()> {
        let raw = serde_json::to_string(&next)
            .map_err(|e| AppError::StorageError(format!("序列化购物清单失败：{}", e)))?;
        self.db.set_value(SHOPPING_LIST_KEY, &raw)?;
        self.items = next;
        Ok(())
    }
}

// ============================================================================
// 单元测试
// ============================================================================
