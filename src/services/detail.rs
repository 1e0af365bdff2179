// ============================================================================
// 食谱详情弹窗控制器
// ✅ 只能做：维护当前选中的食谱、滚动锁、删除确认框状态
// ⛔ 禁止：直接发起远端请求（删除由 command 层调用 CRUD 网关）
// ============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use scopeguard::ScopeGuard;

use crate::models::domain::Recipe;
use crate::models::dtos::DetailSnapshot;
use crate::services::crud_gateway::validate_image_ref;
use crate::services::recipe_store::RecipeStore;
use crate::services::shopping_list::ShoppingList;
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 滚动锁
// ============================================================================

/// 滚动锁守卫，离开作用域（被 drop）时自动释放
pub type ScrollGuard = ScopeGuard<Arc<AtomicUsize>, fn(Arc<AtomicUsize>)>;

/// 页面滚动锁：只要还有守卫存活，页面就不可滚动
#[derive(Clone, Debug, Default)]
pub struct ScrollLock {
    holders: Arc<AtomicUsize>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> ScrollGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        scopeguard::guard(self.holders.clone(), release as fn(Arc<AtomicUsize>))
    }

    pub fn is_locked(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }
}

fn release(holders: Arc<AtomicUsize>) {
    holders.fetch_sub(1, Ordering::SeqCst);
}

// ============================================================================
// 详情控制器
// ============================================================================

/// 当前打开的食谱
struct Selection {
    recipe: Recipe,
    /// 删除确认框是否打开
    confirm_delete: bool,
    _scroll: ScrollGuard,
}

/// 详情弹窗：同一时间最多选中一个食谱
pub struct DetailController {
    selection: Option<Selection>,
    scroll: ScrollLock,
}

impl DetailController {
    pub fn new(scroll: ScrollLock) -> Self {
        DetailController {
            selection: None,
            scroll,
        }
    }

    pub fn selected(&self) -> Option<&Recipe> {
        self.selection.as_ref().map(|s| &s.recipe)
    }

    /// 打开食谱详情，替换之前的选择
    pub fn open(&mut self, recipe: Recipe) {
        log::debug!("打开食谱详情《{}》", recipe.title);
        self.selection = Some(Selection {
            recipe,
            confirm_delete: false,
            _scroll: self.scroll.acquire(),
        });
    }

    /// 关闭详情弹窗，释放滚动锁
    ///
    /// # 返回
    /// - `true`: 之前有打开的弹窗
    pub fn close(&mut self) -> bool {
        self.selection.take().is_some()
    }

    fn selection_mut(&mut self) -> AppResult<&mut Selection> {
        self.selection
            .as_mut()
            .ok_or_else(|| AppError::NotFound("当前没有打开的食谱".to_string()))
    }

    /// 把当前食谱的配料加入购物清单
    pub fn add_to_shopping_list(&self, list: &mut ShoppingList) -> AppResult<String> {
        let recipe = self
            .selected()
            .ok_or_else(|| AppError::NotFound("当前没有打开的食谱".to_string()))?;
        list.add_ingredients(recipe)
    }

    /// 替换当前食谱的图片，并同步到食谱仓库（仅本次会话有效，不写回后端）
    pub fn update_image(&mut self, image: &str, store: &mut RecipeStore) -> AppResult<()> {
        let image = image.trim();
        validate_image_ref(image)?;

        let selection = self.selection_mut()?;
        selection.recipe.image = Some(image.to_string());

        let id = selection.recipe.id;
        if let Err(e) = store.update_image(id, image) {
            // 从远端搜索结果打开的食谱可能不在本地仓库中
            log::debug!("食谱仓库未同步图片：{}", e);
        }
        Ok(())
    }

    /// 打开删除确认框，返回待删除食谱的标题
    pub fn request_delete(&mut self) -> AppResult<String> {
        let selection = self.selection_mut()?;
        selection.confirm_delete = true;
        Ok(selection.recipe.title.clone())
    }

    /// 关闭删除确认框，详情弹窗保持打开
    pub fn cancel_delete(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.confirm_delete = false;
        }
    }

    /// 用户已在确认框中确认，返回待删除的食谱 id
    pub fn pending_delete(&self) -> AppResult<i64> {
        match &self.selection {
            Some(s) if s.confirm_delete => Ok(s.recipe.id),
            Some(_) => Err(AppError::ValidationError(
                "删除前需要先确认".to_string(),
            )),
            None => Err(AppError::NotFound("当前没有打开的食谱".to_string())),
        }
    }

    /// 远端删除成功：从仓库移除，并关闭仍指向该食谱的弹窗
    pub fn finish_delete(&mut self, id: i64, store: &mut RecipeStore) {
        store.remove(id);
        if self.selected().map(|r| r.id) == Some(id) {
            self.close();
        }
    }

    pub fn snapshot(&self) -> DetailSnapshot {
        DetailSnapshot {
            recipe: self.selected().cloned(),
            confirm_delete: self
                .selection
                .as_ref()
                .filter(|s| s.confirm_delete)
                .map(|s| s.recipe.title.clone()),
            scroll_locked: self.scroll.is_locked(),
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================
