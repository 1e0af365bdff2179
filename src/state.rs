// ============================================================================
// 应用上下文：唯一持有全部服务状态的地方
// ✅ 只能做：组装服务、编排跨服务的流程（搜索、增删食谱、重新加载）
// ⛔ 禁止：跨 .await 持有上下文锁
// ============================================================================

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::Config;
use crate::database::Database;
use crate::models::domain::{NewRecipe, Recipe};
use crate::models::dtos::{DetailSnapshot, Page, SearchSnapshot};
use crate::services::crud_gateway::{validate_new_recipe, RestGateway};
use crate::services::detail::{DetailController, ScrollGuard, ScrollLock};
use crate::services::recipe_source::{get_source, RecipeSource};
use crate::services::recipe_store::RecipeStore;
use crate::services::search::{match_local, Debouncer, SearchInput, SearchState, SearchTicket};
use crate::services::shopping_list::ShoppingList;
use crate::services::view_router::ViewRouter;
use crate::services::SEARCH_DEBOUNCE_MS;
use crate::utils::error::{AppError, AppResult};

/// 在 axum 路由之间共享的上下文句柄
pub type SharedContext = Arc<Mutex<AppContext>>;

pub struct AppContext {
    pub source: RecipeSource,
    pub store: RecipeStore,
    pub shopping: ShoppingList,
    pub router: ViewRouter,
    pub search: SearchState,
    pub debouncer: Debouncer,
    pub detail: DetailController,
    scroll: ScrollLock,
    /// 新建食谱表单打开期间持有的滚动锁
    add_form: Option<ScrollGuard>,
}

impl AppContext {
    pub fn new(source: RecipeSource, store: RecipeStore, shopping: ShoppingList) -> Self {
        let scroll = ScrollLock::new();
        AppContext {
            source,
            store,
            shopping,
            router: ViewRouter::new(),
            search: SearchState::new(),
            debouncer: Debouncer::new(Duration::from_millis(SEARCH_DEBOUNCE_MS)),
            detail: DetailController::new(scroll.clone()),
            scroll,
            add_form: None,
        }
    }

    /// 启动时初始化：打开本地存储、读取购物清单、加载食谱
    ///
    /// 食谱加载失败不会中止启动，错误会显示在页面上；本地存储不可用则直接返回错误。
    pub async fn init(config: &Config) -> AppResult<SharedContext> {
        let db = Database::init(&config.data_dir)?;
        let shopping = ShoppingList::load(db)?;

        let source = get_source(config.api_base.as_deref(), &config.recipes_file);
        log::info!("食谱数据源：{}", source.describe());
        let store = RecipeStore::from_load_result(source.load_all().await);

        Ok(Arc::new(Mutex::new(AppContext::new(source, store, shopping))))
    }

    /// 渲染当前页面
    ///
    /// # 参数
    /// - `scroll_to_top`: 是否由导航触发（导航后回到页面顶部）
    pub fn page(&self, scroll_to_top: bool) -> Page {
        Page {
            view: self.router.view(),
            sub_view: self.router.sub_view(),
            content: self.router.render(&self.store, self.shopping.items()),
            scroll_to_top,
            scroll_locked: self.scroll.is_locked(),
        }
    }

    /// 从仓库中打开食谱详情
    pub fn open_detail(&mut self, recipe_id: i64) -> AppResult<DetailSnapshot> {
        let recipe = self
            .store
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("食谱 {}", recipe_id)))?;
        self.detail.open(recipe);
        Ok(self.detail.snapshot())
    }

    pub fn open_form(&mut self) {
        if self.add_form.is_none() {
            self.add_form = Some(self.scroll.acquire());
        }
    }

    pub fn close_form(&mut self) {
        self.add_form = None;
    }

    pub fn form_open(&self) -> bool {
        self.add_form.is_some()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll.is_locked()
    }
}

/// 获取上下文锁
pub fn lock(ctx: &SharedContext) -> AppResult<MutexGuard<'_, AppContext>> {
    ctx.lock()
        .map_err(|_| AppError::StateError("无法获取应用状态锁".to_string()))
}

// ============================================================================
// 搜索编排
// ============================================================================

/// 搜索框输入：空白立即清空，否则重新开始防抖计时
pub fn input_search(ctx: &SharedContext, query: &str) -> AppResult<SearchSnapshot> {
    let mut guard = lock(ctx)?;
    match guard.search.input(query) {
        SearchInput::Cleared => guard.debouncer.cancel(),
        SearchInput::Scheduled(ticket) => {
            let task = run_search(ctx.clone(), ticket);
            guard.debouncer.schedule(task);
        }
    }
    Ok(guard.search.snapshot())
}

/// 清除按钮：清空输入并作废所有在途搜索
pub fn clear_search(ctx: &SharedContext) -> AppResult<SearchSnapshot> {
    let mut guard = lock(ctx)?;
    guard.search.clear();
    guard.debouncer.cancel();
    Ok(guard.search.snapshot())
}

/// 选中下拉框中的一条结果并打开详情
pub fn select_search_result(ctx: &SharedContext, recipe_id: i64) -> AppResult<DetailSnapshot> {
    let mut guard = lock(ctx)?;
    let recipe = guard
        .search
        .select(recipe_id)
        .ok_or_else(|| AppError::NotFound(format!("搜索结果中没有食谱 {}", recipe_id)))?;
    guard.debouncer.cancel();
    guard.detail.open(recipe);
    Ok(guard.detail.snapshot())
}

/// 一次搜索需要的数据：远端网关，或已在本地算好的结果
enum SearchPlan {
    Remote(RestGateway),
    Local(Vec<Recipe>),
}

/// 静默期结束后执行搜索，并把结果交给 `SearchState` 按令牌裁决
pub async fn run_search(ctx: SharedContext, ticket: SearchTicket) {
    // 任务被中止时也要清除进行中标记；中止可能发生在持锁期间，所以只 try_lock
    let _in_progress = scopeguard::guard((ctx.clone(), ticket.clone()), |(ctx, ticket)| {
        if let Ok(mut guard) = ctx.try_lock() {
            guard.search.finish(&ticket);
        }
    });

    let plan = {
        let guard = match lock(&ctx) {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("{}", e);
                return;
            }
        };
        if !guard.search.is_current(&ticket) {
            return;
        }
        match &guard.source {
            RecipeSource::Rest(gateway) => SearchPlan::Remote(gateway.clone()),
            RecipeSource::StaticFile(_) => {
                SearchPlan::Local(match_local(guard.store.recipes(), ticket.query()))
            }
        }
    };

    let result = match plan {
        SearchPlan::Remote(gateway) => gateway
            .fetch_recipes(Some(ticket.query()))
            .await
            .map_err(|e| AppError::SearchError(e.to_string())),
        SearchPlan::Local(recipes) => Ok(recipes),
    };

    match lock(&ctx) {
        Ok(mut guard) => {
            guard.search.complete(&ticket, result);
        }
        Err(e) => log::error!("{}", e),
    }
}

// ============================================================================
// 食谱增删与重新加载
// ============================================================================

/// 新建食谱：本地校验 → 远端三步写入 → 插入仓库最前面并关闭表单
pub async fn create_recipe(ctx: &SharedContext, new: NewRecipe) -> AppResult<Recipe> {
    let gateway = {
        let guard = lock(ctx)?;
        validate_new_recipe(&new)?;
        guard.source.gateway()?.clone()
    };

    let recipe = gateway.create_recipe(&new).await?;

    let mut guard = lock(ctx)?;
    guard.store.insert_front(recipe.clone());
    guard.close_form();
    Ok(recipe)
}

/// 确认删除当前打开的食谱
///
/// 远端删除成功后才从仓库移除并关闭弹窗；失败时仓库不变，只关闭确认框。
pub async fn confirm_delete(ctx: &SharedContext) -> AppResult<()> {
    let (id, gateway) = {
        let guard = lock(ctx)?;
        let id = guard.detail.pending_delete()?;
        (id, guard.source.gateway()?.clone())
    };

    let outcome = gateway.delete_recipe(id).await;

    let mut guard = lock(ctx)?;
    match outcome {
        Ok(()) => {
            log::info!("已删除食谱 {}", id);
            let AppContext { detail, store, .. } = &mut *guard;
            detail.finish_delete(id, store);
            Ok(())
        }
        Err(e) => {
            log::warn!("删除食谱 {} 失败：{}", id, e);
            guard.detail.cancel_delete();
            Err(e)
        }
    }
}

/// 重新从数据源加载全部食谱（加载失败后的重试）
pub async fn reload_recipes(ctx: &SharedContext) -> AppResult<Page> {
    let source = lock(ctx)?.source.clone();
    let result = source.load_all().await;

    let mut guard = lock(ctx)?;
    guard.store = RecipeStore::from_load_result(result);
    Ok(guard.page(false))
}

// ============================================================================
// 单元测试
// ============================================================================
