// ============================================================================
// 搜索服务：防抖 + 代次令牌
// ============================================================================
//
// 每次输入都会让代次 +1，之前发出的令牌随即作废：
// - 防抖计时器被显式取消并重新计时
// - 已经在途的请求即使晚到，也因令牌过期而不会覆盖新结果

use std::future::Future;
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::models::domain::Recipe;
use crate::models::dtos::{SearchHit, SearchSnapshot};
use crate::utils::error::AppResult;

/// 一次待执行的搜索
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 去除首尾空白后的检索词
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// 一次输入的处理结果
#[derive(Debug, PartialEq, Eq)]
pub enum SearchInput {
    /// 空白输入：结果已立即清空，无需等待
    Cleared,
    /// 需要在静默期后执行的搜索
    Scheduled(SearchTicket),
}

/// 搜索框状态
#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    generation: u64,
    results: Vec<Recipe>,
    in_progress: bool,
    panel_visible: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Recipe] {
        &self.results
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// 处理一次按键后的输入内容
    pub fn input(&mut self, query: &str) -> SearchInput {
        self.query = query.to_string();
        self.generation += 1;

        if query.trim().is_empty() {
            self.reset_results();
            return SearchInput::Cleared;
        }

        self.in_progress = true;
        SearchInput::Scheduled(SearchTicket {
            generation: self.generation,
            query: query.trim().to_string(),
        })
    }

    /// 令牌是否仍是最新一次输入发出的
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// 应用搜索结果；过期令牌的结果直接丢弃
    ///
    /// 失败时清空结果并记录日志，不向用户弹出错误。
    ///
    /// # 返回
    /// - `true`: 结果已应用
    /// - `false`: 令牌已过期
    pub fn complete(&mut self, ticket: &SearchTicket, result: AppResult<Vec<Recipe>>) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                "丢弃过期的搜索结果：{}（代次 {} < {}）",
                ticket.query,
                ticket.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(recipes) => {
                self.results = recipes;
                self.panel_visible = true;
            }
            Err(e) => {
                log::warn!("搜索“{}”失败：{}", ticket.query, e);
                self.results.clear();
            }
        }
        self.in_progress = false;
        true
    }

    /// 搜索任务结束（包括被中止）时清除进行中标记
    pub fn finish(&mut self, ticket: &SearchTicket) {
        if self.is_current(ticket) {
            self.in_progress = false;
        }
    }

    /// 选中一条结果：清空输入并收起下拉框，返回选中的食谱
    ///
    /// id 不在当前结果中时返回 `None`，状态不变。
    pub fn select(&mut self, recipe_id: i64) -> Option<Recipe> {
        let recipe = self.results.iter().find(|r| r.id == recipe_id).cloned()?;
        self.query.clear();
        self.generation += 1;
        self.reset_results();
        Some(recipe)
    }

    /// 点击搜索框以外的区域：只收起下拉框，保留输入
    pub fn dismiss(&mut self) {
        self.panel_visible = false;
    }

    /// 点击清除按钮
    pub fn clear(&mut self) {
        self.input("");
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            in_progress: self.in_progress,
            panel_visible: self.panel_visible,
            results: self
                .results
                .iter()
                .map(|r| SearchHit {
                    id: r.id,
                    title: r.title.clone(),
                    program: r.program,
                    program_label: r.program.label().to_string(),
                    image: r.image.clone(),
                })
                .collect(),
        }
    }

    fn reset_results(&mut self) {
        self.results.clear();
        self.panel_visible = false;
        self.in_progress = false;
    }
}

// ============================================================================
// 本地检索（静态数据源时使用）
// ============================================================================

/// 在内存中检索食谱
///
/// 每个空白分隔的词都必须命中（不区分大小写）；
/// 按命中字段加权排序：标题 3 分，风味/标签/程序 2 分，配料 1 分，同分保持原顺序。
pub fn match_local(recipes: &[Recipe], query: &str) -> Vec<Recipe> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &Recipe)> = recipes
        .iter()
        .filter_map(|recipe| {
            let mut total = 0;
            for term in &terms {
                let score = term_score(recipe, term);
                if score == 0 {
                    return None;
                }
                total += score;
            }
            Some((total, recipe))
        })
        .collect();

    // sort_by 是稳定排序，同分保持仓库顺序
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, r)| r.clone()).collect()
}

fn term_score(recipe: &Recipe, term: &str) -> u32 {
    let hit = |text: &str| text.to_lowercase().contains(term);

    if hit(&recipe.title) {
        3
    } else if recipe.base_flavor.as_deref().map(hit).unwrap_or(false)
        || recipe.tags.iter().any(|t| hit(t))
        || hit(recipe.program.as_str())
        || hit(recipe.program.label())
    {
        2
    } else if recipe.ingredients.iter().any(|i| hit(i)) {
        1
    } else {
        0
    }
}

// ============================================================================
// 防抖计时器
// ============================================================================

/// 可取消的防抖调度器：每次调度都会中止上一次尚未完成的任务
pub struct Debouncer {
    quiet: Duration,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Debouncer {
            quiet,
            pending: None,
        }
    }

    /// 取消之前的任务，静默期结束后执行 `task`
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            task.await;
        });
        self.pending = Some(handle.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// 单元测试
// ============================================================================
