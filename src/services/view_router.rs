// ============================================================================
// 视图路由：当前视图 + 子视图（制作程序过滤）
// ✅ 只能做：视图状态切换、把仓库投影成页面内容
// ⛔ 禁止：修改食谱仓库或购物清单
// ============================================================================

use crate::models::domain::{Program, ShoppingItem, SubView, View};
use crate::models::dtos::{PageContent, RecipeCard, ShoppingRow, SubNavItem};
use crate::services::recipe_store::RecipeStore;
use crate::services::LATEST_RECIPE_COUNT;
use crate::utils::error::{AppError, AppResult};

/// 分类页的固定布局
pub struct CategoryLayout {
    pub title: &'static str,
    pub subtitle: &'static str,
    /// 子导航中的程序，第一个为进入该分类时的默认子视图
    pub programs: &'static [Program],
}

static SCOOP_LAYOUT: CategoryLayout = CategoryLayout {
    title: "挖球模式",
    subtitle: "扎实可挖，口感完美。",
    programs: &[
        Program::IceCream,
        Program::LiteIceCream,
        Program::Gelato,
        Program::Sorbet,
    ],
};

static SOFT_SERVE_LAYOUT: CategoryLayout = CategoryLayout {
    title: "软冰淇淋",
    subtitle: "丝滑顺口，随时可挤。",
    programs: &[
        Program::FrozenYogurt,
        Program::Creamifit,
        Program::FrozenCustard,
    ],
};

/// 分类视图对应的布局，首页和购物清单没有
pub fn category_layout(view: View) -> Option<&'static CategoryLayout> {
    match view {
        View::Scoop => Some(&SCOOP_LAYOUT),
        View::SoftServe => Some(&SOFT_SERVE_LAYOUT),
        View::Home | View::Shopping => None,
    }
}

/// 进入某个视图时的默认子视图：挖球→冰淇淋，软冰淇淋→冻酸奶，其余→全部
pub fn default_sub_view(view: View) -> SubView {
    match category_layout(view) {
        Some(layout) => SubView::Program(layout.programs[0]),
        None => SubView::All,
    }
}

/// 购物清单的每一行附带其下标，勾选时回传
pub fn shopping_rows(items: &[ShoppingItem]) -> Vec<ShoppingRow> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| ShoppingRow {
            index,
            item: item.clone(),
        })
        .collect()
}

/// 视图路由状态：只保存当前快照，不维护历史栈
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ViewRouter {
    view: View,
    sub_view: SubView,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn sub_view(&self) -> SubView {
        self.sub_view
    }

    /// 切换主视图，并按固定规则重置子视图
    pub fn navigate(&mut self, view: View) {
        self.view = view;
        self.sub_view = default_sub_view(view);
        log::debug!("导航到 {:?}（子视图 {}）", view, self.sub_view.as_str());
    }

    /// 按名称切换主视图，无法识别的名称回落到首页
    pub fn navigate_to(&mut self, name: &str) -> View {
        let view = View::parse_or_home(name);
        self.navigate(view);
        view
    }

    /// 只修改子视图，主视图保持不变
    ///
    /// 只接受 `all` 或当前分类子导航中的程序，否则返回 `ValidationError` 且状态不变。
    pub fn set_sub_view(&mut self, id: &str) -> AppResult<()> {
        let sub_view = id
            .parse::<SubView>()
            .map_err(AppError::ValidationError)?;

        if let SubView::Program(program) = sub_view {
            let in_nav = category_layout(self.view)
                .map(|layout| layout.programs.contains(&program))
                .unwrap_or(false);
            if !in_nav {
                return Err(AppError::ValidationError(format!(
                    "当前页面没有“{}”分类",
                    program.label()
                )));
            }
        }

        self.sub_view = sub_view;
        Ok(())
    }

    /// 把当前状态投影成主内容区域
    ///
    /// 食谱加载失败时，依赖食谱的视图一律显示错误信息；购物清单不受影响。
    pub fn render(&self, store: &RecipeStore, shopping: &[ShoppingItem]) -> PageContent {
        if self.view == View::Shopping {
            return PageContent::Shopping {
                items: shopping_rows(shopping),
            };
        }

        if let Some(message) = store.load_error() {
            return PageContent::LoadError {
                message: message.to_string(),
            };
        }

        match category_layout(self.view) {
            Some(layout) => {
                let sub_nav = layout
                    .programs
                    .iter()
                    .map(|&program| SubNavItem {
                        id: program,
                        label: program.label().to_string(),
                        active: self.sub_view == SubView::Program(program),
                    })
                    .collect();

                let recipes = match self.sub_view {
                    SubView::Program(program) => {
                        store.by_program(program).map(RecipeCard::from).collect()
                    }
                    SubView::All => store.recipes().iter().map(RecipeCard::from).collect(),
                };

                PageContent::Category {
                    title: layout.title.to_string(),
                    subtitle: layout.subtitle.to_string(),
                    sub_nav,
                    recipes,
                }
            }
            None => PageContent::Home {
                latest: store
                    .latest(LATEST_RECIPE_COUNT)
                    .iter()
                    .map(RecipeCard::from)
                    .collect(),
            },
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================
