// ============================================================================
// 数据传输对象（DTO）定义
// 前后端通信的数据结构，仅包含字段定义和序列化派生
// ⛔ 禁止：包含复杂的业务逻辑方法
// ============================================================================

use serde::Serialize;

use super::domain::{Program, Recipe, ShoppingItem, SubView, View};

/// 食谱卡片：列表中展示的精简信息
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RecipeCard {
    pub id: i64,
    pub title: String,
    pub program: Program,
    pub image: Option<String>,
    pub calories: Option<u32>,
    pub protein: Option<String>,
    /// 卡片只展示前两个标签
    pub tags: Vec<String>,
}

impl From<&Recipe> for RecipeCard {
    fn from(recipe: &Recipe) -> Self {
        RecipeCard {
            id: recipe.id,
            title: recipe.title.clone(),
            program: recipe.program,
            image: recipe.image.clone(),
            calories: recipe.calories,
            protein: recipe.protein.clone(),
            tags: recipe.tags.iter().take(2).cloned().collect(),
        }
    }
}

/// 分类页的子导航按钮
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SubNavItem {
    pub id: Program,
    pub label: String,
    pub active: bool,
}

/// 购物清单的一行，附带其在清单中的位置（勾选时回传）
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ShoppingRow {
    pub index: usize,
    #[serde(flatten)]
    pub item: ShoppingItem,
}

/// 购物清单及清空时的确认文案
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ShoppingSnapshot {
    pub items: Vec<ShoppingRow>,
    pub clear_prompt: String,
}

/// 主内容区域
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PageContent {
    /// 首页：最新的几个食谱
    Home { latest: Vec<RecipeCard> },
    /// 分类页：挖球模式 / 软冰淇淋
    Category {
        title: String,
        subtitle: String,
        sub_nav: Vec<SubNavItem>,
        recipes: Vec<RecipeCard>,
    },
    /// 购物清单
    Shopping { items: Vec<ShoppingRow> },
    /// 食谱加载失败时替换整个主内容区域
    LoadError { message: String },
}

/// 一次完整渲染的页面
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Page {
    pub view: View,
    pub sub_view: SubView,
    pub content: PageContent,
    /// 导航后需要滚动回页面顶部
    pub scroll_to_top: bool,
    /// 有弹窗打开时页面禁止滚动
    pub scroll_locked: bool,
}

/// 搜索结果下拉框中的一项
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub program: Program,
    pub program_label: String,
    pub image: Option<String>,
}

/// 搜索框当前状态
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SearchSnapshot {
    pub query: String,
    pub in_progress: bool,
    pub panel_visible: bool,
    pub results: Vec<SearchHit>,
}

/// 食谱详情弹窗当前状态
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DetailSnapshot {
    pub recipe: Option<Recipe>,
    /// 删除确认框打开时，显示待删除食谱的标题
    pub confirm_delete: Option<String>,
    pub scroll_locked: bool,
}

/// 操作完成后给用户的提示
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
}
