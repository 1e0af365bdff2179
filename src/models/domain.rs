// ============================================================================
// 领域模型：食谱、制作程序、出品模式、购物清单条目
// 字段命名与 JSON 数据源 / PostgREST 返回保持一致
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// 出品模式
// ============================================================================

/// 出品模式：挖球（口感扎实）或软冰淇淋（顺滑），或两者皆可
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScoopMode {
    Scoop,
    SoftServe,
    #[default]
    Both,
}

impl ScoopMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoopMode::Scoop => "scoop",
            ScoopMode::SoftServe => "soft-serve",
            ScoopMode::Both => "both",
        }
    }
}

// ============================================================================
// 制作程序
// ============================================================================

/// 机器上的制作程序（即甜品类别）
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Program {
    /// 新建食谱表单的默认选项
    #[default]
    IceCream,
    LiteIceCream,
    Gelato,
    Sorbet,
    FrozenYogurt,
    FrozenCustard,
    FruitWhip,
    Creamifit,
    Milkshake,
}

/// 大多数程序三种模式都可用
const ANY_MODE: &[ScoopMode] = &[ScoopMode::Scoop, ScoopMode::SoftServe, ScoopMode::Both];

impl Program {
    /// 全部程序，顺序与新建食谱表单的下拉框一致
    pub const ALL: [Program; 9] = [
        Program::IceCream,
        Program::LiteIceCream,
        Program::Gelato,
        Program::Sorbet,
        Program::FrozenYogurt,
        Program::FrozenCustard,
        Program::FruitWhip,
        Program::Creamifit,
        Program::Milkshake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Program::IceCream => "ice-cream",
            Program::LiteIceCream => "lite-ice-cream",
            Program::Gelato => "gelato",
            Program::Sorbet => "sorbet",
            Program::FrozenYogurt => "frozen-yogurt",
            Program::FrozenCustard => "frozen-custard",
            Program::FruitWhip => "fruit-whip",
            Program::Creamifit => "creamifit",
            Program::Milkshake => "milkshake",
        }
    }

    /// 界面显示名称
    pub fn label(&self) -> &'static str {
        match self {
            Program::IceCream => "冰淇淋",
            Program::LiteIceCream => "轻盈冰淇淋",
            Program::Gelato => "意式冰淇淋",
            Program::Sorbet => "雪葩",
            Program::FrozenYogurt => "冻酸奶",
            Program::FrozenCustard => "冻蛋奶",
            Program::FruitWhip => "果泥冰沙",
            Program::Creamifit => "CreamiFit",
            Program::Milkshake => "奶昔",
        }
    }

    /// 该程序允许的出品模式
    pub fn allowed_modes(&self) -> &'static [ScoopMode] {
        match self {
            Program::Gelato | Program::Sorbet => &[ScoopMode::Scoop],
            Program::Milkshake => &[ScoopMode::SoftServe],
            _ => ANY_MODE,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Program {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Program::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("未知的制作程序：{}", s))
    }
}

// ============================================================================
// 食谱
// ============================================================================

/// 食谱记录
///
/// 兼容两种来源：静态 `recipes.json`（出品模式字段名为 `mode`）与
/// PostgREST 的 `recipes_full` 视图（字段名为 `scoop_mode`，数组可能为 null）。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub base_flavor: Option<String>,
    #[serde(default, alias = "mode", deserialize_with = "null_as_default")]
    pub scoop_mode: ScoopMode,
    pub program: Program,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub protein: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// 静态 JSON 数据源的顶层结构：`{ "recipes": [...] }`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RecipeDocument {
    pub recipes: Vec<Recipe>,
}

/// 新建食谱表单提交的数据
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub base_flavor: Option<String>,
    #[serde(default)]
    pub scoop_mode: ScoopMode,
    #[serde(default)]
    pub program: Program,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub protein: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

// ============================================================================
// 购物清单条目
// ============================================================================

/// 购物清单中的一项
///
/// 同一配料出现在多个食谱中时各自保留一条，不做去重。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ShoppingItem {
    /// 配料原文
    pub text: String,
    /// 是否已勾选
    pub checked: bool,
    /// 来源食谱标题
    pub recipe: String,
}

// ============================================================================
// 视图状态
// ============================================================================

/// 主视图
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Home,
    Scoop,
    SoftServe,
    Shopping,
}

impl View {
    /// 解析视图名称，无法识别的名称一律回落到首页
    pub fn parse_or_home(name: &str) -> View {
        match name.trim() {
            "scoop" => View::Scoop,
            "soft-serve" => View::SoftServe,
            "shopping" => View::Shopping,
            _ => View::Home,
        }
    }
}

/// 子视图：按制作程序过滤，或不过滤
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SubView {
    #[default]
    All,
    Program(Program),
}

impl SubView {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubView::All => "all",
            SubView::Program(p) => p.as_str(),
        }
    }
}

impl FromStr for SubView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(SubView::All),
            other => other.parse::<Program>().map(SubView::Program),
        }
    }
}

impl Serialize for SubView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 把 JSON 中的 null 当作缺省值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_document_uses_mode_alias() {
        let json = r#"{ "recipes": [ {
            "id": 1, "title": "Mango Sorbet", "mode": "scoop", "program": "sorbet",
            "calories": 120, "protein": "1g", "image": "mango.jpg",
            "tags": ["Vegan"], "ingredients": ["mango", "sugar"], "instructions": ["blend", "freeze"]
        } ] }"#;
        let doc: RecipeDocument = serde_json::from_str(json).unwrap();
        let r = &doc.recipes[0];
        assert_eq!(r.scoop_mode, ScoopMode::Scoop);
        assert_eq!(r.program, Program::Sorbet);
        assert_eq!(r.calories, Some(120));
        assert_eq!(r.ingredients, vec!["mango", "sugar"]);
    }

    #[test]
    fn test_rest_row_with_nulls() {
        let json = r#"{
            "id": 9, "title": "Plain", "base_flavor": null, "scoop_mode": null,
            "program": "gelato", "calories": null, "protein": null, "image": null,
            "ingredients": null, "instructions": ["churn"], "tags": null
        }"#;
        let r: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(r.scoop_mode, ScoopMode::Both);
        assert!(r.ingredients.is_empty());
        assert!(r.tags.is_empty());
        assert_eq!(r.instructions, vec!["churn"]);
    }

    #[test]
    fn test_missing_mode_defaults_to_both() {
        let json = r#"{ "id": 2, "title": "Shake", "program": "milkshake" }"#;
        let r: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(r.scoop_mode, ScoopMode::Both);
    }

    #[test]
    fn test_program_round_trips_through_str() {
        for p in Program::ALL {
            assert_eq!(p.as_str().parse::<Program>().unwrap(), p);
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
        }
        assert!("soft-serve".parse::<Program>().is_err());
    }

    #[test]
    fn test_view_parse_falls_back_to_home() {
        assert_eq!(View::parse_or_home("scoop"), View::Scoop);
        assert_eq!(View::parse_or_home("soft-serve"), View::SoftServe);
        assert_eq!(View::parse_or_home("shopping"), View::Shopping);
        assert_eq!(View::parse_or_home("settings"), View::Home);
        assert_eq!(View::parse_or_home(""), View::Home);
    }

    #[test]
    fn test_sub_view_parse() {
        assert_eq!("all".parse::<SubView>().unwrap(), SubView::All);
        assert_eq!(
            "gelato".parse::<SubView>().unwrap(),
            SubView::Program(Program::Gelato)
        );
        assert!("chocolate".parse::<SubView>().is_err());
        assert_eq!(
            serde_json::to_string(&SubView::Program(Program::FrozenYogurt)).unwrap(),
            "\"frozen-yogurt\""
        );
    }

    #[test]
    fn test_new_recipe_defaults_program_and_mode() {
        let new: NewRecipe = serde_json::from_str(
            r#"{ "title": "Plain", "ingredients": ["milk"], "instructions": ["freeze"] }"#,
        )
        .unwrap();
        assert_eq!(new.program, Program::IceCream);
        assert_eq!(new.scoop_mode, ScoopMode::Both);
    }

    #[test]
    fn test_allowed_modes_table() {
        assert_eq!(Program::Gelato.allowed_modes(), &[ScoopMode::Scoop]);
        assert_eq!(Program::Milkshake.allowed_modes(), &[ScoopMode::SoftServe]);
        assert!(Program::IceCream.allowed_modes().contains(&ScoopMode::Both));
    }
}
