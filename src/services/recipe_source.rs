// ============================================================================
// 食谱数据源
// ============================================================================
//
// 两种来源：静态 JSON 文件（`{ "recipes": [...] }`）或 PostgREST 的 recipes_full 视图。
// 通过 get_source 工厂函数按配置选择；写操作只有 REST 来源支持。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::domain::{Recipe, RecipeDocument};
use crate::services::crud_gateway::RestGateway;
use crate::utils::error::{AppError, AppResult};

/// 食谱数据源
#[derive(Clone, Debug)]
pub enum RecipeSource {
    /// 静态 JSON 文件
    StaticFile(PathBuf),
    /// PostgREST 后端
    Rest(RestGateway),
}

/// 按配置获取数据源：配置了 API 地址则走 REST，否则读取静态文件
pub fn get_source(api_base: Option<&str>, recipes_file: &Path) -> RecipeSource {
    match api_base.map(str::trim).filter(|s| !s.is_empty()) {
        Some(base) => RecipeSource::Rest(RestGateway::new(base)),
        None => RecipeSource::StaticFile(recipes_file.to_path_buf()),
    }
}

impl RecipeSource {
    /// 加载全部食谱，任何网络或解析错误都归为 `LoadError`
    pub async fn load_all(&self) -> AppResult<Vec<Recipe>> {
        let recipes = match self {
            RecipeSource::StaticFile(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::LoadError(format!("无法读取 {}: {}", path.display(), e))
                })?;
                parse_document(&raw)?
            }
            RecipeSource::Rest(gateway) => gateway
                .fetch_recipes(None)
                .await
                .map_err(|e| AppError::LoadError(e.to_string()))?,
        };

        audit_recipes(&recipes);
        Ok(recipes)
    }

    /// 获取 REST 网关；静态来源不支持写操作
    pub fn gateway(&self) -> AppResult<&RestGateway> {
        match self {
            RecipeSource::Rest(gateway) => Ok(gateway),
            RecipeSource::StaticFile(_) => Err(AppError::NotConfigured(
                "静态食谱文件为只读数据源，请配置 SCOOP_API_BASE".to_string(),
            )),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RecipeSource::StaticFile(path) => format!("静态文件 {}", path.display()),
            RecipeSource::Rest(gateway) => format!("PostgREST {}", gateway.base_url()),
        }
    }
}

/// 解析静态 JSON 文档
pub fn parse_document(raw: &str) -> AppResult<Vec<Recipe>> {
    serde_json::from_str::<RecipeDocument>(raw)
        .map(|doc| doc.recipes)
        .map_err(|e| AppError::LoadError(format!("食谱数据格式错误：{}", e)))
}

/// 数据本身不做拒绝，只把可疑记录写进日志
fn audit_recipes(recipes: &[Recipe]) {
    let mut seen = HashSet::new();
    for recipe in recipes {
        if !seen.insert(recipe.id) {
            log::warn!("食谱 id {} 重复出现（《{}》）", recipe.id, recipe.title);
        }
        if recipe.ingredients.is_empty() || recipe.instructions.is_empty() {
            log::warn!("食谱《{}》缺少配料或步骤", recipe.title);
        }
    }
}
