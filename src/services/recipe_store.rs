// ============================================================================
// 食谱仓库：内存中的有序食谱序列
// 只通过下列方法修改：加载、头部插入、替换图片、删除
// ============================================================================

use crate::models::domain::{Program, Recipe};
use crate::utils::error::{AppError, AppResult};

/// 食谱仓库，同时记录最近一次加载失败的原因
#[derive(Debug, Default)]
pub struct RecipeStore {
    recipes: Vec<Recipe>,
    load_error: Option<String>,
}

impl RecipeStore {
    /// 根据加载结果构造仓库；失败时仓库为空并保留错误信息供页面展示
    pub fn from_load_result(result: AppResult<Vec<Recipe>>) -> Self {
        match result {
            Ok(recipes) => {
                log::info!("已加载 {} 个食谱", recipes.len());
                RecipeStore {
                    recipes,
                    load_error: None,
                }
            }
            Err(e) => {
                log::error!("{}", e);
                RecipeStore {
                    recipes: Vec::new(),
                    load_error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn get(&self, id: i64) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// 最前面的 `count` 个食谱（首页“最新作品”）
    pub fn latest(&self, count: usize) -> &[Recipe] {
        &self.recipes[..count.min(self.recipes.len())]
    }

    pub fn by_program(&self, program: Program) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter().filter(move |r| r.program == program)
    }

    /// 新建的食谱放在最前面，成为最新作品
    pub fn insert_front(&mut self, recipe: Recipe) {
        self.recipes.insert(0, recipe);
    }

    /// 替换图片（仅本次会话有效）
    pub fn update_image(&mut self, id: i64, image: &str) -> AppResult<()> {
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("食谱 {}", id)))?;
        recipe.image = Some(image.to_string());
        Ok(())
    }

    pub fn remove(&mut self, id: i64) -> Option<Recipe> {
        let pos = self.recipes.iter().position(|r| r.id == id)?;
        Some(self.recipes.remove(pos))
    }
}
