// ============================================================================
// CRUD 网关：与 PostgREST 通信
// ✅ 只能做：客户端校验、HTTP 请求、JSON 解析
// ⛔ 禁止：修改内存中的食谱仓库（由调用方在远端确认成功后处理）
// ============================================================================

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::domain::{NewRecipe, Program, Recipe, ScoopMode};
use crate::services::REMOTE_TIMEOUT_SECS;
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 请求/响应结构
// ============================================================================

/// POST /recipes 请求体
#[derive(Serialize)]
struct RecipeInsert<'a> {
    title: &'a str,
    base_flavor: Option<&'a str>,
    scoop_mode: ScoopMode,
    program: Program,
    calories: Option<u32>,
    protein: Option<&'a str>,
    image: Option<&'a str>,
    /// 配料拼接文本，供后端全文检索
    ingredients_text: String,
}

/// POST /ingredients 的单行
#[derive(Serialize)]
struct IngredientInsert<'a> {
    recipe_id: i64,
    ingredient_text: &'a str,
    order_index: usize,
}

/// POST /instructions 的单行
#[derive(Serialize)]
struct InstructionInsert<'a> {
    recipe_id: i64,
    instruction_text: &'a str,
    step_number: usize,
}

/// `Prefer: return=representation` 返回的新建行，只关心生成的 id
#[derive(Deserialize)]
struct CreatedRow {
    id: i64,
}

// ============================================================================
// 客户端校验
// ============================================================================

/// 通过校验的新建食谱：空白项已剔除，文本已去除首尾空白
#[derive(Clone, Debug, PartialEq)]
pub struct ValidRecipe {
    pub title: String,
    pub base_flavor: Option<String>,
    pub scoop_mode: ScoopMode,
    pub program: Program,
    pub calories: Option<u32>,
    pub protein: Option<String>,
    pub image: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl ValidRecipe {
    /// 用后端生成的 id 组装完整的食谱记录
    pub fn into_recipe(self, id: i64) -> Recipe {
        Recipe {
            id,
            title: self.title,
            base_flavor: self.base_flavor,
            scoop_mode: self.scoop_mode,
            program: self.program,
            calories: self.calories,
            protein: self.protein,
            image: self.image,
            ingredients: self.ingredients,
            instructions: self.instructions,
            tags: Vec::new(),
        }
    }
}

/// 校验图片引用：http(s) 地址或 base64 编码的 data URI
pub fn validate_image_ref(image: &str) -> AppResult<()> {
    let pattern = Regex::new(r"^(https?://\S+|data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=\s]+)$")
        .map_err(|e| AppError::ValidationError(format!("图片校验规则无效：{}", e)))?;

    if pattern.is_match(image) {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "图片必须是 http(s) 地址或 data:image 格式".to_string(),
        ))
    }
}

/// 校验新建食谱表单
///
/// 规则：
/// 1. 标题不能为空白
/// 2. 至少一条非空配料
/// 3. 至少一个非空步骤
/// 4. 出品模式在制作程序允许的范围内
pub fn validate_new_recipe(new: &NewRecipe) -> AppResult<ValidRecipe> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(AppError::ValidationError("请输入食谱标题".to_string()));
    }

    let ingredients = non_blank(&new.ingredients);
    if ingredients.is_empty() {
        return Err(AppError::ValidationError("请至少添加一条配料".to_string()));
    }

    let instructions = non_blank(&new.instructions);
    if instructions.is_empty() {
        return Err(AppError::ValidationError("请至少添加一个步骤".to_string()));
    }

    let program = new.program;
    if !program.allowed_modes().contains(&new.scoop_mode) {
        return Err(AppError::ValidationError(format!(
            "{} 不支持 {} 模式",
            program.label(),
            new.scoop_mode.as_str()
        )));
    }

    let image = optional_text(&new.image);
    if let Some(ref image) = image {
        validate_image_ref(image)?;
    }

    Ok(ValidRecipe {
        title: title.to_string(),
        base_flavor: optional_text(&new.base_flavor),
        scoop_mode: new.scoop_mode,
        program,
        calories: new.calories,
        protein: optional_text(&new.protein),
        image,
        ingredients,
        instructions,
    })
}

fn non_blank(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// REST 网关
// ============================================================================

/// PostgREST 客户端
#[derive(Clone, Debug)]
pub struct RestGateway {
    /// API 基础地址（如 http://localhost:3000/api），不含末尾斜杠
    base_url: String,
    client: reqwest::Client,
}

impl RestGateway {
    pub fn new(base_url: &str) -> Self {
        RestGateway {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// 拉取全部食谱，或按关键字做全文检索
    ///
    /// # 参数
    /// - `search`: 检索词；为空白时等同于不检索
    pub async fn fetch_recipes(&self, search: Option<&str>) -> AppResult<Vec<Recipe>> {
        let mut req = self.client.get(self.url("recipes_full"));

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            req = req.query(&[("search_vector", format!("fts.{}", term))]);
        }

        let resp = req
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| AppError::RemoteError(format!("请求食谱列表失败：{}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::RemoteError(format!(
                "获取食谱列表失败：HTTP {}",
                resp.status()
            )));
        }

        resp.json::<Vec<Recipe>>()
            .await
            .map_err(|e| AppError::RemoteError(format!("解析食谱列表失败：{}", e)))
    }

    /// 新建食谱：校验后依次写入食谱行、配料、步骤
    ///
    /// 校验失败时不发起任何请求。第 2、3 步失败时尝试删除第 1 步创建的食谱行，
    /// 并返回 `PartialWrite`，其中记录失败阶段与回滚结果。
    pub async fn create_recipe(&self, new: &NewRecipe) -> AppResult<Recipe> {
        let valid = validate_new_recipe(new)?;

        // 1. 创建食谱行，拿到生成的 id
        let recipe_id = self.insert_recipe_row(&valid).await.map_err(|e| {
            log::warn!("新建食谱《{}》失败：{}", valid.title, e);
            e
        })?;

        // 2. 批量写入配料（order_index 从 0 开始）
        let ingredient_rows: Vec<IngredientInsert> = valid
            .ingredients
            .iter()
            .enumerate()
            .map(|(i, text)| IngredientInsert {
                recipe_id,
                ingredient_text: text,
                order_index: i,
            })
            .collect();
        if let Err(e) = self.post_rows("ingredients", &ingredient_rows).await {
            return Err(self.compensate(recipe_id, "ingredients", e).await);
        }

        // 3. 批量写入步骤（step_number 从 1 开始）
        let instruction_rows: Vec<InstructionInsert> = valid
            .instructions
            .iter()
            .enumerate()
            .map(|(i, text)| InstructionInsert {
                recipe_id,
                instruction_text: text,
                step_number: i + 1,
            })
            .collect();
        if let Err(e) = self.post_rows("instructions", &instruction_rows).await {
            return Err(self.compensate(recipe_id, "instructions", e).await);
        }

        log::info!("已创建食谱《{}》（id={}）", valid.title, recipe_id);
        Ok(valid.into_recipe(recipe_id))
    }

    /// 删除食谱
    pub async fn delete_recipe(&self, id: i64) -> AppResult<()> {
        let resp = self
            .client
            .delete(self.url("recipes"))
            .query(&[("id", format!("eq.{}", id))])
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| AppError::RemoteError(format!("删除食谱失败：{}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::RemoteError(format!(
                "删除食谱失败：HTTP {}",
                resp.status()
            )));
        }

        Ok(())
    }

    async fn insert_recipe_row(&self, valid: &ValidRecipe) -> AppResult<i64> {
        let body = RecipeInsert {
            title: &valid.title,
            base_flavor: valid.base_flavor.as_deref(),
            scoop_mode: valid.scoop_mode,
            program: valid.program,
            calories: valid.calories,
            protein: valid.protein.as_deref(),
            image: valid.image.as_deref(),
            ingredients_text: valid.ingredients.join(" "),
        };

        let resp = self
            .client
            .post(self.url("recipes"))
            .header("Prefer", "return=representation")
            .json(&body)
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| AppError::RemoteError(format!("创建食谱失败：{}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(AppError::RemoteError(format!(
                "创建食谱失败：HTTP {} - {}",
                status, body_text
            )));
        }

        let rows = resp
            .json::<Vec<CreatedRow>>()
            .await
            .map_err(|e| AppError::RemoteError(format!("解析新建食谱响应失败：{}", e)))?;

        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| AppError::RemoteError("创建食谱失败：后端未返回新记录".to_string()))
    }

    async fn post_rows<T: Serialize>(&self, table: &str, rows: &[T]) -> AppResult<()> {
        let resp = self
            .client
            .post(self.url(table))
            .json(rows)
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| AppError::RemoteError(format!("写入 {} 失败：{}", table, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(AppError::RemoteError(format!(
                "写入 {} 失败：HTTP {} - {}",
                table, status, body_text
            )));
        }

        Ok(())
    }

    /// 部分写入后的补偿删除，结果单独记录日志
    async fn compensate(&self, recipe_id: i64, stage: &str, cause: AppError) -> AppError {
        log::error!(
            "食谱 {} 部分写入：{} 阶段失败（{}），尝试删除已创建的食谱行",
            recipe_id,
            stage,
            cause
        );

        let rolled_back = match self.delete_recipe(recipe_id).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("食谱 {} 回滚失败，后端残留不完整记录：{}", recipe_id, e);
                false
            }
        };

        AppError::PartialWrite {
            recipe_id,
            stage: stage.to_string(),
            rolled_back,
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePostgrest;
    use serde_json::json;

    fn form() -> NewRecipe {
        NewRecipe {
            title: "  Mango Sorbet ".to_string(),
            base_flavor: Some("Mango".to_string()),
            scoop_mode: ScoopMode::Scoop,
            program: Program::Sorbet,
            calories: Some(120),
            protein: Some("".to_string()),
            image: None,
            ingredients: vec!["mango".to_string(), "  ".to_string(), "sugar".to_string()],
            instructions: vec!["blend".to_string(), "freeze".to_string()],
        }
    }

    #[test]
    fn test_validate_trims_and_drops_blank_entries() {
        let valid = validate_new_recipe(&form()).unwrap();
        assert_eq!(valid.title, "Mango Sorbet");
        assert_eq!(valid.ingredients, vec!["mango", "sugar"]);
        assert_eq!(valid.protein, None);
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let mut new = form();
        new.title = "   ".to_string();
        let err = validate_new_recipe(&new).unwrap_err();
        assert!(err.to_string().contains("请输入食谱标题"));
    }

    #[test]
    fn test_validate_rejects_only_blank_ingredients() {
        let mut new = form();
        new.ingredients = vec!["".to_string(), " ".to_string()];
        let err = validate_new_recipe(&new).unwrap_err();
        assert!(err.to_string().contains("配料"));
    }

    #[test]
    fn test_validate_rejects_missing_instructions() {
        let mut new = form();
        new.instructions.clear();
        let err = validate_new_recipe(&new).unwrap_err();
        assert!(err.to_string().contains("步骤"));
    }

    #[test]
    fn test_validate_rejects_mode_not_allowed_by_program() {
        let mut new = form();
        new.scoop_mode = ScoopMode::SoftServe;
        assert!(matches!(
            validate_new_recipe(&new),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_accepts_form_without_program() {
        let new: NewRecipe = serde_json::from_value(json!({
            "title": "Sweet Cream",
            "ingredients": ["cream", "sugar"],
            "instructions": ["mix", "freeze"],
        }))
        .unwrap();
        let valid = validate_new_recipe(&new).unwrap();
        assert_eq!(valid.program, Program::IceCream);
        assert_eq!(valid.scoop_mode, ScoopMode::Both);
    }

    #[test]
    fn test_validate_image_ref() {
        assert!(validate_image_ref("https://example.com/a.jpg").is_ok());
        assert!(validate_image_ref("data:image/png;base64,iVBORw0KGgo=").is_ok());
        assert!(validate_image_ref("javascript:alert(1)").is_err());
        assert!(validate_image_ref("data:text/html;base64,PGI+").is_err());
    }

    #[test]
    fn test_url_trailing_slash_handling() {
        let gw = RestGateway::new("http://localhost:3000/api/");
        assert_eq!(gw.url("recipes"), "http://localhost:3000/api/recipes");
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_request() {
        let fake = FakePostgrest::start(json!([])).await;
        let gw = RestGateway::new(&fake.base_url);

        let mut new = form();
        new.title = String::new();
        assert!(gw.create_recipe(&new).await.is_err());

        let mut new = form();
        new.ingredients = vec![" ".to_string()];
        assert!(gw.create_recipe(&new).await.is_err());

        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_issues_three_ordered_requests() {
        let fake = FakePostgrest::start(json!([])).await;
        let gw = RestGateway::new(&fake.base_url);

        let recipe = gw.create_recipe(&form()).await.unwrap();
        assert_eq!(recipe.id, fake.first_id());
        assert_eq!(recipe.title, "Mango Sorbet");
        assert_eq!(recipe.instructions, vec!["blend", "freeze"]);

        let reqs = fake.requests();
        assert_eq!(reqs.len(), 3);
        assert_eq!((reqs[0].method.as_str(), reqs[0].path.as_str()), ("POST", "/api/recipes"));
        assert_eq!(reqs[0].body["ingredients_text"], "mango sugar");
        assert_eq!(reqs[0].body["scoop_mode"], "scoop");
        assert_eq!(reqs[0].body["program"], "sorbet");
        assert_eq!(reqs[0].prefer.as_deref(), Some("return=representation"));

        assert_eq!(reqs[1].path, "/api/ingredients");
        assert_eq!(
            reqs[1].body,
            json!([
                { "recipe_id": recipe.id, "ingredient_text": "mango", "order_index": 0 },
                { "recipe_id": recipe.id, "ingredient_text": "sugar", "order_index": 1 }
            ])
        );

        assert_eq!(reqs[2].path, "/api/instructions");
        assert_eq!(reqs[2].body[0]["step_number"], 1);
        assert_eq!(reqs[2].body[1]["step_number"], 2);
        assert_eq!(reqs[2].body[1]["instruction_text"], "freeze");
    }

    #[tokio::test]
    async fn test_recipe_row_failure_is_total_failure() {
        let fake = FakePostgrest::start(json!([])).await;
        fake.fail_on("POST", "/api/recipes");
        let gw = RestGateway::new(&fake.base_url);

        let err = gw.create_recipe(&form()).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteError(_)));
        assert_eq!(fake.requests().len(), 1);
    }

    /// 配料写入失败：触发补偿删除并返回 PartialWrite
    #[tokio::test]
    async fn test_partial_write_triggers_compensating_delete() {
        let fake = FakePostgrest::start(json!([])).await;
        fake.fail_on("POST", "/api/ingredients");
        let gw = RestGateway::new(&fake.base_url);

        let err = gw.create_recipe(&form()).await.unwrap_err();
        match err {
            AppError::PartialWrite {
                recipe_id,
                stage,
                rolled_back,
            } => {
                assert_eq!(recipe_id, fake.first_id());
                assert_eq!(stage, "ingredients");
                assert!(rolled_back);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let reqs = fake.requests();
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[2].method, "DELETE");
        assert_eq!(reqs[2].query.as_deref(), Some(format!("id=eq.{}", fake.first_id()).as_str()));
    }

    #[tokio::test]
    async fn test_partial_write_with_failed_rollback() {
        let fake = FakePostgrest::start(json!([])).await;
        fake.fail_on("POST", "/api/instructions");
        fake.fail_on("DELETE", "/api/recipes");
        let gw = RestGateway::new(&fake.base_url);

        let err = gw.create_recipe(&form()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::PartialWrite { rolled_back: false, ref stage, .. } if stage.as_str() == "instructions"
        ));
    }

    #[tokio::test]
    async fn test_delete_uses_eq_filter() {
        let fake = FakePostgrest::start(json!([])).await;
        let gw = RestGateway::new(&fake.base_url);

        gw.delete_recipe(5).await.unwrap();
        let reqs = fake.requests();
        assert_eq!(reqs[0].method, "DELETE");
        assert_eq!(reqs[0].path, "/api/recipes");
        assert_eq!(reqs[0].query.as_deref(), Some("id=eq.5"));
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let fake = FakePostgrest::start(json!([])).await;
        fake.fail_on("DELETE", "/api/recipes");
        let gw = RestGateway::new(&fake.base_url);

        assert!(matches!(
            gw.delete_recipe(5).await,
            Err(AppError::RemoteError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_with_search_term_encodes_fts_filter() {
        let fake = FakePostgrest::start(json!([
            { "id": 1, "title": "Mango Sorbet", "program": "sorbet", "ingredients": ["mango"] },
            { "id": 2, "title": "Vanilla Bean", "program": "ice-cream", "ingredients": null }
        ]))
        .await;
        let gw = RestGateway::new(&fake.base_url);

        let all = gw.fetch_recipes(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let hits = gw.fetch_recipes(Some("mango pie")).await.unwrap();
        let reqs = fake.requests();
        assert_eq!(reqs[1].query.as_deref(), Some("search_vector=fts.mango+pie"));
        assert!(hits.is_empty());

        let hits = gw.fetch_recipes(Some("mango")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }
}
