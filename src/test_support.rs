// ============================================================================
// 测试辅助：用 axum 搭一个最小的 PostgREST 替身
// 记录收到的每个请求，并可按 方法+路径 注入失败
// ============================================================================

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::models::domain::{Program, Recipe, ScoopMode};

/// 第一个新建食谱分配到的 id
const FIRST_ID: i64 = 100;

/// 替身收到的一次请求
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub prefer: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct FakeState {
    requests: Vec<RecordedRequest>,
    failures: Vec<(String, String)>,
    recipes: Vec<Value>,
    next_id: i64,
}

/// 运行在随机端口上的 PostgREST 替身，`base_url` 形如 `http://127.0.0.1:PORT/api`
pub struct FakePostgrest {
    pub base_url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakePostgrest {
    pub async fn start(recipes: Value) -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            recipes: recipes.as_array().cloned().unwrap_or_default(),
            next_id: FIRST_ID,
            ..Default::default()
        }));

        let app = Router::new()
            .fallback(handle)
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakePostgrest {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    /// 让指定 方法+路径 的请求返回 500
    pub fn fail_on(&self, method: &str, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((method.to_string(), path.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn first_id(&self) -> i64 {
        FIRST_ID
    }
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let path = uri.path().to_string();
    let mut state = state.lock().unwrap();

    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        prefer: headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    let failing = state
        .failures
        .iter()
        .any(|(m, p)| m == method.as_str() && *p == path);
    if failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    match (method.as_str(), path.as_str()) {
        ("POST", "/api/recipes") => {
            let id = state.next_id;
            state.next_id += 1;
            let mut row = body;
            row["id"] = json!(id);
            (StatusCode::CREATED, Json(json!([row]))).into_response()
        }
        ("POST", "/api/ingredients") | ("POST", "/api/instructions") => {
            StatusCode::CREATED.into_response()
        }
        ("DELETE", "/api/recipes") => StatusCode::NO_CONTENT.into_response(),
        ("GET", "/api/recipes_full") => {
            let term = search_term(&uri);
            let rows: Vec<Value> = state
                .recipes
                .iter()
                .filter(|r| match &term {
                    Some(t) => r["title"]
                        .as_str()
                        .map(|title| title.to_lowercase().contains(&t.to_lowercase()))
                        .unwrap_or(false),
                    None => true,
                })
                .cloned()
                .collect();
            Json(Value::Array(rows)).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 从 `search_vector=fts.<term>` 中取出检索词
fn search_term(uri: &Uri) -> Option<String> {
    let url = reqwest::Url::parse(&format!("http://fake{}", uri)).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "search_vector")
        .and_then(|(_, v)| v.strip_prefix("fts.").map(str::to_string))
}

/// 构造一个完整的测试食谱
pub fn sample_recipe(id: i64, title: &str, program: Program) -> Recipe {
    Recipe {
        id,
        title: title.to_string(),
        base_flavor: None,
        scoop_mode: ScoopMode::Both,
        program,
        calories: Some(150),
        protein: Some("5g".to_string()),
        image: None,
        ingredients: vec![format!("{} base", title.to_lowercase()), "sugar".to_string()],
        instructions: vec!["mix".to_string(), "freeze".to_string()],
        tags: vec!["Easy".to_string(), "Classic".to_string(), "Summer".to_string()],
    }
}
