// ============================================================================
// [总线] 程序的组装车间
// ✅ 只能做：pub mod 暴露子模块、注册路由、初始化上下文
// ⛔ 禁止：直接实现 command 函数
// ============================================================================

pub mod commands;
pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_support;

use std::io;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, EnvFilter};

use commands::{recipe, search, shopping, view};
use config::Config;
use services::MAX_IMAGE_BYTES;
use state::{AppContext, SharedContext};

// ============================================================================
// 路由表
// ============================================================================

pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        // 视图
        .route("/page", get(view::get_page))
        .route("/navigate", post(view::navigate))
        .route("/sub-view", post(view::set_sub_view))
        // 购物清单
        .route("/shopping", get(shopping::get_shopping))
        .route("/shopping/toggle", post(shopping::toggle_item))
        .route("/shopping/clear", post(shopping::clear_list))
        // 搜索
        .route("/search", get(search::get_search))
        .route("/search/input", post(search::input))
        .route("/search/select", post(search::select))
        .route("/search/dismiss", post(search::dismiss))
        .route("/search/clear", post(search::clear))
        // 详情弹窗
        .route("/detail", get(recipe::get_detail))
        .route("/detail/open", post(recipe::open_detail))
        .route("/detail/close", post(recipe::close_detail))
        .route("/detail/shopping", post(recipe::add_to_shopping))
        .route(
            "/detail/image",
            post(recipe::update_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/detail/delete/request", post(recipe::request_delete))
        .route("/detail/delete/cancel", post(recipe::cancel_delete))
        .route("/detail/delete/confirm", post(recipe::confirm_delete))
        // 新建与重新加载
        .route(
            "/recipes",
            post(recipe::create_recipe).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/recipes/form/open", post(recipe::open_form))
        .route("/recipes/form/close", post(recipe::close_form))
        .route("/recipes/reload", post(recipe::reload))
        .with_state(ctx)
}

// ============================================================================
// 应用入口
// ============================================================================

pub async fn run() -> io::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();
    log::info!("正在初始化应用状态...");
    let ctx = AppContext::init(&config)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = router(ctx).layer(cors).layer(TraceLayer::new_for_http());

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    log::info!("服务已启动：{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("服务已关闭");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("无法监听 Ctrl+C：{}", e);
            std::future::pending::<()>().await;
        }
        log::info!("收到 Ctrl+C，准备关闭");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                log::info!("收到 SIGTERM，准备关闭");
            }
            Err(e) => {
                log::error!("无法监听 SIGTERM：{}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
