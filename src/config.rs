// ============================================================================
// 运行配置：全部来自环境变量，缺失或非法时记录日志并回退默认值
// ============================================================================

use std::env;
use std::fmt::{Debug, Display};
use std::path::PathBuf;
use std::str::FromStr;

/// 监听端口
const PORT_KEY: &str = "SCOOP_PORT";
/// 本地存储（SQLite）所在目录
const DATA_DIR_KEY: &str = "SCOOP_DATA_DIR";
/// PostgREST 地址，未设置时使用静态食谱文件
const API_BASE_KEY: &str = "SCOOP_API_BASE";
/// 静态食谱文件路径
const RECIPES_FILE_KEY: &str = "SCOOP_RECIPES_FILE";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub api_base: Option<String>,
    pub recipes_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            data_dir: PathBuf::from("./data"),
            api_base: None,
            recipes_file: PathBuf::from("./public/recipes.json"),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构造配置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Config {
            port: try_load(&lookup, PORT_KEY, defaults.port),
            data_dir: try_load(&lookup, DATA_DIR_KEY, defaults.data_dir),
            api_base: lookup(API_BASE_KEY)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            recipes_file: try_load(&lookup, RECIPES_FILE_KEY, defaults.recipes_file),
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Debug,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        log::info!("{key} 未设置，使用默认值：{default:?}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        log::warn!("{key} 的值 {raw:?} 无效（{e}），使用默认值：{default:?}");
        default
    })
}
