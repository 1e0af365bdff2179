// ============================================================================
// 数据库模块：SQLite 本地存储层
// 使用 rusqlite 直接操作 SQLite，遵循 KISS 原则，不引入 ORM
// 只提供键值存储，相当于浏览器的 localStorage
// ============================================================================

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::utils::error::{AppError, AppResult};

/// 数据库文件名
pub const DB_FILE_NAME: &str = "scoop_station.db";

// ============================================================================
// 数据库管理器
// ============================================================================

/// 数据库管理器，封装 rusqlite 连接
pub struct Database {
    /// SQLite 数据库连接
    conn: Connection,
}

impl Database {
    /// 初始化数据库：在指定目录创建数据库文件并建表
    ///
    /// # 参数
    /// - `data_dir`: 应用数据目录路径
    ///
    /// # 返回
    /// - `Ok(Database)`: 初始化成功，返回数据库实例
    /// - `Err(AppError::StorageError)`: 初始化失败
    pub fn init(data_dir: &Path) -> AppResult<Self> {
        // 确保数据目录存在
        std::fs::create_dir_all(data_dir).map_err(|e| {
            AppError::StorageError(format!(
                "数据库初始化失败：无法创建数据目录 {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path).map_err(|e| {
            AppError::StorageError(format!(
                "数据库初始化失败：无法打开数据库文件 {}: {}",
                db_path.display(),
                e
            ))
        })?;

        Self::create_tables(&conn)?;

        Ok(Database { conn })
    }

    /// 创建键值表（如果不存在）
    fn create_tables(conn: &Connection) -> AppResult<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| {
            AppError::StorageError(format!("数据库初始化失败：创建表结构时出错: {}", e))
        })?;

        Ok(())
    }

    /// 获取数据库连接的引用
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// 读取一个键的值，键不存在时返回 `None`
    pub fn get_value(&self, key: &str) -> AppResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::StorageError(format!("读取 {} 失败：{}", key, e)))
    }

    /// 写入一个键的值
    ///
    /// 使用 INSERT OR REPLACE 实现 upsert 语义：
    /// - 如果键不存在，插入新记录
    /// - 如果键已存在，覆盖其值
    pub fn set_value(&self, key: &str, value: &str) -> AppResult<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO local_storage (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| AppError::StorageError(format!("写入 {} 失败：{}", key, e)))?;

        Ok(())
    }
}

// ============================================================================
// 单元测试
// ============================================================================
