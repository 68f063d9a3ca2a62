//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了选项缓存与 transient 预取的错误类型。

use thiserror::Error;

/// 缓存系统错误类型枚举
///
/// 预取拦截器本身从不向读取路径返回错误，这些错误只出现在宿主的
/// 读写路径、后端与配置加载中。
#[derive(Error, Debug)]
pub enum CacheError {
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// L1（内存快速缓存）操作失败
    #[error("L1 operation failed: {0}")]
    L1Error(String),

    /// L2（后端存储）操作失败
    #[error("L2 operation failed: {0}")]
    L2Error(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 操作不支持
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Redis错误
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// 后端错误
    #[error("Backend error: {0}")]
    BackendError(String),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),
}

/// 缓存操作结果类型别名
pub type Result<T> = std::result::Result<T, CacheError>;
