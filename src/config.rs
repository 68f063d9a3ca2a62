//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了选项缓存与预取拦截器的配置结构和解析逻辑。

use crate::error::{CacheError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// 拦截器的默认优先级，数值越大越晚执行
pub const DEFAULT_INTERCEPTOR_PRIORITY: i32 = 100;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub config_version: Option<u32>,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub interceptor: InterceptorConfig,
    #[serde(default)]
    pub l1: L1Config,
    #[serde(default)]
    pub l2: L2Config,
}

/// 全局配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GlobalConfig {
    /// 服务名称，用于日志与指标标签
    pub service_name: String,
    /// 部署模式
    pub deployment: DeploymentMode,
    /// 序列化类型
    pub serialization: SerializationType,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            service_name: "options".to_string(),
            deployment: DeploymentMode::SingleNode,
            serialization: SerializationType::Json,
        }
    }
}

/// 部署模式
///
/// 单节点部署时站点级 transient 与普通 transient 存放在同一个选项表中，
/// 因此拦截器同时识别 `_site_transient_` 前缀。
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    #[default]
    SingleNode,
    MultiNode,
}

impl DeploymentMode {
    /// 是否识别命名空间变体键
    pub fn namespace_variants(&self) -> bool {
        matches!(self, DeploymentMode::SingleNode)
    }
}

/// 序列化类型枚举
#[derive(Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializationType {
    /// JSON序列化
    #[default]
    Json,
}

/// 预取拦截器配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct InterceptorConfig {
    /// 是否启用拦截器
    pub enabled: bool,
    /// 注册优先级
    pub priority: i32,
    /// 宿主是否已原生支持 transient 批量预取
    pub native_transient_priming: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: DEFAULT_INTERCEPTOR_PRIORITY,
            native_transient_priming: false,
        }
    }
}

/// L1缓存配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct L1Config {
    /// 最大缓存条目数
    pub max_capacity: u64,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            max_capacity: 10000,
        }
    }
}

/// 后端类型
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Redis,
}

/// L2（后端存储）配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct L2Config {
    /// 后端类型
    pub backend: BackendKind,
    /// 连接字符串
    pub connection_string: SecretString,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
    /// 选项键在 Redis 中的前缀
    pub key_prefix: String,
}

impl Default for L2Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            connection_string: SecretString::new("redis://localhost:6379".to_string().into()),
            connection_timeout_ms: 5000,
            command_timeout_ms: 3000,
            key_prefix: "options:".to_string(),
        }
    }
}

impl Config {
    /// 从 TOML 字符串解析配置并验证
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| CacheError::ConfigError(e.to_string()))?;
        config.validate().map_err(CacheError::ConfigError)?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 验证配置
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(version) = &self.config_version {
            if *version > CONFIG_VERSION {
                return Err(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                ));
            }
        }

        if self.global.service_name.is_empty() {
            return Err("Service name cannot be empty".to_string());
        }

        if self.global.service_name.len() > 64 {
            return Err(format!(
                "Service name '{}' exceeds maximum length of 64 characters",
                self.global.service_name
            ));
        }

        if self.l1.max_capacity == 0 {
            return Err("L1 max_capacity cannot be zero".to_string());
        }

        if self.l2.backend == BackendKind::Redis {
            if self.l2.connection_timeout_ms == 0 {
                return Err("L2 connection_timeout_ms cannot be zero".to_string());
            }
            if self.l2.command_timeout_ms == 0 {
                return Err("L2 command_timeout_ms cannot be zero".to_string());
            }
        }

        Ok(())
    }
}
