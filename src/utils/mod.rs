//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 测试和诊断共用的工具函数。

use crate::config::{Config, DeploymentMode};
use std::sync::Once;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn setup_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(EnvFilter::new("debug"))
            .try_init()
            .ok();
    });
}

/// 生成唯一的服务名称，避免全局指标在并行测试间互相干扰
pub fn generate_unique_service_name(base: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}_{}", base, nanos)
}

/// 创建使用内存后端的配置
pub fn memory_config(service_name: &str, deployment: DeploymentMode) -> Config {
    let mut config = Config::default();
    config.global.service_name = service_name.to_string();
    config.global.deployment = deployment;
    config
}
