//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了日志与链路追踪的初始化。

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// 初始化 tracing 与 OpenTelemetry
///
/// 应在程序启动时调用一次。日志级别由 `RUST_LOG` 控制，未设置时使用
/// `default_level`。
///
/// # 参数
///
/// * `service_name` - 服务名称，作为 tracer 名称
/// * `default_level` - 默认日志级别
pub fn init_tracing(service_name: &str, default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 未配置导出器时 provider 不输出任何 span，仅保留上下文传播
    let provider = SdkTracerProvider::builder().build();
    global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(service_name.to_string());
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    let subscriber = Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(telemetry);

    // 应用层可能已经设置过全局 subscriber
    let _ = tracing::subscriber::set_global_default(subscriber);
}
