//! oxtransient - transient 缓存预取
//!
//! 读取一个会过期的 transient 需要值键和超时键两个选项。本库在选项读取
//! 路径上注册一个读取前拦截器，在缓存未命中时用一次批量往返同时取回
//! 两个键，把两次后端往返合并为一次。

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod backend;
pub mod cache;
pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod interceptor;
pub mod keys;
pub mod metrics;
pub mod serialization;
pub mod telemetry;
pub mod utils;

pub use client::OptionsClient;
pub use config::Config;
pub use hooks::{HookRegistry, PreRead, PreReadInterceptor};
pub use interceptor::{Activation, TransientPrimer};

/// oxtransient 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
