//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 选项读取路径上的"读取前"扩展点。
//!
//! 拦截器按优先级升序执行（数值越大越晚），相同优先级保持注册顺序。
//! 每个拦截器接收上一个拦截器的结果并返回新的结果；只观察不解析的
//! 拦截器原样返回输入即可。

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::{debug, instrument};

/// 读取前的预检结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreRead {
    /// 尚未解析，读取路径继续正常查找
    Unresolved,
    /// 已由某个拦截器解析，读取路径直接返回该值
    Resolved(Vec<u8>),
}

impl PreRead {
    pub fn is_resolved(&self) -> bool {
        matches!(self, PreRead::Resolved(_))
    }
}

/// 读取前拦截器
#[async_trait]
pub trait PreReadInterceptor: Send + Sync {
    /// 拦截器名称，用于日志
    fn name(&self) -> &str;

    /// 在单键读取之前调用
    ///
    /// # 参数
    ///
    /// * `pre` - 当前的预检结果
    /// * `key` - 被读取的选项键
    ///
    /// # 返回值
    ///
    /// 新的预检结果
    async fn before_read(&self, pre: PreRead, key: &str) -> PreRead;
}

/// 拦截器注册接口
pub trait InterceptorRegistry: Send + Sync {
    /// 以指定优先级注册拦截器
    fn register(&self, priority: i32, interceptor: Arc<dyn PreReadInterceptor>);
}

struct Registration {
    priority: i32,
    interceptor: Arc<dyn PreReadInterceptor>,
}

/// 读取前扩展点的注册表
#[derive(Default)]
pub struct HookRegistry {
    entries: RwLock<Vec<Registration>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已注册的拦截器数量
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按执行顺序列出 (优先级, 名称)
    pub fn describe(&self) -> Vec<(i32, String)> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .map(|r| (r.priority, r.interceptor.name().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn ordered(&self) -> Vec<Arc<dyn PreReadInterceptor>> {
        self.entries
            .read()
            .map(|entries| entries.iter().map(|r| r.interceptor.clone()).collect())
            .unwrap_or_default()
    }

    /// 依次执行所有拦截器
    #[instrument(skip(self), level = "trace")]
    pub async fn run_pre_read(&self, key: &str) -> PreRead {
        let mut pre = PreRead::Unresolved;
        for interceptor in self.ordered() {
            pre = interceptor.before_read(pre, key).await;
        }
        pre
    }
}

impl InterceptorRegistry for HookRegistry {
    fn register(&self, priority: i32, interceptor: Arc<dyn PreReadInterceptor>) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let position = entries
            .iter()
            .position(|r| r.priority > priority)
            .unwrap_or(entries.len());
        debug!(
            "Registering pre-read interceptor '{}' at priority {} (slot {})",
            interceptor.name(),
            priority,
            position
        );
        entries.insert(
            position,
            Registration {
                priority,
                interceptor,
            },
        );
    }
}
