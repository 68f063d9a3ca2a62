//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! transient 缓存预取拦截器。
//!
//! 读取一个会过期的 transient 需要值键和超时键两个选项。拦截器在读取
//! 路径上识别 transient 键，在快速缓存未命中时用一次批量往返同时取回
//! 两个键，之后的两次单键读取都直接命中缓存。拦截器从不提供或替换读取
//! 结果，所有失败都被吸收，读取路径退回逐键回源。

use crate::config::Config;
use crate::error::Result;
use crate::hooks::{InterceptorRegistry, PreRead, PreReadInterceptor};
use crate::keys::{self, TransientKey};
use crate::metrics::GLOBAL_METRICS;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 宿主环境能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// 支持一次往返预取多个选项
    pub batch_prime: bool,
    /// 支持按前缀匹配选项键
    pub prefix_match: bool,
    /// 宿主读取 transient 时已自行批量预取
    pub native_transient_priming: bool,
}

/// 拦截器依赖的缓存能力
#[async_trait]
pub trait PrimeCapability: Send + Sync {
    /// 探测宿主能力
    fn capabilities(&self) -> HostCapabilities;

    /// 自动加载选项快照是否包含该键
    async fn alloptions_contains(&self, key: &str) -> Result<bool>;

    /// 一次往返预取多个选项，不存在的键同样被缓存
    async fn prime_option_caches(&self, keys: &[String]) -> Result<()>;
}

/// 拦截器未注册的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    /// 配置中关闭
    ByConfig,
    /// 缺少批量预取能力
    NoBatchPrime,
    /// 缺少前缀匹配能力
    NoPrefixMatch,
    /// 宿主已原生预取
    NativePriming,
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DisabledReason::ByConfig => "disabled by configuration",
            DisabledReason::NoBatchPrime => "batch priming unavailable",
            DisabledReason::NoPrefixMatch => "prefix matching unavailable",
            DisabledReason::NativePriming => "host primes transients natively",
        };
        f.write_str(reason)
    }
}

/// 注册结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Registered { priority: i32 },
    Disabled(DisabledReason),
}

impl Activation {
    pub fn is_registered(&self) -> bool {
        matches!(self, Activation::Registered { .. })
    }
}

/// transient 预取拦截器
pub struct TransientPrimer {
    service_name: String,
    cache: Arc<dyn PrimeCapability>,
    namespace_variants: bool,
}

impl TransientPrimer {
    /// 创建拦截器
    ///
    /// # 参数
    ///
    /// * `service_name` - 服务名称，用于指标
    /// * `cache` - 提供快照查询与批量预取的缓存
    /// * `namespace_variants` - 是否同时识别 `_site_transient_` 键
    pub fn new(
        service_name: impl Into<String>,
        cache: Arc<dyn PrimeCapability>,
        namespace_variants: bool,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            cache,
            namespace_variants,
        }
    }

    /// 探测宿主能力并在可用时注册拦截器
    ///
    /// 能力不足或宿主已原生预取时不注册任何东西。
    #[instrument(skip(registry, cache, config), level = "info")]
    pub fn register(
        registry: &dyn InterceptorRegistry,
        cache: Arc<dyn PrimeCapability>,
        config: &Config,
    ) -> Activation {
        if !config.interceptor.enabled {
            info!("Transient primer {}", DisabledReason::ByConfig);
            return Activation::Disabled(DisabledReason::ByConfig);
        }

        let caps = cache.capabilities();
        let disabled = if !caps.batch_prime {
            Some(DisabledReason::NoBatchPrime)
        } else if !caps.prefix_match {
            Some(DisabledReason::NoPrefixMatch)
        } else if caps.native_transient_priming || config.interceptor.native_transient_priming {
            Some(DisabledReason::NativePriming)
        } else {
            None
        };
        if let Some(reason) = disabled {
            info!("Transient primer not registered: {}", reason);
            return Activation::Disabled(reason);
        }

        let priority = config.interceptor.priority;
        let primer = Self::new(
            config.global.service_name.clone(),
            cache,
            config.global.deployment.namespace_variants(),
        );
        registry.register(priority, Arc::new(primer));
        info!(
            "Transient primer registered at priority {}, namespace variants: {}",
            priority,
            config.global.deployment.namespace_variants()
        );
        Activation::Registered { priority }
    }

    fn record(&self, result: &str) {
        GLOBAL_METRICS.record_request(&self.service_name, "prime", "transient", result);
    }
}

#[async_trait]
impl PreReadInterceptor for TransientPrimer {
    fn name(&self) -> &str {
        "transient_primer"
    }

    #[instrument(skip(self, pre), level = "debug", fields(service = %self.service_name))]
    async fn before_read(&self, pre: PreRead, key: &str) -> PreRead {
        if pre.is_resolved() {
            self.record("skip_resolved");
            return pre;
        }

        let Some((name, namespaced)) = TransientKey::parse(key, self.namespace_variants).name()
        else {
            self.record("skip_not_transient");
            return pre;
        };

        let value_key = keys::value_key(name, namespaced);
        match self.cache.alloptions_contains(&value_key).await {
            Ok(true) => {
                // 自动加载的 transient 没有超时键
                debug!("{} is autoloaded, no timeout to prime", value_key);
                self.record("skip_alloptions");
                return pre;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Transient priming skipped for {}: {}", key, e);
                self.record("failed");
                return pre;
            }
        }

        let batch = keys::prime_pair(name, namespaced);
        match self.cache.prime_option_caches(&batch).await {
            Ok(()) => {
                debug!("Primed transient pair {:?}", batch);
                self.record("primed");
            }
            Err(e) => {
                warn!("Transient priming failed for {}: {}", key, e);
                self.record("failed");
            }
        }
        pre
    }
}
