//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了选项读写客户端：读取前拦截器、自动加载快照、L1缓存与后端回源。

pub mod transient;

use crate::backend::l1::CachedOption;
use crate::backend::l2::OptionBackend;
use crate::backend::memory::MemoryBackend;
use crate::backend::redis_store::RedisBackend;
use crate::cache::OptionCache;
use crate::clock::{Clock, SystemClock};
use crate::config::{BackendKind, Config};
use crate::error::{CacheError, Result};
use crate::hooks::{HookRegistry, PreRead};
use crate::interceptor::{Activation, TransientPrimer};
use crate::metrics::GLOBAL_METRICS;
use crate::serialization::{Serializer, SerializerEnum};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 选项客户端
///
/// 单键读取依次经过：读取前拦截器 → 自动加载快照 → L1缓存 → 后端。
pub struct OptionsClient {
    /// 服务名称
    service_name: String,
    /// 选项缓存
    cache: Arc<OptionCache>,
    /// 读取前扩展点
    registry: Arc<HookRegistry>,
    /// 序列化器
    serializer: SerializerEnum,
    /// 过期判断所用时钟
    clock: Arc<dyn Clock>,
}

impl OptionsClient {
    /// 创建选项客户端
    pub fn new(
        service_name: impl Into<String>,
        cache: Arc<OptionCache>,
        registry: Arc<HookRegistry>,
        serializer: SerializerEnum,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            cache,
            registry,
            serializer,
            clock,
        }
    }

    /// 使用给定后端按配置组装客户端，并注册 transient 预取拦截器
    ///
    /// # 返回值
    ///
    /// 客户端与拦截器的注册结果
    #[instrument(skip(config, backend), level = "info", name = "init_options_client")]
    pub fn with_backend(config: &Config, backend: Arc<dyn OptionBackend>) -> (Self, Activation) {
        let service_name = config.global.service_name.clone();
        let cache = Arc::new(OptionCache::new(
            service_name.clone(),
            backend,
            config.l1.max_capacity,
            config.interceptor.native_transient_priming,
        ));
        let registry = Arc::new(HookRegistry::new());
        let activation = TransientPrimer::register(registry.as_ref(), cache.clone(), config);
        info!(
            "Options client '{}' ready, backend: {}, primer: {:?}",
            service_name,
            cache.backend().name(),
            activation
        );

        let client = Self::new(
            service_name,
            cache,
            registry,
            SerializerEnum::from_type(&config.global.serialization),
            Arc::new(SystemClock),
        );
        (client, activation)
    }

    /// 按配置创建后端并组装客户端
    pub async fn from_config(config: &Config) -> Result<(Self, Activation)> {
        config.validate().map_err(CacheError::ConfigError)?;
        let backend: Arc<dyn OptionBackend> = match config.l2.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::Redis => Arc::new(RedisBackend::connect(&config.l2).await?),
        };
        Ok(Self::with_backend(config, backend))
    }

    /// 替换时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn cache(&self) -> &Arc<OptionCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    pub fn serializer(&self) -> &SerializerEnum {
        &self.serializer
    }

    /// 读取单个选项
    ///
    /// # 返回值
    ///
    /// 选项的字节值，不存在时返回None
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    pub async fn get_option(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let PreRead::Resolved(value) = self.registry.run_pre_read(key).await {
            debug!("Option {} resolved by pre-read interceptor", key);
            return Ok(Some(value));
        }

        if let Some(value) = self.cache.alloption(key).await? {
            return Ok(Some(value));
        }

        if let Some(entry) = self.cache.get_cached(key).await {
            GLOBAL_METRICS.record_request(&self.service_name, "L1", "get", "hit");
            return Ok(entry.into_value());
        }

        GLOBAL_METRICS.record_request(&self.service_name, "L1", "get", "miss");
        self.cache.fetch(key).await
    }

    /// 新增选项
    ///
    /// 选项已存在时不覆盖并返回 false。已缓存为不存在的键跳过存在性检查。
    #[instrument(skip(self, value), level = "debug", fields(service = %self.service_name))]
    pub async fn add_option(&self, key: &str, value: Vec<u8>, autoload: bool) -> Result<bool> {
        let known_absent = matches!(self.cache.get_cached(key).await, Some(CachedOption::Absent));
        if !known_absent && self.get_option(key).await?.is_some() {
            debug!("add_option: {} already exists", key);
            return Ok(false);
        }

        if !self.cache.backend().insert(key, value.clone(), autoload).await? {
            self.cache.evict(key).await;
            return Ok(false);
        }
        GLOBAL_METRICS.record_request(&self.service_name, "L2", "insert", "issued");

        if autoload {
            self.cache.set_alloption(key, value).await;
            self.cache.evict(key).await;
        } else {
            self.cache.set_cached(key, CachedOption::Present(value)).await;
        }
        Ok(true)
    }

    /// 更新选项，不存在时以自动加载方式新增
    ///
    /// # 返回值
    ///
    /// 值未变化时返回 false
    #[instrument(skip(self, value), level = "debug", fields(service = %self.service_name))]
    pub async fn update_option(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        match self.get_option(key).await? {
            None => return self.add_option(key, value, true).await,
            Some(old) if old == value => return Ok(false),
            Some(_) => {}
        }

        if !self.cache.backend().update(key, value.clone()).await? {
            self.cache.evict(key).await;
            return Ok(false);
        }
        GLOBAL_METRICS.record_request(&self.service_name, "L2", "update", "issued");

        if self.cache.alloptions_contains(key).await? {
            self.cache.set_alloption(key, value).await;
        } else {
            self.cache.set_cached(key, CachedOption::Present(value)).await;
        }
        Ok(true)
    }

    /// 删除选项
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    pub async fn delete_option(&self, key: &str) -> Result<bool> {
        let removed = self.cache.backend().remove(key).await?;
        GLOBAL_METRICS.record_request(&self.service_name, "L2", "remove", "issued");
        self.cache.remove_alloption(key).await;
        self.cache.set_cached(key, CachedOption::Absent).await;
        Ok(removed)
    }

    /// 读取并反序列化选项
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_option(key).await? {
            Some(bytes) => Ok(Some(self.serializer.deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// 序列化并写入选项
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<bool> {
        let bytes = self.serializer.serialize(value)?;
        self.update_option(key, bytes).await
    }

    fn now(&self) -> i64 {
        self.clock.now()
    }
}
