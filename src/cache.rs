//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 选项缓存：L1快速缓存、自动加载选项快照与后端存储的组合。

use crate::backend::l1::{CachedOption, L1Backend};
use crate::backend::l2::OptionBackend;
use crate::error::Result;
use crate::interceptor::{HostCapabilities, PrimeCapability};
use crate::metrics::GLOBAL_METRICS;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// 选项缓存
///
/// 自动加载选项快照在首次使用时一次性加载，其中的选项没有过期语义。
pub struct OptionCache {
    service_name: String,
    l1: L1Backend,
    backend: Arc<dyn OptionBackend>,
    alloptions: RwLock<Option<HashMap<String, Vec<u8>>>>,
    native_transient_priming: bool,
}

impl OptionCache {
    /// 创建选项缓存
    ///
    /// # 参数
    ///
    /// * `service_name` - 服务名称
    /// * `backend` - 选项存储后端
    /// * `l1_capacity` - L1最大条目数
    /// * `native_transient_priming` - 宿主读取 transient 时是否自行批量预取
    pub fn new(
        service_name: impl Into<String>,
        backend: Arc<dyn OptionBackend>,
        l1_capacity: u64,
        native_transient_priming: bool,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            l1: L1Backend::new(l1_capacity),
            backend,
            alloptions: RwLock::new(None),
            native_transient_priming,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn backend(&self) -> &Arc<dyn OptionBackend> {
        &self.backend
    }

    pub fn native_transient_priming(&self) -> bool {
        self.native_transient_priming
    }

    async fn ensure_alloptions(&self) -> Result<()> {
        if self.alloptions.read().await.is_some() {
            return Ok(());
        }
        let mut guard = self.alloptions.write().await;
        if guard.is_none() {
            let loaded = self.backend.load_autoloaded().await?;
            GLOBAL_METRICS.record_request(&self.service_name, "L2", "load_autoloaded", "issued");
            debug!("Loaded {} autoloaded options", loaded.len());
            *guard = Some(loaded);
        }
        Ok(())
    }

    /// 加载并返回自动加载选项快照
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    pub async fn load_alloptions(&self) -> Result<HashMap<String, Vec<u8>>> {
        self.ensure_alloptions().await?;
        Ok(self.alloptions.read().await.clone().unwrap_or_default())
    }

    /// 快照是否已加载
    pub async fn alloptions_loaded(&self) -> bool {
        self.alloptions.read().await.is_some()
    }

    /// 从快照中读取选项
    pub async fn alloption(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_alloptions().await?;
        Ok(self
            .alloptions
            .read()
            .await
            .as_ref()
            .and_then(|map| map.get(key).cloned()))
    }

    /// 快照中是否包含选项
    pub async fn alloptions_contains(&self, key: &str) -> Result<bool> {
        self.ensure_alloptions().await?;
        Ok(self
            .alloptions
            .read()
            .await
            .as_ref()
            .is_some_and(|map| map.contains_key(key)))
    }

    /// 更新快照中的选项；快照未加载时不做任何事
    pub async fn set_alloption(&self, key: &str, value: Vec<u8>) {
        if let Some(map) = self.alloptions.write().await.as_mut() {
            map.insert(key.to_string(), value);
        }
    }

    /// 从快照中移除选项
    pub async fn remove_alloption(&self, key: &str) -> bool {
        self.alloptions
            .write()
            .await
            .as_mut()
            .is_some_and(|map| map.remove(key).is_some())
    }

    /// 读取L1条目
    pub async fn get_cached(&self, key: &str) -> Option<CachedOption> {
        self.l1.get(key).await
    }

    /// 写入L1条目
    pub async fn set_cached(&self, key: &str, entry: CachedOption) {
        self.l1.insert(key, entry).await;
    }

    /// 从L1移除条目
    pub async fn evict(&self, key: &str) {
        self.l1.delete(key).await;
    }

    /// 清空L1并丢弃快照
    pub async fn flush(&self) {
        self.l1.clear();
        *self.alloptions.write().await = None;
    }

    /// 单键回源并缓存结果（包括不存在）
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    pub async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let start = std::time::Instant::now();
        let value = self.backend.fetch(key).await?;
        GLOBAL_METRICS.record_duration(&self.service_name, "L2", "fetch", start.elapsed().as_secs_f64());
        GLOBAL_METRICS.record_request(&self.service_name, "L2", "fetch", "issued");
        self.l1.insert(key, CachedOption::from(value.clone())).await;
        Ok(value)
    }

    /// 一次往返预取多个选项
    ///
    /// 已在快照或L1中的键会被跳过；全部命中时不发起往返。
    /// 后端中不存在的键以 [`CachedOption::Absent`] 缓存。
    ///
    /// # 返回值
    ///
    /// 实际回源的键数量
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    pub async fn prime(&self, keys: &[String]) -> Result<usize> {
        self.ensure_alloptions().await?;
        let mut pending = Vec::with_capacity(keys.len());
        {
            let snapshot = self.alloptions.read().await;
            for key in keys {
                let in_snapshot = snapshot.as_ref().is_some_and(|map| map.contains_key(key));
                if !in_snapshot && !self.l1.contains(key) && !pending.contains(key) {
                    pending.push(key.clone());
                }
            }
        }

        if pending.is_empty() {
            debug!("All {} keys already cached, skipping batch fetch", keys.len());
            return Ok(0);
        }

        let start = std::time::Instant::now();
        let mut found = self.backend.fetch_many(&pending).await?;
        GLOBAL_METRICS.record_duration(
            &self.service_name,
            "L2",
            "fetch_many",
            start.elapsed().as_secs_f64(),
        );
        GLOBAL_METRICS.record_request(&self.service_name, "L2", "fetch_many", "issued");
        debug!("Batch fetched {} keys, {} present", pending.len(), found.len());

        for key in &pending {
            self.l1.insert(key, CachedOption::from(found.remove(key))).await;
        }
        Ok(pending.len())
    }
}

#[async_trait]
impl PrimeCapability for OptionCache {
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            batch_prime: self.backend.supports_batch_fetch(),
            prefix_match: true,
            native_transient_priming: self.native_transient_priming,
        }
    }

    async fn alloptions_contains(&self, key: &str) -> Result<bool> {
        OptionCache::alloptions_contains(self, key).await
    }

    async fn prime_option_caches(&self, keys: &[String]) -> Result<()> {
        self.prime(keys).await.map(|_| ())
    }
}
