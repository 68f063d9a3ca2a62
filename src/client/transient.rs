//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! transient 读写：值存放在值键中，过期时间（Unix 秒）存放在超时键中。
//! 过期时间为 0 的 transient 以自动加载方式保存，没有超时键。

use super::OptionsClient;
use crate::error::Result;
use crate::keys;
use crate::serialization::Serializer;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

impl OptionsClient {
    /// 读取 transient，已过期时删除并返回None
    pub async fn get_transient<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.read_transient(name, false).await
    }

    /// 写入 transient
    ///
    /// # 参数
    ///
    /// * `name` - transient 名称
    /// * `value` - 值
    /// * `ttl` - 过期时间（秒），0 表示永不过期
    pub async fn set_transient<T: Serialize + Sync>(
        &self,
        name: &str,
        value: &T,
        ttl: u64,
    ) -> Result<bool> {
        self.write_transient(name, value, ttl, false).await
    }

    /// 删除 transient
    pub async fn delete_transient(&self, name: &str) -> Result<bool> {
        self.remove_transient(name, false).await
    }

    /// 读取站点级 transient
    pub async fn get_site_transient<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.read_transient(name, true).await
    }

    /// 写入站点级 transient
    pub async fn set_site_transient<T: Serialize + Sync>(
        &self,
        name: &str,
        value: &T,
        ttl: u64,
    ) -> Result<bool> {
        self.write_transient(name, value, ttl, true).await
    }

    /// 删除站点级 transient
    pub async fn delete_site_transient(&self, name: &str) -> Result<bool> {
        self.remove_transient(name, true).await
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn read_transient<T: DeserializeOwned>(
        &self,
        name: &str,
        namespaced: bool,
    ) -> Result<Option<T>> {
        let value_key = keys::value_key(name, namespaced);
        let timeout_key = keys::timeout_key(name, namespaced);

        let autoloaded = self.cache.alloptions_contains(&value_key).await?;
        if self.cache.native_transient_priming() && !autoloaded {
            self.cache.prime(&keys::prime_pair(name, namespaced)).await?;
        }

        if !autoloaded {
            if let Some(raw) = self.get_option(&timeout_key).await? {
                let expires_at: i64 = self.serializer.deserialize(&raw)?;
                if expires_at < self.now() {
                    debug!("Transient {} expired at {}", value_key, expires_at);
                    self.delete_option(&value_key).await?;
                    self.delete_option(&timeout_key).await?;
                    return Ok(None);
                }
            }
        }

        match self.get_option(&value_key).await? {
            Some(raw) => Ok(Some(self.serializer.deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(service = %self.service_name))]
    async fn write_transient<T: Serialize + Sync>(
        &self,
        name: &str,
        value: &T,
        ttl: u64,
        namespaced: bool,
    ) -> Result<bool> {
        let value_key = keys::value_key(name, namespaced);
        let timeout_key = keys::timeout_key(name, namespaced);
        let bytes = self.serializer.serialize(value)?;
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(|ttl| self.now().checked_add(ttl))
            .unwrap_or(i64::MAX);

        if self.get_option(&value_key).await?.is_none() {
            if ttl > 0 {
                let timeout = self.serializer.serialize(&expires_at)?;
                self.add_option(&timeout_key, timeout, false).await?;
            }
            return self.add_option(&value_key, bytes, ttl == 0).await;
        }

        if ttl > 0 {
            let timeout = self.serializer.serialize(&expires_at)?;
            if self.get_option(&timeout_key).await?.is_none() {
                // 已存在但没有超时键：以非自动加载方式重新写入
                self.delete_option(&value_key).await?;
                self.add_option(&timeout_key, timeout, false).await?;
                return self.add_option(&value_key, bytes, false).await;
            }
            self.update_option(&timeout_key, timeout).await?;
        }
        self.update_option(&value_key, bytes).await
    }

    async fn remove_transient(&self, name: &str, namespaced: bool) -> Result<bool> {
        let removed = self
            .delete_option(&keys::value_key(name, namespaced))
            .await?;
        if removed {
            self.delete_option(&keys::timeout_key(name, namespaced))
                .await?;
        }
        Ok(removed)
    }
}
