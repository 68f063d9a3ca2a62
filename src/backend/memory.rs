//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 基于内存的选项存储后端，记录每一次往返，便于诊断与测试。

use super::l2::{OptionBackend, Query};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
struct StoredOption {
    value: Vec<u8>,
    autoload: bool,
}

/// 内存选项存储后端
#[derive(Debug, Default)]
pub struct MemoryBackend {
    options: DashMap<String, StoredOption>,
    log: Mutex<Vec<Query>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入选项，不计为一次往返
    pub fn seed(&self, key: &str, value: Vec<u8>, autoload: bool) {
        self.options
            .insert(key.to_string(), StoredOption { value, autoload });
    }

    /// 选项是否存在，不计为一次往返
    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// 已记录的往返
    pub fn queries(&self) -> Vec<Query> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// 已记录的往返次数
    pub fn query_count(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// 清空往返记录
    pub fn clear_queries(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn record(&self, query: Query) {
        debug!("Memory backend query: {:?}", query);
        if let Ok(mut log) = self.log.lock() {
            log.push(query);
        }
    }
}

#[async_trait]
impl OptionBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.record(Query::Fetch(key.to_string()));
        Ok(self.options.get(key).map(|entry| entry.value.clone()))
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_many(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        self.record(Query::FetchMany(keys.to_vec()));
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.options
                    .get(key)
                    .map(|entry| (key.clone(), entry.value.clone()))
            })
            .collect())
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn insert(&self, key: &str, value: Vec<u8>, autoload: bool) -> Result<bool> {
        self.record(Query::Insert(key.to_string()));
        match self.options.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(StoredOption { value, autoload });
                Ok(true)
            }
        }
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn update(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        self.record(Query::Update(key.to_string()));
        match self.options.get_mut(key) {
            Some(mut entry) => {
                entry.value = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn remove(&self, key: &str) -> Result<bool> {
        self.record(Query::Remove(key.to_string()));
        Ok(self.options.remove(key).is_some())
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_autoloaded(&self) -> Result<HashMap<String, Vec<u8>>> {
        self.record(Query::LoadAutoloaded);
        Ok(self
            .options
            .iter()
            .filter(|entry| entry.autoload)
            .map(|entry| (entry.key().clone(), entry.value.clone()))
            .collect())
    }
}
