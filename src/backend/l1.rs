//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了L1快速缓存，基于内存保存单个选项的读取结果。

use moka::future::Cache;
use tracing::{debug, instrument};

/// 快速缓存中的条目
///
/// 不存在的选项同样会被缓存，避免重复回源。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CachedOption {
    /// 选项存在
    Present(Vec<u8>),
    /// 选项在后端中不存在
    Absent,
}

impl CachedOption {
    /// 转换为可选的字节值
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            CachedOption::Present(bytes) => Some(bytes),
            CachedOption::Absent => None,
        }
    }
}

impl From<Option<Vec<u8>>> for CachedOption {
    fn from(value: Option<Vec<u8>>) -> Self {
        match value {
            Some(bytes) => CachedOption::Present(bytes),
            None => CachedOption::Absent,
        }
    }
}

/// L1缓存后端实现
///
/// 使用Moka作为底层缓存库
#[derive(Clone)]
pub struct L1Backend {
    cache: Cache<String, CachedOption>,
}

impl L1Backend {
    /// 创建新的L1缓存后端实例
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大缓存条目数
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// 获取缓存条目
    ///
    /// # 返回值
    ///
    /// 未缓存时返回None；缓存了"不存在"时返回 `Some(CachedOption::Absent)`
    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, key: &str) -> Option<CachedOption> {
        let result = self.cache.get(key).await;
        debug!("L1 get: key={}, cached={}", key, result.is_some());
        result
    }

    /// 是否已缓存（包含否定缓存）
    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// 写入缓存条目
    #[instrument(skip(self, entry), level = "debug")]
    pub async fn insert(&self, key: &str, entry: CachedOption) {
        debug!(
            "L1 insert: key={}, present={}",
            key,
            matches!(entry, CachedOption::Present(_))
        );
        self.cache.insert(key.to_string(), entry).await;
    }

    /// 删除缓存项
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, key: &str) {
        debug!("L1 delete: key={}", key);
        self.cache.invalidate(key).await;
    }

    /// 清空 L1 缓存
    #[instrument(skip(self), level = "debug")]
    pub fn clear(&self) {
        debug!("L1 clear: 清空所有缓存项");
        self.cache.invalidate_all();
    }
}
