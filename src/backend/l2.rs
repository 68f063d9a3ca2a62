//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了L2选项存储后端的接口。每个方法对应后端的一次往返。

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// 后端往返记录
///
/// 由记录查询日志的后端（如 [`super::memory::MemoryBackend`]）产生。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// 单键读取
    Fetch(String),
    /// 多键批量读取，保持请求顺序
    FetchMany(Vec<String>),
    /// 新增选项
    Insert(String),
    /// 更新选项
    Update(String),
    /// 删除选项
    Remove(String),
    /// 加载全部自动加载选项
    LoadAutoloaded,
}

/// 选项存储后端
#[async_trait]
pub trait OptionBackend: Send + Sync {
    /// 后端名称，用于日志与指标
    fn name(&self) -> &str;

    /// 读取单个选项
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 一次往返读取多个选项
    ///
    /// # 返回值
    ///
    /// 只包含存在的键
    async fn fetch_many(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>>;

    /// 新增选项
    ///
    /// # 返回值
    ///
    /// 选项已存在时返回 false 且不覆盖
    async fn insert(&self, key: &str, value: Vec<u8>, autoload: bool) -> Result<bool>;

    /// 更新已有选项的值，保留其自动加载标志
    ///
    /// # 返回值
    ///
    /// 选项不存在时返回 false
    async fn update(&self, key: &str, value: Vec<u8>) -> Result<bool>;

    /// 删除选项
    async fn remove(&self, key: &str) -> Result<bool>;

    /// 一次往返加载全部自动加载选项
    async fn load_autoloaded(&self) -> Result<HashMap<String, Vec<u8>>>;

    /// 是否支持批量读取
    fn supports_batch_fetch(&self) -> bool {
        true
    }
}
