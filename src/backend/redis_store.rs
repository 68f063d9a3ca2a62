//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 基于Redis的选项存储后端。
//!
//! 选项值保存在 `{prefix}{key}` 字符串键中，自动加载的选项名称保存在
//! `{prefix}__autoload` 集合中。

use super::l2::OptionBackend;
use crate::config::L2Config;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::future::Future;
use tokio::time::{timeout, Duration};
use tracing::{debug, instrument};

const AUTOLOAD_INDEX: &str = "__autoload";

// 仅在 SET NX 写入成功时才修改自动加载索引
const INSERT_SCRIPT: &str = r#"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    if ARGV[2] == '1' then
        redis.call('SADD', KEYS[2], ARGV[3])
    else
        redis.call('SREM', KEYS[2], ARGV[3])
    end
    return 1
end
return 0
"#;

const LOAD_AUTOLOADED_SCRIPT: &str = r#"
local names = redis.call('SMEMBERS', KEYS[1])
local out = {}
for _, name in ipairs(names) do
    local val = redis.call('GET', ARGV[1] .. name)
    if val then
        table.insert(out, name)
        table.insert(out, val)
    end
end
return out
"#;

/// Redis 选项存储后端
#[derive(Clone)]
pub struct RedisBackend {
    manager: ConnectionManager,
    key_prefix: String,
    command_timeout_ms: u64,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("key_prefix", &self.key_prefix)
            .field("command_timeout_ms", &self.command_timeout_ms)
            .finish()
    }
}

impl RedisBackend {
    /// 连接到独立部署的 Redis
    ///
    /// # 参数
    ///
    /// * `config` - L2配置
    ///
    /// # 返回值
    ///
    /// 返回新的RedisBackend实例或错误
    #[instrument(skip(config), level = "info", name = "init_redis_backend")]
    pub async fn connect(config: &L2Config) -> Result<Self> {
        let connection_string = config.connection_string.expose_secret().to_string();
        let client = Client::open(connection_string.as_str())?;
        let manager = match timeout(
            Duration::from_millis(config.connection_timeout_ms),
            client.get_connection_manager(),
        )
        .await
        {
            Ok(res) => res?,
            Err(_) => {
                return Err(CacheError::L2Error(format!(
                    "Connection timed out after {}ms",
                    config.connection_timeout_ms
                )));
            }
        };
        debug!("Redis backend connected, prefix={}", config.key_prefix);
        Ok(Self {
            manager,
            key_prefix: config.key_prefix.clone(),
            command_timeout_ms: config.command_timeout_ms,
        })
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn autoload_index(&self) -> String {
        format!("{}{}", self.key_prefix, AUTOLOAD_INDEX)
    }

    async fn with_timeout<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(Duration::from_millis(self.command_timeout_ms), fut).await {
            Ok(res) => res.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(format!(
                "{} timed out after {}ms",
                op, self.command_timeout_ms
            ))),
        }
    }
}

#[async_trait]
impl OptionBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("GET").arg(self.storage_key(key)).clone();
        self.with_timeout("GET", cmd.query_async(&mut conn)).await
    }

    #[instrument(skip(self), level = "debug", fields(key_count = keys.len()))]
    async fn fetch_many(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("MGET");
        for key in keys {
            cmd.arg(self.storage_key(key));
        }
        let values: Vec<Option<Vec<u8>>> =
            self.with_timeout("MGET", cmd.query_async(&mut conn)).await?;
        Ok(keys
            .iter()
            .cloned()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn insert(&self, key: &str, value: Vec<u8>, autoload: bool) -> Result<bool> {
        let mut conn = self.manager.clone();
        let script = redis::Script::new(INSERT_SCRIPT);
        let mut invocation = script.key(self.storage_key(key));
        invocation
            .key(self.autoload_index())
            .arg(value)
            .arg(if autoload { "1" } else { "0" })
            .arg(key);
        let created: i64 = self
            .with_timeout("SET NX", invocation.invoke_async(&mut conn))
            .await?;
        Ok(created == 1)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn update(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("SET")
            .arg(self.storage_key(key))
            .arg(value)
            .arg("XX")
            .clone();
        let updated: Option<String> = self.with_timeout("SET XX", cmd.query_async(&mut conn)).await?;
        Ok(updated.is_some())
    }

    #[instrument(skip(self), level = "debug")]
    async fn remove(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL")
            .arg(self.storage_key(key))
            .cmd("SREM")
            .arg(self.autoload_index())
            .arg(key)
            .ignore();
        let (removed,): (i64,) = self.with_timeout("DEL", pipe.query_async(&mut conn)).await?;
        Ok(removed > 0)
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_autoloaded(&self) -> Result<HashMap<String, Vec<u8>>> {
        let mut conn = self.manager.clone();
        let script = redis::Script::new(LOAD_AUTOLOADED_SCRIPT);
        let mut invocation = script.key(self.autoload_index());
        invocation.arg(&self.key_prefix);
        let flat: Vec<Vec<u8>> = self
            .with_timeout("load_autoloaded", invocation.invoke_async(&mut conn))
            .await?;

        let mut options = HashMap::with_capacity(flat.len() / 2);
        let mut iter = flat.into_iter();
        while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
            options.insert(String::from_utf8_lossy(&name).into_owned(), value);
        }
        debug!("Loaded {} autoloaded options from Redis", options.len());
        Ok(options)
    }
}
