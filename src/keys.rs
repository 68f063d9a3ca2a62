//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! transient 键命名约定的解析器。
//!
//! 一个 transient 由两个选项组成：值键 `_transient_{name}` 与超时键
//! `_transient_timeout_{name}`。命名空间变体（站点级 transient）使用
//! `_site_transient_{name}` 与 `_site_transient_timeout_{name}`。

/// 值键前缀
pub const VALUE_PREFIX: &str = "_transient_";
/// 超时键前缀
pub const TIMEOUT_PREFIX: &str = "_transient_timeout_";
/// 命名空间变体的值键前缀
pub const SITE_VALUE_PREFIX: &str = "_site_transient_";
/// 命名空间变体的超时键前缀
pub const SITE_TIMEOUT_PREFIX: &str = "_site_transient_timeout_";

/// 选项键的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientKey<'a> {
    /// 不符合 transient 命名约定
    NotATransient,
    /// transient 的值键
    Value { name: &'a str, namespaced: bool },
    /// transient 的超时键
    Timeout { name: &'a str, namespaced: bool },
}

impl<'a> TransientKey<'a> {
    /// 解析选项键
    ///
    /// 超时前缀是值前缀的延伸，因此必须先匹配超时前缀。
    /// 名称为空的键不视为 transient。裸超时前缀 `_transient_timeout_`
    /// 不会退回按值前缀解析成名称 `timeout_`，因此不会触发预取。
    ///
    /// # 参数
    ///
    /// * `key` - 选项键
    /// * `namespaced` - 是否识别命名空间变体前缀
    pub fn parse(key: &'a str, namespaced: bool) -> Self {
        let parsed = Self::strip(key, TIMEOUT_PREFIX, VALUE_PREFIX, false).or_else(|| {
            if namespaced {
                Self::strip(key, SITE_TIMEOUT_PREFIX, SITE_VALUE_PREFIX, true)
            } else {
                None
            }
        });
        parsed.unwrap_or(TransientKey::NotATransient)
    }

    fn strip(key: &'a str, timeout: &str, value: &str, namespaced: bool) -> Option<Self> {
        if let Some(name) = key.strip_prefix(timeout) {
            return (!name.is_empty()).then_some(TransientKey::Timeout { name, namespaced });
        }
        key.strip_prefix(value)
            .filter(|name| !name.is_empty())
            .map(|name| TransientKey::Value { name, namespaced })
    }

    /// 逻辑名称与命名空间标志
    pub fn name(&self) -> Option<(&'a str, bool)> {
        match *self {
            TransientKey::NotATransient => None,
            TransientKey::Value { name, namespaced } | TransientKey::Timeout { name, namespaced } => {
                Some((name, namespaced))
            }
        }
    }
}

/// 由逻辑名称构造值键
pub fn value_key(name: &str, namespaced: bool) -> String {
    if namespaced {
        format!("{}{}", SITE_VALUE_PREFIX, name)
    } else {
        format!("{}{}", VALUE_PREFIX, name)
    }
}

/// 由逻辑名称构造超时键
pub fn timeout_key(name: &str, namespaced: bool) -> String {
    if namespaced {
        format!("{}{}", SITE_TIMEOUT_PREFIX, name)
    } else {
        format!("{}{}", TIMEOUT_PREFIX, name)
    }
}

/// 批量预取请求：值键在前，超时键在后
pub fn prime_pair(name: &str, namespaced: bool) -> [String; 2] {
    [value_key(name, namespaced), timeout_key(name, namespaced)]
}
