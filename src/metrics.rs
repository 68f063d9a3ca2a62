//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了选项缓存与预取拦截器的指标收集。

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{span, Level};

/// 指标收集器
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: "service:layer:op:result"
    pub requests_total: Arc<Mutex<HashMap<String, u64>>>,
    /// 操作耗时
    /// key: "service:layer:op" -> (total_duration_secs, count)
    pub operation_duration: Arc<Mutex<HashMap<String, (f64, u64)>>>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

impl Metrics {
    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `service` - 服务名称
    /// * `layer` - 层（L1/L2/prime）
    /// * `op` - 操作类型
    /// * `result` - 操作结果
    pub fn record_request(&self, service: &str, layer: &str, op: &str, result: &str) {
        let span = span!(Level::TRACE, "cache_request", service, layer, op, result);
        let _enter = span.enter();
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        if let Ok(mut map) = self.requests_total.lock() {
            *map.entry(key).or_insert(0) += 1;
        }
    }

    /// 记录操作耗时
    pub fn record_duration(&self, service: &str, layer: &str, op: &str, duration_secs: f64) {
        let key = format!("{}:{}:{}", service, layer, op);
        if let Ok(mut map) = self.operation_duration.lock() {
            let entry = map.entry(key).or_insert((0.0, 0));
            entry.0 += duration_secs;
            entry.1 += 1;
        }
    }

    /// 读取某个计数器的当前值
    pub fn request_count(&self, service: &str, layer: &str, op: &str, result: &str) -> u64 {
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        self.requests_total
            .lock()
            .map(|map| map.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为 Prometheus 文本格式
pub fn get_metrics_string() -> String {
    let metrics = &GLOBAL_METRICS;
    let mut output = String::new();

    if let Ok(reqs) = metrics.requests_total.lock() {
        let mut entries: Vec<_> = reqs.iter().collect();
        entries.sort();
        for (k, v) in entries {
            output.push_str(&format!("cache_requests_total{{labels=\"{}\"}} {}\n", k, v));
        }
    }

    if let Ok(dur) = metrics.operation_duration.lock() {
        for (k, (total, count)) in dur.iter() {
            let parts: Vec<&str> = k.split(':').collect();
            if parts.len() == 3 {
                output.push_str(&format!(
                    "cache_operation_duration_seconds_sum{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
                    parts[0], parts[1], parts[2], total
                ));
                output.push_str(&format!(
                    "cache_operation_duration_seconds_count{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
                    parts[0], parts[1], parts[2], count
                ));
            }
        }
    }
    output
}
