//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了选项缓存的后端，包括L1快速缓存和L2选项存储。

pub mod l1;
pub mod l2;
pub mod memory;
pub mod redis_store;
