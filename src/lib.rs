//! # HAProxy-Injector: PROXY协议检测与头注入框架
//!
//! 让开启了"强制PROXY协议"的服务端同时接受两类连接：经受信
//! 转发器而来、自带PROXY头的连接，以及不带头的直连。框架内联
//! 在每条新连接上，检视首块字节——已有合法头或属于旁路流量则
//! 原样放行；否则用连接的真实对端地址合成一个28字节的v2头，
//! 前置到原始字节流之前，使下游解码器无法区分。
//!
//! ## 特性
//!
//! - **一次决策**: 每条连接只在首块数据上做一次分类，绝不重复处理
//! - **零破坏**: 原始负载字节永不复制、丢弃或乱序
//! - **可替换旁路**: 次级协议启发式隔离在独立接口之后
//! - **宿主无关**: 监听器发现与处理链改动抽象为接入钩子
//!
//! ## 快速开始
//!
//! 构建注入器实例，为每条新连接创建改写器，对首块数据调用
//! `process`并按返回结论摘除阶段。

#![deny(missing_docs)]
#![warn(clippy::all)]

// 核心模块
pub mod core;
pub mod error;

// 流处理模块
pub mod stream;

// 宿主边界
pub mod hook;

// 装配与构造
pub mod builder;
pub mod injector;

// 重新导出核心类型
pub use crate::builder::InjectorBuilder;
pub use crate::core::{
    bypass::{BypassProbe, SecondaryProtocolProbe},
    classifier::{Classification, StreamClassifier, TransportKind},
    header::{HeaderSynthesizer, SyntheticHeader},
};
pub use crate::error::{InjectorError, Result};
pub use crate::injector::{InjectorConfig, ProxyInjector};
pub use crate::stream::{RewriteOutcome, RewriteState, StreamRewriter};

#[cfg(feature = "runtime-tokio")]
pub use crate::hook::tokio::{detect_and_inject, InjectedStream};

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 库描述
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
