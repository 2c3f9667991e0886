//! 接入钩子边界模块
//!
//! 监听器的发现与处理链的改动属于宿主环境，核心只依赖这里
//! 定义的抽象表面。幂等保障在这一层完成：同一监听器至多
//! 注册一次接入回调，同一连接至多挂载一个改写阶段。

#[cfg(feature = "runtime-tokio")]
pub mod tokio;

#[cfg(feature = "runtime-tokio")]
pub use self::tokio::{detect_and_inject, InjectedStream};

use crate::core::classifier::TransportKind;
use crate::error::Result;
use crate::stream::StreamRewriter;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// 改写阶段在处理链上的注册名
pub const STAGE_NAME: &str = "haproxy-injector";

/// 新连接接入回调
///
/// 宿主对每条新接受的连接恰好调用一次，用返回的改写器作为
/// 该连接处理链最前端的阶段。
pub type AttachFn = dyn Fn(TransportKind, Option<SocketAddr>) -> StreamRewriter + Send + Sync;

/// 宿主接入钩子抽象
///
/// 由各宿主环境自行实现；核心不关心监听器如何被发现。
pub trait AcceptorHook {
    /// 枚举当前监听器标识
    fn listeners(&self) -> Result<Vec<String>>;

    /// 在指定监听器上注册接入回调
    ///
    /// 同一监听器重复注册时实现方应返回
    /// [`InjectorError::AlreadyAttached`]，调用侧静默吸收。
    ///
    /// [`InjectorError::AlreadyAttached`]: crate::error::InjectorError::AlreadyAttached
    fn register(&mut self, listener: &str, attach: Arc<AttachFn>) -> Result<()>;
}

/// 幂等注册表
///
/// 以监听器标识为键的"检查并占用"原子操作，防止并发重复注册。
#[derive(Debug, Default)]
pub struct InstallRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl InstallRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试占用一个监听器标识
    ///
    /// 返回`true`表示本次占用成功；`false`表示已被占用，调用方
    /// 不得重复注册。检查与写入在同一锁内完成。
    pub fn try_claim(&self, id: &str) -> bool {
        let mut claimed = self.claimed.lock().expect("install registry poisoned");
        claimed.insert(id.to_string())
    }

    /// 查询标识是否已被占用
    pub fn is_claimed(&self, id: &str) -> bool {
        let claimed = self.claimed.lock().expect("install registry poisoned");
        claimed.contains(id)
    }

    /// 释放一个标识（监听器关闭时）
    pub fn release(&self, id: &str) {
        let mut claimed = self.claimed.lock().expect("install registry poisoned");
        claimed.remove(id);
    }

    /// 已占用的标识数量
    pub fn claimed_count(&self) -> usize {
        let claimed = self.claimed.lock().expect("install registry poisoned");
        claimed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_claim_is_idempotent() {
        let registry = InstallRegistry::new();
        assert!(registry.try_claim("listener-0"));
        assert!(!registry.try_claim("listener-0"));
        assert!(registry.is_claimed("listener-0"));
        assert_eq!(registry.claimed_count(), 1);
    }

    #[test]
    fn test_release_allows_reclaim() {
        let registry = InstallRegistry::new();
        assert!(registry.try_claim("listener-0"));
        registry.release("listener-0");
        assert!(!registry.is_claimed("listener-0"));
        assert!(registry.try_claim("listener-0"));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let registry = Arc::new(InstallRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.try_claim("listener-0"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|claimed| *claimed)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(registry.claimed_count(), 1);
    }
}
