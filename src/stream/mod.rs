//! 流改写模块
//!
//! 提供每连接的改写状态机与聚合统计。

pub mod rewriter;

pub use rewriter::StreamRewriter;

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 每连接改写状态
///
/// 不变式：`Armed`至多发生一次迁出，`Decided`为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewriteState {
    /// 初始态，等待首块数据
    Armed,
    /// 终态，已做出结论（原样放行或注入后放行）
    Decided,
}

impl RewriteState {
    /// 检查是否已终局
    pub fn is_decided(&self) -> bool {
        matches!(self, RewriteState::Decided)
    }
}

/// 单次处理的产出
///
/// 状态机不直接操作处理链，而是把结论交还调用方，由宿主
/// 适配层执行确定性的插入/摘除动作。
#[derive(Debug)]
pub enum RewriteOutcome {
    /// 结论已定：原样转发，摘除本阶段
    Passthrough(BytesMut),
    /// 结论已定：转发合成头+原始数据的合并缓冲区，摘除本阶段
    Injected(BytesMut),
    /// 数据不足，未作结论：原样转发，保持挂载
    Undecided(BytesMut),
}

impl RewriteOutcome {
    /// 宿主是否应当摘除该处理阶段
    pub fn should_detach(&self) -> bool {
        !matches!(self, RewriteOutcome::Undecided(_))
    }

    /// 取出应转发给下一阶段的缓冲区
    pub fn into_bytes(self) -> BytesMut {
        match self {
            RewriteOutcome::Passthrough(buf)
            | RewriteOutcome::Injected(buf)
            | RewriteOutcome::Undecided(buf) => buf,
        }
    }

    /// 本次处理是否注入了合成头
    pub fn injected(&self) -> bool {
        matches!(self, RewriteOutcome::Injected(_))
    }
}

/// 改写聚合统计
///
/// 跨连接共享，只含单调递增计数器。
#[derive(Debug, Default)]
pub struct RewriteStats {
    already_headered: AtomicU64,
    bypassed: AtomicU64,
    injected: AtomicU64,
    insufficient: AtomicU64,
    unsupported_family: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStatsSnapshot {
    /// 已携带头而放行的连接数
    pub already_headered: u64,
    /// 旁路放行的连接数
    pub bypassed: u64,
    /// 注入合成头的连接数
    pub injected: u64,
    /// 首块不足而未判定的次数
    pub insufficient: u64,
    /// 因地址族不支持而跳过合成的连接数
    pub unsupported_family: u64,
}

impl RewriteStats {
    /// 创建新的统计
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_already_headered(&self) {
        self.already_headered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypassed(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_injected(&self) {
        self.injected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insufficient(&self) {
        self.insufficient.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unsupported_family(&self) {
        self.unsupported_family.fetch_add(1, Ordering::Relaxed);
    }

    /// 读取当前快照
    pub fn snapshot(&self) -> RewriteStatsSnapshot {
        RewriteStatsSnapshot {
            already_headered: self.already_headered.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            injected: self.injected.load(Ordering::Relaxed),
            insufficient: self.insufficient.load(Ordering::Relaxed),
            unsupported_family: self.unsupported_family.load(Ordering::Relaxed),
        }
    }
}

impl RewriteStatsSnapshot {
    /// 已终局连接总数
    pub fn total_decided(&self) -> u64 {
        self.already_headered + self.bypassed + self.injected + self.unsupported_family
    }

    /// 注入占比
    pub fn injection_rate(&self) -> f64 {
        let total = self.total_decided();
        if total == 0 {
            0.0
        } else {
            self.injected as f64 / total as f64
        }
    }
}
