//! 流分类核心模块
//!
//! 组合签名匹配与旁路判定，对每条连接的首个数据块产出
//! 唯一的分类结论。分类本身无状态：相同的前缀与传输类型
//! 必然得到相同结论，且绝不改动前缀内容或读取位置。

use crate::core::bypass::{BypassProbe, SecondaryProtocolProbe};
use crate::core::signature::{self, MIN_DECISION_BYTES, V2_DECISION_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 连接的传输类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// 真实网络套接字
    Tcp,
    /// 进程内/本地通道（无真实网络对端）
    Local,
}

impl TransportKind {
    /// 检查是否为本地传输
    pub fn is_local(&self) -> bool {
        matches!(self, TransportKind::Local)
    }
}

/// 首块数据的分类结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// 已携带合法的v1或v2头，原样放行
    AlreadyHeadered,
    /// 旁路流量，永不注入
    Bypass,
    /// 无头且非旁路，需要合成头
    NeedsSynthesis,
    /// 观察到的字节数不足以判定
    Insufficient,
}

impl Classification {
    /// 结论是否已终局（可据此摘除处理阶段）
    pub fn is_decided(&self) -> bool {
        !matches!(self, Classification::Insufficient)
    }

    /// 结论是否意味着原样放行（不改动任何字节）
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            Classification::AlreadyHeadered | Classification::Bypass
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyHeadered => write!(f, "already-headered"),
            Self::Bypass => write!(f, "bypass"),
            Self::NeedsSynthesis => write!(f, "needs-synthesis"),
            Self::Insufficient => write!(f, "insufficient"),
        }
    }
}

/// 流分类器
///
/// 按固定次序执行判定：本地传输旁路 → 长度门限 → 次级协议
/// 旁路 → v1签名 → v2签名。6到11字节之间未命中v1即判定为
/// 需要合成，不等待满12字节再排除v2。
pub struct StreamClassifier {
    bypass_probes: Vec<Box<dyn BypassProbe>>,
}

impl fmt::Debug for StreamClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamClassifier")
            .field("bypass_probe_count", &self.bypass_probes.len())
            .finish()
    }
}

impl StreamClassifier {
    /// 创建带内置次级协议旁路探测的分类器
    pub fn new() -> Self {
        Self {
            bypass_probes: vec![Box::new(SecondaryProtocolProbe::new())],
        }
    }

    /// 创建不含任何旁路探测的分类器
    pub fn without_bypass_probes() -> Self {
        Self {
            bypass_probes: Vec::new(),
        }
    }

    /// 追加自定义旁路探测器
    pub fn add_bypass_probe(&mut self, probe: Box<dyn BypassProbe>) {
        self.bypass_probes.push(probe);
    }

    /// 获取旁路探测器数量
    pub fn bypass_probe_count(&self) -> usize {
        self.bypass_probes.len()
    }

    /// 对首块数据前缀产出分类结论
    pub fn classify(&self, prefix: &[u8], transport: TransportKind) -> Classification {
        // 本地通道没有可编码的真实地址，无条件旁路
        if transport.is_local() {
            return Classification::Bypass;
        }

        if prefix.len() < MIN_DECISION_BYTES {
            return Classification::Insufficient;
        }

        for probe in &self.bypass_probes {
            if probe.is_bypass(prefix) {
                return Classification::Bypass;
            }
        }

        if signature::matches_v1(prefix) {
            return Classification::AlreadyHeadered;
        }

        if prefix.len() >= V2_DECISION_BYTES {
            if signature::matches_v2(prefix) {
                return Classification::AlreadyHeadered;
            }
            return Classification::NeedsSynthesis;
        }

        // 6..12字节且非v1：不等待更多数据，直接判定需要合成
        Classification::NeedsSynthesis
    }
}

impl Default for StreamClassifier {
    fn default() -> Self {
        Self::new()
    }
}
