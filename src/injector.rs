//! 注入器门面模块
//!
//! 将分类器、合成器与每连接改写器装配为一个可共享的入口，
//! 并负责把接入回调安装到宿主钩子上。

use crate::core::classifier::{Classification, StreamClassifier, TransportKind};
use crate::core::header::{HeaderSynthesizer, DEFAULT_DEST_PORT};
use crate::error::{InjectorError, Result};
use crate::hook::{AcceptorHook, AttachFn, InstallRegistry};
use crate::stream::{RewriteStats, RewriteStatsSnapshot, StreamRewriter};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};

/// 注入器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectorConfig {
    /// 合成头的目标地址
    pub dest_addr: Ipv4Addr,
    /// 合成头的目标端口
    pub dest_port: u16,
    /// 是否启用次级协议旁路启发式
    pub enable_secondary_bypass: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            dest_addr: Ipv4Addr::LOCALHOST,
            dest_port: DEFAULT_DEST_PORT,
            enable_secondary_bypass: true,
        }
    }
}

impl InjectorConfig {
    /// 从JSON字符串加载配置
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// PROXY头注入器
///
/// 跨连接共享的不可变装配体；每连接状态全部住在
/// [`StreamRewriter`]里，彼此互不影响。
#[derive(Debug, Clone)]
pub struct ProxyInjector {
    classifier: Arc<StreamClassifier>,
    synthesizer: HeaderSynthesizer,
    stats: Arc<RewriteStats>,
    registry: Arc<InstallRegistry>,
}

impl ProxyInjector {
    pub(crate) fn assemble(
        classifier: StreamClassifier,
        synthesizer: HeaderSynthesizer,
    ) -> Self {
        Self {
            classifier: Arc::new(classifier),
            synthesizer,
            stats: Arc::new(RewriteStats::new()),
            registry: Arc::new(InstallRegistry::new()),
        }
    }

    /// 对一段前缀做分类（无副作用）
    pub fn classify(&self, prefix: &[u8], transport: TransportKind) -> Classification {
        self.classifier.classify(prefix, transport)
    }

    /// 直接合成一个头（跳过分类）
    pub fn synthesize(&self, peer: SocketAddr) -> Result<crate::core::header::SyntheticHeader> {
        self.synthesizer.synthesize(peer)
    }

    /// 为一条新连接创建改写器
    pub fn rewriter(
        &self,
        transport: TransportKind,
        peer: Option<SocketAddr>,
    ) -> StreamRewriter {
        StreamRewriter::new(
            Arc::clone(&self.classifier),
            self.synthesizer.clone(),
            Arc::clone(&self.stats),
            transport,
            peer,
        )
    }

    /// 读取聚合统计快照
    pub fn stats(&self) -> RewriteStatsSnapshot {
        self.stats.snapshot()
    }

    /// 监听器注册表（幂等保障）
    pub fn registry(&self) -> &InstallRegistry {
        &self.registry
    }

    /// 将接入回调安装到宿主钩子的全部监听器上
    ///
    /// 每个监听器至多安装一次；重复安装被静默吸收。单个监听器
    /// 找不到注入点只影响该监听器，记一次错误日志后继续。
    /// 返回本次实际完成安装的监听器数量。
    pub fn install(&self, hook: &mut dyn AcceptorHook) -> Result<usize> {
        let listeners = hook.listeners()?;
        let mut installed = 0usize;

        for listener in listeners {
            if !self.registry.try_claim(&listener) {
                continue;
            }

            let injector = self.clone();
            let attach: Arc<AttachFn> =
                Arc::new(move |transport, peer| injector.rewriter(transport, peer));

            match hook.register(&listener, attach) {
                Ok(()) => {
                    info!(listener = %listener, "接入回调安装完成");
                    installed += 1;
                }
                Err(InjectorError::AlreadyAttached { .. }) => {
                    // 宿主侧已有同名阶段，与占用成功等价
                    installed += 1;
                }
                Err(err) => {
                    error!(listener = %listener, %err, "监听器注入点不可用");
                    self.registry.release(&listener);
                }
            }
        }

        Ok(installed)
    }
}
