//! 流改写状态机模块
//!
//! 对单条连接执行一次性的"检测-决策-动作"流程。状态机本身
//! 不触碰处理链，只返回[`RewriteOutcome`]，由宿主适配层完成
//! 插入/摘除，避免在遍历处理链的同时修改它。

use crate::core::classifier::{Classification, StreamClassifier, TransportKind};
use crate::core::header::HeaderSynthesizer;
use crate::error::InjectorError;
use crate::stream::{RewriteOutcome, RewriteState, RewriteStats};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 每连接的流改写器
///
/// 生命周期与单条连接绑定：由宿主在接入时创建并挂载，首块
/// 数据产出终局结论后即应摘除。`Decided`之后不再做任何检视。
pub struct StreamRewriter {
    conn_id: Uuid,
    classifier: Arc<StreamClassifier>,
    synthesizer: HeaderSynthesizer,
    stats: Arc<RewriteStats>,
    transport: TransportKind,
    peer: Option<SocketAddr>,
    state: RewriteState,
}

impl std::fmt::Debug for StreamRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRewriter")
            .field("conn_id", &self.conn_id)
            .field("transport", &self.transport)
            .field("peer", &self.peer)
            .field("state", &self.state)
            .finish()
    }
}

impl StreamRewriter {
    /// 创建新的流改写器
    pub fn new(
        classifier: Arc<StreamClassifier>,
        synthesizer: HeaderSynthesizer,
        stats: Arc<RewriteStats>,
        transport: TransportKind,
        peer: Option<SocketAddr>,
    ) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            classifier,
            synthesizer,
            stats,
            transport,
            peer,
            state: RewriteState::Armed,
        }
    }

    /// 连接ID（用于日志关联）
    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    /// 当前状态
    pub fn state(&self) -> RewriteState {
        self.state
    }

    /// 是否已终局
    pub fn is_decided(&self) -> bool {
        self.state.is_decided()
    }

    /// 处理一块入站数据
    ///
    /// 仅首块观察到的数据参与分类。原始字节的所有权转移进
    /// 返回的缓冲区，要么原封不动，要么作为合并缓冲区的尾部，
    /// 绝不复制或丢弃。
    pub fn process(&mut self, buf: BytesMut) -> RewriteOutcome {
        if self.state.is_decided() {
            // 终态后不再检视；宿主未及时摘除时的兜底
            return RewriteOutcome::Passthrough(buf);
        }

        let classification = self.classifier.classify(&buf, self.transport);
        debug!(
            conn_id = %self.conn_id,
            %classification,
            prefix_len = buf.len(),
            "首块数据分类完成"
        );

        match classification {
            Classification::AlreadyHeadered => {
                self.state = RewriteState::Decided;
                self.stats.record_already_headered();
                RewriteOutcome::Passthrough(buf)
            }
            Classification::Bypass => {
                self.state = RewriteState::Decided;
                self.stats.record_bypassed();
                RewriteOutcome::Passthrough(buf)
            }
            Classification::Insufficient => {
                // 不缓存半截前缀，原样转发，下一块重新判定
                self.stats.record_insufficient();
                RewriteOutcome::Undecided(buf)
            }
            Classification::NeedsSynthesis => {
                self.state = RewriteState::Decided;
                self.synthesize_and_prepend(buf)
            }
        }
    }

    fn synthesize_and_prepend(&mut self, buf: BytesMut) -> RewriteOutcome {
        let Some(peer) = self.peer else {
            warn!(conn_id = %self.conn_id, "连接缺少对端地址，跳过合成，原样放行");
            self.stats.record_unsupported_family();
            return RewriteOutcome::Passthrough(buf);
        };

        match self.synthesizer.synthesize(peer) {
            Ok(header) => {
                self.stats.record_injected();
                debug!(conn_id = %self.conn_id, %peer, "已注入合成头");
                RewriteOutcome::Injected(header.prepend_to(buf))
            }
            Err(err @ InjectorError::UnsupportedAddressFamily { .. }) => {
                // 每连接仅触发一次；放行后由下游自行处置
                warn!(conn_id = %self.conn_id, %err, "合成被跳过，原样放行");
                self.stats.record_unsupported_family();
                RewriteOutcome::Passthrough(buf)
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, %err, "合成失败，原样放行");
                self.stats.record_unsupported_family();
                RewriteOutcome::Passthrough(buf)
            }
        }
    }
}
