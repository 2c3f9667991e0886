//! Tokio接入适配模块
//!
//! 面向tokio流的参考适配：读取连接的首块数据，驱动一次
//! [`StreamRewriter`]，再把（可能已前置合成头的）字节与流的
//! 剩余部分拼成统一的[`InjectedStream`]交给下游解码器。

use crate::error::{InjectorError, Result};
use crate::stream::StreamRewriter;
use bytes::BytesMut;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

/// 首块读取缓冲区大小
///
/// 足以容纳任何v1/v2头与主协议握手首包。
const FIRST_CHUNK_CAPACITY: usize = 512;

pin_project! {
    /// 带前置字节的流
    ///
    /// 先吐出决策阶段产出的缓冲区（原始首块，或合成头+首块的
    /// 合并缓冲区），随后透传内部流，字节顺序与内容对下游完全
    /// 等价于客户端自己发出了这些数据。
    #[derive(Debug)]
    pub struct InjectedStream<S> {
        prefix: BytesMut,
        #[pin]
        inner: S,
    }
}

impl<S> InjectedStream<S> {
    /// 用前置缓冲区包装一个流
    pub fn new(prefix: BytesMut, inner: S) -> Self {
        Self { prefix, inner }
    }

    /// 尚未被读取的前置字节数
    pub fn prefix_remaining(&self) -> usize {
        self.prefix.len()
    }

    /// 拆出内部流（丢弃未读前置字节）
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead> AsyncRead for InjectedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.project();

        if !this.prefix.is_empty() {
            let n = this.prefix.len().min(buf.remaining());
            let chunk = this.prefix.split_to(n);
            buf.put_slice(&chunk);
            return Poll::Ready(Ok(()));
        }

        this.inner.poll_read(cx, buf)
    }
}

impl<S: AsyncWrite> AsyncWrite for InjectedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.project().inner.poll_write(cx, data)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.project().inner.poll_shutdown(cx)
    }
}

/// 读取首块数据并执行一次改写决策
///
/// 单次读取即为"首块"：读到多少字节就按多少字节分类，与
/// 事件驱动宿主的行为一致。`timeout`为`None`时无限等待首块；
/// 超时返回[`InjectorError::Timeout`]。连接在首块到达前关闭
/// 时没有任何需要回滚的外部效果，返回前置为空的流。
pub async fn detect_and_inject<S>(
    mut stream: S,
    mut rewriter: StreamRewriter,
    timeout: Option<Duration>,
) -> Result<InjectedStream<S>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(FIRST_CHUNK_CAPACITY);

    let n = match timeout {
        Some(limit) => tokio::time::timeout(limit, stream.read_buf(&mut buf))
            .await
            .map_err(|_| InjectorError::timeout(limit.as_millis() as u64))??,
        None => stream.read_buf(&mut buf).await?,
    };

    if n == 0 {
        // 对端未发数据即关闭，无事可做
        return Ok(InjectedStream::new(BytesMut::new(), stream));
    }

    let outcome = rewriter.process(buf);
    Ok(InjectedStream::new(outcome.into_bytes(), stream))
}
