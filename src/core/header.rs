//! 合成头构建模块
//!
//! 根据连接的真实对端地址构建固定布局的PROXY v2二进制头。
//! 目标侧填回环地址与约定端口，使下游解码器针对目标侧的
//! 合法性校验在任何物理网卡上都能通过。

use crate::core::signature::V2_SIGNATURE;
use crate::error::{InjectorError, Result};
use bytes::{BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// 版本/命令字节：版本2，命令PROXY
pub const VERSION_COMMAND: u8 = 0x21;

/// 地址族/传输字节：AF_INET（IPv4）+ STREAM（TCP）
pub const FAMILY_TRANSPORT: u8 = 0x11;

/// 地址块长度：4+4+2+2
pub const ADDRESS_BLOCK_LEN: u16 = 12;

/// 合成头总长度（字节）
pub const SYNTHETIC_HEADER_LEN: usize = 28;

/// 默认目标端口（服务端约定监听端口）
pub const DEFAULT_DEST_PORT: u16 = 25565;

/// 不可变的28字节合成头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticHeader {
    bytes: [u8; SYNTHETIC_HEADER_LEN],
    source: SocketAddr,
}

impl SyntheticHeader {
    /// 获取头部字节视图
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 获取编码进头部的源地址
    pub fn source(&self) -> SocketAddr {
        self.source
    }

    /// 头部长度（恒为28）
    pub fn len(&self) -> usize {
        SYNTHETIC_HEADER_LEN
    }

    /// 头部是否为空（恒为false，满足惯例）
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 将头部与原始负载合并为单一缓冲区
    ///
    /// 原始字节的所有权转移进合并缓冲区，调用方不得再独立使用。
    pub fn prepend_to(&self, payload: BytesMut) -> BytesMut {
        let mut combined = BytesMut::with_capacity(SYNTHETIC_HEADER_LEN + payload.len());
        combined.put_slice(&self.bytes);
        combined.put(payload);
        combined
    }
}

/// 合成头构建器
#[derive(Debug, Clone)]
pub struct HeaderSynthesizer {
    dest_addr: Ipv4Addr,
    dest_port: u16,
}

impl HeaderSynthesizer {
    /// 创建使用默认目标侧（127.0.0.1:25565）的构建器
    pub fn new() -> Self {
        Self {
            dest_addr: Ipv4Addr::LOCALHOST,
            dest_port: DEFAULT_DEST_PORT,
        }
    }

    /// 设置目标地址
    pub fn with_dest_addr(mut self, addr: Ipv4Addr) -> Self {
        self.dest_addr = addr;
        self
    }

    /// 设置目标端口
    pub fn with_dest_port(mut self, port: u16) -> Self {
        self.dest_port = port;
        self
    }

    /// 获取目标地址
    pub fn dest_addr(&self) -> Ipv4Addr {
        self.dest_addr
    }

    /// 获取目标端口
    pub fn dest_port(&self) -> u16 {
        self.dest_port
    }

    /// 根据对端地址合成PROXY v2头
    ///
    /// 对端非IPv4时返回[`InjectorError::UnsupportedAddressFamily`]，
    /// 不产生部分头。
    pub fn synthesize(&self, peer: SocketAddr) -> Result<SyntheticHeader> {
        let source_ip = match peer.ip() {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) => {
                return Err(InjectorError::unsupported_address_family(peer.to_string()));
            }
        };

        let mut buf = BytesMut::with_capacity(SYNTHETIC_HEADER_LEN);
        buf.put_slice(V2_SIGNATURE);
        buf.put_u8(VERSION_COMMAND);
        buf.put_u8(FAMILY_TRANSPORT);
        buf.put_u16(ADDRESS_BLOCK_LEN);
        buf.put_slice(&source_ip.octets());
        buf.put_slice(&self.dest_addr.octets());
        buf.put_u16(peer.port());
        buf.put_u16(self.dest_port);

        let mut bytes = [0u8; SYNTHETIC_HEADER_LEN];
        bytes.copy_from_slice(&buf);

        Ok(SyntheticHeader {
            bytes,
            source: peer,
        })
    }
}

impl Default for HeaderSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_exact_layout() {
        let synthesizer = HeaderSynthesizer::new();
        let peer: SocketAddr = "203.0.113.7:54321".parse().unwrap();
        let header = synthesizer.synthesize(peer).unwrap();

        let mut expected = Vec::with_capacity(28);
        expected.extend_from_slice(V2_SIGNATURE);
        expected.extend_from_slice(&[0x21, 0x11, 0x00, 0x0C]);
        expected.extend_from_slice(&[0xCB, 0x00, 0x71, 0x07]); // 203.0.113.7
        expected.extend_from_slice(&[0x7F, 0x00, 0x00, 0x01]); // 127.0.0.1
        expected.extend_from_slice(&[0xD4, 0x31]); // 54321
        expected.extend_from_slice(&[0x63, 0xDD]); // 25565

        assert_eq!(header.len(), 28);
        assert_eq!(header.as_bytes(), expected.as_slice());
        assert_eq!(header.source(), peer);
    }

    #[test]
    fn test_synthesize_rejects_ipv6() {
        let synthesizer = HeaderSynthesizer::new();
        let peer: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        let err = synthesizer.synthesize(peer).unwrap_err();
        assert!(matches!(
            err,
            InjectorError::UnsupportedAddressFamily { .. }
        ));
    }

    #[test]
    fn test_custom_destination() {
        let synthesizer = HeaderSynthesizer::new()
            .with_dest_addr(Ipv4Addr::new(10, 0, 0, 1))
            .with_dest_port(25577);
        let peer: SocketAddr = "198.51.100.2:40000".parse().unwrap();
        let header = synthesizer.synthesize(peer).unwrap();

        assert_eq!(&header.as_bytes()[20..24], &[10, 0, 0, 1]);
        assert_eq!(&header.as_bytes()[26..28], &25577u16.to_be_bytes());
    }

    #[test]
    fn test_prepend_transfers_payload() {
        let synthesizer = HeaderSynthesizer::new();
        let peer: SocketAddr = "192.0.2.10:1024".parse().unwrap();
        let header = synthesizer.synthesize(peer).unwrap();

        let payload = BytesMut::from(&b"\x10\x00\xF2\x05"[..]);
        let combined = header.prepend_to(payload);

        assert_eq!(combined.len(), 28 + 4);
        assert_eq!(&combined[..28], header.as_bytes());
        assert_eq!(&combined[28..], b"\x10\x00\xF2\x05");
    }
}
