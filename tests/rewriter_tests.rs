//! 流改写器场景测试
//!
//! 通过注入器门面走完"接入-处理-摘除"的完整路径，覆盖混合
//! 流量下的各类连接及聚合统计。

use bytes::BytesMut;
use haproxy_injector::{InjectorBuilder, RewriteOutcome, TransportKind};
use std::net::SocketAddr;

fn peer(s: &str) -> Option<SocketAddr> {
    s.parse().ok()
}

#[test]
fn test_mixed_traffic_scenario() {
    let injector = InjectorBuilder::new().build().unwrap();

    // 连接1：带v1头的转发流量，原样放行
    let mut rw1 = injector.rewriter(TransportKind::Tcp, peer("192.0.2.1:5000"));
    let headered = b"PROXY TCP4 192.0.2.1 127.0.0.1 5000 25565\r\n\x10\x00";
    let out1 = rw1.process(BytesMut::from(&headered[..]));
    assert!(out1.should_detach());
    assert!(!out1.injected());
    assert_eq!(&out1.into_bytes()[..], &headered[..]);

    // 连接2：直连流量，注入合成头
    let mut rw2 = injector.rewriter(TransportKind::Tcp, peer("203.0.113.7:54321"));
    let direct = [0x10, 0x00, 0xF2, 0x05, 0x09, 0x6C];
    let out2 = rw2.process(BytesMut::from(&direct[..]));
    assert!(out2.injected());
    let combined = out2.into_bytes();
    assert_eq!(&combined[28..], &direct[..]);

    // 连接3：次级协议流量，旁路
    let mut rw3 = injector.rewriter(TransportKind::Tcp, peer("198.51.100.2:6000"));
    let secondary = [0xFE, 0x01, 0x00];
    let out3 = rw3.process(BytesMut::from(&secondary[..]));
    assert!(out3.should_detach());
    assert!(!out3.injected());

    // 连接4：本地传输，无条件旁路
    let mut rw4 = injector.rewriter(TransportKind::Local, None);
    let out4 = rw4.process(BytesMut::from(&b"internal"[..]));
    assert!(out4.should_detach());
    assert!(!out4.injected());

    let stats = injector.stats();
    assert_eq!(stats.already_headered, 1);
    assert_eq!(stats.injected, 1);
    assert_eq!(stats.bypassed, 2);
    assert_eq!(stats.total_decided(), 4);
}

#[test]
fn test_bypass_takes_precedence_over_injection() {
    let injector = InjectorBuilder::new().build().unwrap();
    let mut rw = injector.rewriter(TransportKind::Tcp, peer("203.0.113.7:54321"));

    // 若无旁路规则，这个前缀本会触发注入
    let outcome = rw.process(BytesMut::from(&[0x07, 0x33, 0x00, 0x00, 0x00, 0x00][..]));
    assert!(outcome.should_detach());
    assert!(!outcome.injected());
}

#[test]
fn test_forwarding_byte_for_byte_after_decision() {
    let injector = InjectorBuilder::new().build().unwrap();
    let mut rw = injector.rewriter(TransportKind::Tcp, peer("203.0.113.7:54321"));

    let first = [0x10, 0x00, 0xF2, 0x05, 0x09, 0x6C];
    let _ = rw.process(BytesMut::from(&first[..]));
    assert!(rw.is_decided());

    // 终态之后的数据逐字节透传，包括形似PROXY头的内容
    let later = b"PROXY \xFE\x01arbitrary payload";
    let outcome = rw.process(BytesMut::from(&later[..]));
    assert!(matches!(outcome, RewriteOutcome::Passthrough(_)));
    assert_eq!(&outcome.into_bytes()[..], &later[..]);
}

#[test]
fn test_insufficient_does_not_consume_bytes() {
    let injector = InjectorBuilder::new().build().unwrap();
    let mut rw = injector.rewriter(TransportKind::Tcp, peer("203.0.113.7:54321"));

    // 不足6字节的块原样转发，不缓存、不拼接
    let tiny = [0x10, 0x00, 0xF2];
    let outcome = rw.process(BytesMut::from(&tiny[..]));
    assert!(!outcome.should_detach());
    assert_eq!(&outcome.into_bytes()[..], &tiny[..]);

    let stats = injector.stats();
    assert_eq!(stats.insufficient, 1);
    assert_eq!(stats.total_decided(), 0);
}

#[test]
fn test_missing_peer_address_passthrough() {
    let injector = InjectorBuilder::new().build().unwrap();
    let mut rw = injector.rewriter(TransportKind::Tcp, None);

    let payload = [0x10, 0x00, 0xF2, 0x05, 0x09, 0x6C];
    let outcome = rw.process(BytesMut::from(&payload[..]));
    assert!(outcome.should_detach());
    assert!(!outcome.injected());
    assert_eq!(&outcome.into_bytes()[..], &payload[..]);
    assert_eq!(injector.stats().unsupported_family, 1);
}

#[test]
fn test_stats_injection_rate() {
    let injector = InjectorBuilder::new().build().unwrap();

    for i in 0..3 {
        let mut rw = injector.rewriter(
            TransportKind::Tcp,
            peer(&format!("203.0.113.{}:54321", i + 1)),
        );
        let _ = rw.process(BytesMut::from(&[0x10, 0x00, 0xF2, 0x05, 0x09, 0x6C][..]));
    }
    let mut rw = injector.rewriter(TransportKind::Local, None);
    let _ = rw.process(BytesMut::from(&b"internal"[..]));

    let stats = injector.stats();
    assert_eq!(stats.injected, 3);
    assert_eq!(stats.total_decided(), 4);
    assert!((stats.injection_rate() - 0.75).abs() < f64::EPSILON);
}
