//! PROXY协议签名匹配模块
//!
//! 基于固定魔法字节（Magic Bytes）对连接首部进行纯字节比对。
//! 所有函数均无副作用，对过短的前缀一律返回`false`而非错误，
//! 由调用方结合长度阈值判断"未出现"还是"尚不可判定"。

/// PROXY v1 文本签名（6字节ASCII，含结尾空格）
pub const V1_SIGNATURE: &[u8; 6] = b"PROXY ";

/// PROXY v2 二进制签名（12字节）
pub const V2_SIGNATURE: &[u8; 12] = &[
    0x0D, 0x0A, 0x0D, 0x0A, 0x00, 0x0D, 0x0A, 0x51, 0x55, 0x49, 0x54, 0x0A,
];

/// 判定最少需要观察的字节数（v1签名长度）
pub const MIN_DECISION_BYTES: usize = V1_SIGNATURE.len();

/// v2签名完整判定所需的字节数
pub const V2_DECISION_BYTES: usize = V2_SIGNATURE.len();

/// 检测前缀是否以PROXY v1文本签名开头
///
/// 前缀不足6字节时返回`false`。
pub fn matches_v1(prefix: &[u8]) -> bool {
    prefix.len() >= V1_SIGNATURE.len() && prefix[..V1_SIGNATURE.len()] == V1_SIGNATURE[..]
}

/// 检测前缀是否以PROXY v2二进制签名开头
///
/// 前缀不足12字节时返回`false`。
pub fn matches_v2(prefix: &[u8]) -> bool {
    prefix.len() >= V2_SIGNATURE.len() && prefix[..V2_SIGNATURE.len()] == V2_SIGNATURE[..]
}

/// 检测前缀是否可能是某个PROXY签名的开头
///
/// 与[`matches_v1`]/[`matches_v2`]不同，这里对不完整前缀做
/// 部分比对：只要已观察到的字节与某个签名的对应前缀一致即
/// 返回`true`。旁路启发式据此避让真实的PROXY头。
pub fn is_signature_prefix(prefix: &[u8]) -> bool {
    let n1 = prefix.len().min(V1_SIGNATURE.len());
    let n2 = prefix.len().min(V2_SIGNATURE.len());
    prefix[..n1] == V1_SIGNATURE[..n1] || prefix[..n2] == V2_SIGNATURE[..n2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_signature_match() {
        assert!(matches_v1(b"PROXY TCP4 192.168.1.1 10.0.0.1 12345 80\r\n"));
        assert!(matches_v1(b"PROXY "));
        // 大小写敏感
        assert!(!matches_v1(b"proxy TCP4 1.2.3.4 5.6.7.8 1 2\r\n"));
        // 缺少结尾空格
        assert!(!matches_v1(b"PROXYX"));
    }

    #[test]
    fn test_v1_short_prefix_is_false() {
        assert!(!matches_v1(b""));
        assert!(!matches_v1(b"PROXY"));
        assert!(!matches_v1(b"PR"));
    }

    #[test]
    fn test_v2_signature_match() {
        let mut buf = V2_SIGNATURE.to_vec();
        buf.extend_from_slice(&[0x21, 0x11, 0x00, 0x0C]);
        assert!(matches_v2(&buf));
        assert!(matches_v2(&V2_SIGNATURE[..]));
    }

    #[test]
    fn test_v2_short_or_corrupt_is_false() {
        assert!(!matches_v2(&V2_SIGNATURE[..11]));
        let mut corrupt = V2_SIGNATURE.to_vec();
        corrupt[7] = 0x52;
        assert!(!matches_v2(&corrupt));
    }

    #[test]
    fn test_signatures_do_not_overlap() {
        // v2签名以CR开头，不可能同时命中v1
        assert!(!matches_v1(&V2_SIGNATURE[..]));
    }

    #[test]
    fn test_signature_prefix_partial_match() {
        assert!(is_signature_prefix(b"PROXY TCP4"));
        assert!(is_signature_prefix(b"PRO"));
        assert!(is_signature_prefix(&V2_SIGNATURE[..5]));
        assert!(is_signature_prefix(&V2_SIGNATURE[..]));
        assert!(!is_signature_prefix(b"GET / HTTP/1.1"));
        assert!(!is_signature_prefix(&[0x10, 0x00, 0xF2]));
    }
}
