//! 旁路流量判定模块
//!
//! 识别绝不允许注入合成头的流量。内置的次级协议启发式针对
//! 与主协议复用同一端口的另一类握手流量：假设主协议的首包
//! 类型标记恒为零，非零即视为旁路。该规则是启发式猜测而非
//! 完整解析，因此隔离在[`BypassProbe`]接口之后，便于日后换成
//! 精确解析器而不触碰状态机其余部分。

use crate::core::signature;

/// 次级协议的非握手魔法值（首字节）
pub const SECONDARY_MAGIC: u8 = 0xFE;

/// 旁路探测接口
///
/// 实现者只读取前缀字节，不得产生副作用。
pub trait BypassProbe: Send + Sync {
    /// 探测器名称（用于日志）
    fn name(&self) -> &'static str;

    /// 判定前缀是否属于必须旁路的流量
    fn is_bypass(&self, prefix: &[u8]) -> bool;
}

/// 次级协议旁路探测器
///
/// 两条规则，任一命中即旁路：
/// 1. 首字节等于非握手魔法值`0xFE`；
/// 2. 至少2字节，首字节非零（疑似短长度前缀）且第二字节
///    （包类型标记）非零。
///
/// 形似PROXY签名开头的前缀一律避让：那是主路径（签名匹配）
/// 的判定对象，旁路启发式不得抢先认领。
#[derive(Debug, Clone, Default)]
pub struct SecondaryProtocolProbe;

impl SecondaryProtocolProbe {
    /// 创建新的次级协议旁路探测器
    pub fn new() -> Self {
        Self
    }
}

impl BypassProbe for SecondaryProtocolProbe {
    fn name(&self) -> &'static str {
        "secondary-protocol"
    }

    fn is_bypass(&self, prefix: &[u8]) -> bool {
        let Some(&first) = prefix.first() else {
            return false;
        };

        if first == SECONDARY_MAGIC {
            return true;
        }

        if signature::is_signature_prefix(prefix) {
            return false;
        }

        if prefix.len() >= 2 {
            let packet_type = prefix[1];
            // 主协议握手包的类型标记恒为0x00
            if first > 0 && packet_type != 0x00 {
                return true;
            }
        }

        false
    }
}
