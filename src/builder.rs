//! 注入器构造器模块
//!
//! 提供流畅的链式API来配置和创建PROXY头注入器。

use crate::core::bypass::BypassProbe;
use crate::core::classifier::StreamClassifier;
use crate::core::header::HeaderSynthesizer;
use crate::error::{InjectorError, Result};
use crate::injector::{InjectorConfig, ProxyInjector};
use std::net::Ipv4Addr;

/// 注入器构造器
///
/// 提供流畅的API来配置和创建注入器实例。
///
/// # 示例
///
/// ```rust
/// use haproxy_injector::InjectorBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let injector = InjectorBuilder::new()
///     .with_dest_port(25565)
///     .enable_secondary_bypass()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct InjectorBuilder {
    dest_addr: Ipv4Addr,
    dest_port: u16,
    secondary_bypass: bool,
    custom_probes: Vec<Box<dyn BypassProbe>>,
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectorBuilder {
    /// 创建新的注入器构造器
    pub fn new() -> Self {
        let config = InjectorConfig::default();
        Self {
            dest_addr: config.dest_addr,
            dest_port: config.dest_port,
            secondary_bypass: config.enable_secondary_bypass,
            custom_probes: Vec::new(),
        }
    }

    /// 从配置创建构造器
    pub fn from_config(config: InjectorConfig) -> Self {
        Self {
            dest_addr: config.dest_addr,
            dest_port: config.dest_port,
            secondary_bypass: config.enable_secondary_bypass,
            custom_probes: Vec::new(),
        }
    }

    /// 设置合成头的目标地址
    pub fn with_dest_addr(mut self, addr: Ipv4Addr) -> Self {
        self.dest_addr = addr;
        self
    }

    /// 设置合成头的目标端口
    pub fn with_dest_port(mut self, port: u16) -> Self {
        self.dest_port = port;
        self
    }

    /// 启用次级协议旁路启发式
    pub fn enable_secondary_bypass(mut self) -> Self {
        self.secondary_bypass = true;
        self
    }

    /// 禁用次级协议旁路启发式
    pub fn disable_secondary_bypass(mut self) -> Self {
        self.secondary_bypass = false;
        self
    }

    /// 追加自定义旁路探测器
    pub fn add_bypass_probe(mut self, probe: Box<dyn BypassProbe>) -> Self {
        self.custom_probes.push(probe);
        self
    }

    /// 验证配置
    fn validate(&self) -> Result<()> {
        if self.dest_port == 0 {
            return Err(InjectorError::config_error("目标端口不能为0"));
        }
        Ok(())
    }

    /// 构建注入器实例
    pub fn build(self) -> Result<ProxyInjector> {
        self.validate()?;

        let mut classifier = if self.secondary_bypass {
            StreamClassifier::new()
        } else {
            StreamClassifier::without_bypass_probes()
        };

        for probe in self.custom_probes {
            classifier.add_bypass_probe(probe);
        }

        let synthesizer = HeaderSynthesizer::new()
            .with_dest_addr(self.dest_addr)
            .with_dest_port(self.dest_port);

        Ok(ProxyInjector::assemble(classifier, synthesizer))
    }
}
