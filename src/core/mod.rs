//! 核心模块
//!
//! 包含签名匹配、旁路判定、流分类与合成头构建。

pub mod bypass;
pub mod classifier;
pub mod header;
pub mod signature;

pub use bypass::{BypassProbe, SecondaryProtocolProbe};
pub use classifier::{Classification, StreamClassifier, TransportKind};
pub use header::{HeaderSynthesizer, SyntheticHeader};
