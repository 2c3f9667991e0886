//! 混合流量监听示例
//!
//! 在一个TCP端口上同时接受三类连接：自带PROXY头的转发流量、
//! 不带头的直连、次级协议流量，并打印每条连接注入前后的视图。
//!
//! 运行：`cargo run --example mixed_listener`
//! 然后用 `nc 127.0.0.1 25565` 发送任意数据观察效果。

use haproxy_injector::{detect_and_inject, InjectorBuilder, TransportKind};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔌 HAProxy-Injector 混合流量监听示例");

    let injector = InjectorBuilder::new()
        .with_dest_port(25565)
        .enable_secondary_bypass()
        .build()?;

    let listener = TcpListener::bind("127.0.0.1:25565").await?;
    println!("📡 监听 127.0.0.1:25565 （Ctrl-C 退出）");

    loop {
        let (socket, peer) = listener.accept().await?;
        let injector = injector.clone();

        tokio::spawn(async move {
            println!("\n➡️  新连接: {}", peer);

            let rewriter = injector.rewriter(TransportKind::Tcp, Some(peer));
            let mut stream =
                match detect_and_inject(socket, rewriter, Some(Duration::from_secs(5))).await {
                    Ok(stream) => stream,
                    Err(err) => {
                        println!("❌ 首块读取失败: {}", err);
                        return;
                    }
                };

            // 下游解码器视角：读取前64字节观察实际到达的内容
            let mut preview = vec![0u8; 64];
            match stream.read(&mut preview).await {
                Ok(0) => println!("⚪ 连接未发送数据即关闭"),
                Ok(n) => {
                    println!("📥 下游收到 {} 字节:", n);
                    print_hex(&preview[..n]);
                }
                Err(err) => println!("❌ 读取失败: {}", err),
            }

            let stats = injector.stats();
            println!(
                "📊 统计: 带头放行={} 旁路={} 已注入={} 注入占比={:.0}%",
                stats.already_headered,
                stats.bypassed,
                stats.injected,
                stats.injection_rate() * 100.0
            );
        });
    }
}

fn print_hex(bytes: &[u8]) {
    for chunk in bytes.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
        println!("   {}", hex.join(" "));
    }
}
