//! # Rover CLI
//!
//! Rover JSON 命令协议的回环调试工具。
//!
//! ## 使用方式
//!
//! ```bash
//! # 逐行分发命令文档（- 或缺省表示 stdin），打印解码后的能力调用
//! rover-cli dispatch commands.jsonl
//!
//! echo '{"type":"command","command":{"kind":"stop"}}' | rover-cli dispatch
//!
//! # 生成一条立即命令的标准线上文本
//! rover-cli encode-immediate --left -0.1 --right 0.3 --timeout-ms 200
//! ```

use std::fs;
use std::io::{self, Read};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rover_protocol::{DriveConfig, Engine, Handlers, encode_immediate};
use tracing::debug;

/// Rover CLI - 命令协议调试工具
#[derive(Parser, Debug)]
#[command(name = "rover-cli")]
#[command(about = "Loop-back dispatch tool for the Rover JSON command protocol", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 逐行分发 JSON 命令文档，打印解码后的能力调用
    Dispatch {
        /// 输入文件（每行一个文档；- 或缺省表示 stdin）
        file: Option<String>,
    },

    /// 编码一条立即命令（now_ms 取进程时钟）
    EncodeImmediate {
        /// 左轮速度分数 [-1.0, 1.0]
        #[arg(long, allow_negative_numbers = true)]
        left: f32,

        /// 右轮速度分数 [-1.0, 1.0]
        #[arg(long, allow_negative_numbers = true)]
        right: f32,

        /// 失效超时（毫秒）
        #[arg(long, default_value_t = 200)]
        timeout_ms: u32,
    },
}

/// 把每次能力调用打印到 stdout 的回环能力表
fn logging_handlers() -> Handlers {
    Handlers::new()
        .on_drive(|direction, speed, duration, distance| {
            println!(
                "drive        direction={} speed={} duration={} distance={}",
                direction.as_str(),
                speed,
                duration,
                distance
            );
        })
        .on_turn(|radius, angle, speed, duration| {
            println!(
                "turn         radius={} angle={} speed={} duration={}",
                radius, angle, speed, duration
            );
        })
        .on_stop(|| println!("stop"))
        .on_clear_queue(|| println!("clear_queue"))
        .on_led_hsv(|h, s, v| println!("led_hsv      h={} s={} v={}", h, s, v))
        .on_drive_config(|cfg: DriveConfig| {
            let json = serde_json::to_string(&cfg).unwrap_or_default();
            println!("drive_config {}", json);
        })
        .on_immediate(|left, right, timeout, now| {
            println!(
                "immediate    left={:.3} right={:.3} timeout={} now={}",
                left, right, timeout, now
            );
        })
}

fn dispatch(file: Option<String>) -> Result<()> {
    let input = match file.as_deref() {
        None | Some("-") => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("读取 stdin 失败")?;
            buffer
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("读取 {} 失败", path))?,
    };

    let engine = Engine::new(logging_handlers());

    let mut dispatched = 0usize;
    let mut rejected = 0usize;
    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        dispatched += 1;
        if let Err(err) = engine.handle_json(line.as_bytes()) {
            eprintln!("line {}: {}", line_no + 1, err);
            rejected += 1;
        }
    }
    debug!("Dispatched {} document(s), {} rejected", dispatched, rejected);

    if rejected > 0 {
        anyhow::bail!("{} document(s) rejected", rejected);
    }
    Ok(())
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rover_protocol=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dispatch { file } => dispatch(file),

        Commands::EncodeImmediate {
            left,
            right,
            timeout_ms,
        } => {
            let now_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u32;
            println!("{}", encode_immediate(left, right, timeout_ms, now_ms));
            Ok(())
        }
    }
}
