//! Gatherly CLI
//!
//! 查看、标记已读、实时接收当前用户的通知。

use anyhow::Result;
use clap::{Parser, Subcommand};
use gatherly_notify::{
    cli::{
        format_json, handle_list, handle_read, handle_read_all, handle_session, handle_unread,
        handle_watch, require_session, SessionArgs,
    },
    ClientConfig, SessionFile,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "gatherly")]
#[command(about = "Gatherly notifications from the terminal")]
#[command(version)]
struct Cli {
    /// 后端地址（覆盖配置文件和 GATHERLY_API_URL）
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 管理会话
    Session(SessionArgs),
    /// 显示最近通知
    List {
        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },
    /// 打印未读数
    Unread,
    /// 标记单条通知已读
    Read {
        /// 通知 ID
        id: String,
    },
    /// 全部标记已读
    ReadAll,
    /// 保持连接并实时打印通知
    Watch {
        /// 输出 JSON lines
        #[arg(long)]
        json: bool,
    },
    /// 打印生效的配置
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 用 RUST_LOG 控制日志级别，如 RUST_LOG=debug gatherly watch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gatherly_notify=info,gatherly=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::auto_load()?;
    if let Some(url) = &cli.api_url {
        config.apply_api_url(url);
    }
    let sessions = SessionFile::default_location();

    match cli.command {
        Commands::Session(args) => handle_session(args, &sessions)?,
        Commands::List { json } => handle_list(config, require_session(&sessions)?, json).await?,
        Commands::Unread => handle_unread(config, require_session(&sessions)?).await?,
        Commands::Read { id } => handle_read(config, require_session(&sessions)?, &id).await?,
        Commands::ReadAll => handle_read_all(config, require_session(&sessions)?).await?,
        Commands::Watch { json } => handle_watch(config, require_session(&sessions)?, json).await?,
        Commands::Config => println!("{}", format_json(&config)),
    }

    Ok(())
}
