use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use post_relay::clients::GhostClient;
use post_relay::config::Config;
use post_relay::infrastructure::ChromeLauncher;
use post_relay::orchestrator::{self, Relay};
use post_relay::utils::logging;
use post_relay::workflow::SubmissionFlow;

/// 把 Ghost 文章转发到第三方发布表单
#[derive(Parser)]
#[command(name = "post_relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 显示浏览器窗口（覆盖 HEADLESS）
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动 webhook 服务
    Serve {
        /// 监听端口（默认取 PORT）
        #[arg(long)]
        port: Option<u16>,
    },
    /// 立即转发一篇文章
    Submit {
        /// Ghost 文章 id
        post_id: String,
    },
    /// 列出最近的文章，检查 Ghost 连接
    Posts {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// 登录目标站点，探测表单上的编辑器和控件
    Detect,
}

fn build_relay(config: &Config) -> Relay<GhostClient, ChromeLauncher> {
    let source = GhostClient::new(&config.ghost_api_url, &config.ghost_content_api_key);
    let flow = SubmissionFlow::new(
        ChromeLauncher::new(config.launch_options()),
        config.target.clone(),
        config.audit_recorder(),
    );
    Relay::new(source, flow)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::from_env().await.context("加载配置失败")?;
    if cli.headed {
        config.target.headless = false;
    }

    match cli.command {
        Commands::Serve { port } => {
            logging::log_startup("serve", config.target.headless);
            if config.ghost_webhook_secret.is_some() {
                warn!("已配置 GHOST_WEBHOOK_SECRET，但当前不校验 webhook 签名");
            }
            let port = port.unwrap_or(config.port);
            orchestrator::serve(Arc::new(build_relay(&config)), port).await?;
        }
        Commands::Submit { post_id } => {
            logging::log_startup("submit", config.target.headless);
            let report = build_relay(&config)
                .handle(&post_id)
                .await
                .with_context(|| format!("转发文章 {} 失败", post_id))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Posts { limit } => {
            let client = GhostClient::new(&config.ghost_api_url, &config.ghost_content_api_key);
            let posts = client.list_recent(limit).await?;
            info!("{}", "-".repeat(60));
            for post in &posts {
                let date = post
                    .published_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "草稿".to_string());
                info!("  [{}]  {}", date, post.title);
                info!("           id: {}", post.id);
            }
            info!("{}", "-".repeat(60));
        }
        Commands::Detect => {
            logging::log_startup("detect", config.target.headless);
            let report = build_relay(&config).flow().detect().await?;
            report.log();
        }
    }

    Ok(())
}
