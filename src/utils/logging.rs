/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖；重复调用不会报错
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 运行模式（serve / submit / ...）
/// - `headless`: 是否无头模式
pub fn log_startup(mode: &str, headless: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} 模式", mode);
    info!("🖥️ 浏览器: {}", if headless { "无头" } else { "有界面" });
    info!("{}", "=".repeat(60));
}

/// 记录单篇文章转发完成信息
///
/// # 参数
/// - `title`: 文章标题
/// - `warnings`: 警告数量
/// - `screenshots`: 截图数量
pub fn log_relay_complete(title: &str, warnings: usize, screenshots: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✅ 已提交: {}", truncate_text(title, 60));
    info!("⚠️ 警告: {}  📷 截图: {}", warnings, screenshots);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
