/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n练习生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(input: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 练习提取与生成");
    info!("📄 输入文档: {}", input);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录分块结果
pub fn log_blocks_found(total_lines: usize, keys: &[&str]) {
    info!("✓ 文档共 {} 行，切分出 {} 个练习", total_lines, keys.len());
    for key in keys {
        info!("   • {}", key);
    }
}

/// 记录单个练习开始处理
pub fn log_exercise_start(index: usize, total: usize, key: &str) {
    info!("\n{}", "─".repeat(60));
    info!("🎨 处理第 {}/{} 个练习: {}", index, total, key);
}

/// 打印最终统计信息
///
/// # 参数
/// - `generated`: 生成成功数量
/// - `failed`: 生成失败数量
/// - `flagged`: 需要人工复查的练习数量
/// - `output_path`: LaTeX 输出路径
pub fn print_final_stats(generated: usize, failed: usize, flagged: usize, output_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 生成成功: {}", generated);
    info!("❌ 生成失败: {}", failed);
    info!("⚠️ 需要复查: {}", flagged);
    info!("{}", "=".repeat(60));
    info!("\nLaTeX 已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
