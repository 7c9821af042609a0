use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use exercise_forge::utils::logging;
use exercise_forge::{Config, DocumentPipeline};

const USAGE: &str = "用法: exercise_forge <文档.txt> [配置.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().context(USAGE)?);

    // 加载配置
    let config = match args.next() {
        Some(path) => Config::from_toml_file(Path::new(&path))?,
        None => {
            let config = Config::from_env();
            config.validate()?;
            config
        }
    };

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::init_log_file(&config.output_log_file)?;

    // 运行
    let summary = DocumentPipeline::from_config(config).run(&input).await?;

    if summary.failed > 0 && summary.generated + summary.flagged == 0 {
        anyhow::bail!("全部 {} 个练习生成失败", summary.failed);
    }
    Ok(())
}
