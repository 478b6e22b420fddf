use std::path::PathBuf;

use clap::Parser;
use idx_config::{AppConfig, ConfigError, OutputVariant};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod export;

/// 把 ECAD 设计（JSON）导出为 IDX/EDMD 全量基线文档。
#[derive(Debug, Parser)]
#[command(name = "idx-export", version)]
struct Cli {
    /// 输入设计文件（JSON）
    #[arg(long, short)]
    input: PathBuf,
    /// 输出文件或目录
    #[arg(long, short)]
    output: PathBuf,
    /// 配置文件路径，缺省时自动发现
    #[arg(long)]
    config: Option<PathBuf>,
    /// traditional | simplified | both，覆盖配置中的输出形式
    #[arg(long)]
    variant: Option<OutputVariant>,
}

fn main() {
    let cli = Cli::parse();

    let (config, discovery_error) = match load_configuration(cli.config.as_ref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(&config);
    if let Some(err) = discovery_error {
        report_discovery_failure(&err);
    }
    info!(input = %cli.input.display(), "启动 IDX 导出");

    let variant = cli.variant.unwrap_or(config.output.variant);
    let job = export::ExportJob {
        input: cli.input,
        output: cli.output,
        variant,
    };
    match export::run(&job, &config) {
        Ok(written) => {
            for path in written {
                info!(path = %path.display(), "导出完成");
            }
        }
        Err(err) => {
            error!("导出失败: {err:#}");
            std::process::exit(1);
        }
    }
}

/// 显式指定的配置必须可用；自动发现失败时退回内建默认值，并把错误留到日志初始化之后再报告。
fn load_configuration(
    override_path: Option<&PathBuf>,
) -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path).map(|cfg| (cfg, None)),
        None => match AppConfig::discover() {
            Ok(cfg) => Ok((cfg, None)),
            Err(err) => Ok((AppConfig::default(), Some(err))),
        },
    }
}

fn report_discovery_failure(err: &ConfigError) {
    match err {
        ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
            warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
        }
        ConfigError::Context { .. } | ConfigError::Invalid { .. } => {
            warn!(error = %err, "加载默认配置失败，使用内建默认值");
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
