//! 单次导出：读取设计、按输出形式构建并写出文档。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use idx_builder::IdxBuilder;
use idx_config::{AppConfig, BuildConfig, OutputVariant};
use idx_core::ecad::EcadDesign;
use idx_io::{DesignLoader, DocumentSaver, IdxFacade};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ExportJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub variant: OutputVariant,
}

/// 计算输出文件路径。
///
/// 单一形式时 `output` 为文件，若是已存在的目录则写入 `<输入文件名>.idx`；
/// `both` 时在 `output`（目录）或其父目录下写出 `<stem>.traditional.idx` 与 `<stem>.simplified.idx`。
pub fn output_paths(job: &ExportJob) -> Vec<(bool, PathBuf)> {
    let input_stem = job
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "design".to_string());
    let (dir, stem) = if job.output.is_dir() {
        (job.output.clone(), input_stem)
    } else {
        let dir = job
            .output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = job
            .output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or(input_stem);
        (dir, stem)
    };

    match job.variant {
        OutputVariant::Traditional | OutputVariant::Simplified => {
            let simplified = job.variant == OutputVariant::Simplified;
            let path = if job.output.is_dir() {
                dir.join(format!("{stem}.idx"))
            } else {
                job.output.clone()
            };
            vec![(simplified, path)]
        }
        OutputVariant::Both => vec![
            (false, dir.join(format!("{stem}.traditional.idx"))),
            (true, dir.join(format!("{stem}.simplified.idx"))),
        ],
    }
}

pub fn run(job: &ExportJob, config: &AppConfig) -> Result<Vec<PathBuf>> {
    let facade = IdxFacade::new(config.write.clone());
    let design = facade
        .load(&job.input)
        .with_context(|| format!("无法读取设计 {}", job.input.display()))?;
    info!(
        design = %design.name,
        components = design.components.len(),
        holes = design.holes.len(),
        "设计已加载"
    );

    let mut build = config.build.clone();
    if build.timestamp.is_none() {
        build.timestamp = Some(Utc::now());
    }

    let targets = output_paths(job);
    match targets.as_slice() {
        [(first_mode, first), (second_mode, second)] => {
            // 两种形式各自持有构建器与写出器，互不共享状态。
            let (a, b) = rayon::join(
                || render(&design, &build, &facade, *first_mode, first),
                || render(&design, &build, &facade, *second_mode, second),
            );
            a?;
            b?;
        }
        single => {
            for (simplified, path) in single {
                render(&design, &build, &facade, *simplified, path)?;
            }
        }
    }
    Ok(targets.into_iter().map(|(_, path)| path).collect())
}

fn render(
    design: &EcadDesign,
    build: &BuildConfig,
    facade: &IdxFacade,
    use_simplified: bool,
    path: &Path,
) -> Result<()> {
    let config = BuildConfig {
        use_simplified,
        ..build.clone()
    };
    let mode = if use_simplified { "simplified" } else { "traditional" };
    let document = IdxBuilder::new(config)
        .build(design)
        .with_context(|| format!("构建 {mode} 文档失败"))?;
    facade
        .save(&document, path)
        .with_context(|| format!("写出 {} 失败", path.display()))?;
    info!(mode, entities = document.entity_count(), "文档已生成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn job(output: PathBuf, variant: OutputVariant) -> ExportJob {
        ExportJob {
            input: PathBuf::from("boards/demo.json"),
            output,
            variant,
        }
    }

    #[test]
    fn single_variant_writes_given_file() {
        let paths = output_paths(&job(PathBuf::from("out/board.idx"), OutputVariant::Traditional));
        assert_eq!(paths, vec![(false, PathBuf::from("out/board.idx"))]);
    }

    #[test]
    fn single_variant_into_directory_uses_input_stem() {
        let dir = tempdir().unwrap();
        let paths = output_paths(&job(dir.path().to_path_buf(), OutputVariant::Simplified));
        assert_eq!(paths, vec![(true, dir.path().join("demo.idx"))]);
    }

    #[test]
    fn both_variants_share_stem() {
        let paths = output_paths(&job(PathBuf::from("out/board.idx"), OutputVariant::Both));
        assert_eq!(
            paths,
            vec![
                (false, PathBuf::from("out/board.traditional.idx")),
                (true, PathBuf::from("out/board.simplified.idx")),
            ]
        );
    }
}
