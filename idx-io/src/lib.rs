use std::fs;
use std::path::{Path, PathBuf};

use idx_config::WriteConfig;
use idx_core::document::IdxDocument;
use idx_core::ecad::EcadDesign;
use thiserror::Error;
use tracing::info;

pub mod namespace;
pub mod writer;
pub mod xml;

pub use namespace::{Namespace, NamespaceError, Tag, resolve_tag};
pub use writer::{IdxWriter, format_number};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid design {path:?}: {source}")]
    InvalidDesign {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("xml writer failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("serialized document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub trait DesignLoader {
    fn load(&self, path: &Path) -> Result<EcadDesign, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &IdxDocument, path: &Path) -> Result<(), IoError>;
}

/// 读取 JSON 设计、写出 `.idx` 文档。
#[derive(Debug, Clone, Default)]
pub struct IdxFacade {
    writer: IdxWriter,
}

impl IdxFacade {
    pub fn new(config: WriteConfig) -> Self {
        Self {
            writer: IdxWriter::new(config),
        }
    }

    pub fn writer(&self) -> &IdxWriter {
        &self.writer
    }

    pub fn parse_design(text: &str, path: &Path) -> Result<EcadDesign, IoError> {
        serde_json::from_str(text).map_err(|source| IoError::InvalidDesign {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DesignLoader for IdxFacade {
    fn load(&self, path: &Path) -> Result<EcadDesign, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_design(&data, path)
    }
}

impl DocumentSaver for IdxFacade {
    fn save(&self, document: &IdxDocument, path: &Path) -> Result<(), IoError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("idx") | Some("xml") => {}
            Some("idz") => {
                return Err(IoError::UnsupportedFeature(format!(
                    "compressed IDZ packaging for {path:?}"
                )));
            }
            other => {
                return Err(IoError::UnsupportedFeature(format!(
                    "output extension {other:?} for {path:?}"
                )));
            }
        }
        let text = self.writer.serialize(document)?;
        fs::write(path, text.as_bytes()).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = text.len(), "IDX 文档已写出");
        Ok(())
    }
}
