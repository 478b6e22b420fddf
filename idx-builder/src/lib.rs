pub mod builder;
mod plan;

pub use builder::IdxBuilder;

pub mod errors {
    use idx_core::curve::GeometryError;
    use thiserror::Error;

    /// 错误类别，供调用方在不匹配具体字段的情况下分支处理。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ErrorKind {
        Configuration,
        Reference,
        Geometry,
        UnsupportedFeature,
    }

    /// 构建期错误。每个变体都带上出错实体的名称/id 与字段名。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum BuildError {
        #[error("configuration error in {entity}.{field}: {message}")]
        Configuration {
            entity: String,
            field: &'static str,
            message: String,
        },
        #[error("{entity}.{field} references unknown id `{reference}`")]
        Reference {
            entity: String,
            field: &'static str,
            reference: String,
        },
        #[error("invalid geometry in {entity}.{field}: {source}")]
        Geometry {
            entity: String,
            field: &'static str,
            #[source]
            source: GeometryError,
        },
        #[error("unsupported feature in {entity}: {feature}")]
        UnsupportedFeature { entity: String, feature: String },
    }

    impl BuildError {
        pub fn kind(&self) -> ErrorKind {
            match self {
                BuildError::Configuration { .. } => ErrorKind::Configuration,
                BuildError::Reference { .. } => ErrorKind::Reference,
                BuildError::Geometry { .. } => ErrorKind::Geometry,
                BuildError::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
            }
        }

        /// 出错实体的名称或 id。
        pub fn entity(&self) -> &str {
            match self {
                BuildError::Configuration { entity, .. }
                | BuildError::Reference { entity, .. }
                | BuildError::Geometry { entity, .. }
                | BuildError::UnsupportedFeature { entity, .. } => entity,
            }
        }

        /// 悬空引用的 id，仅 `Reference` 变体返回值。
        pub fn offending_reference(&self) -> Option<&str> {
            match self {
                BuildError::Reference { reference, .. } => Some(reference),
                _ => None,
            }
        }

        pub(crate) fn configuration(
            entity: impl Into<String>,
            field: &'static str,
            message: impl Into<String>,
        ) -> Self {
            BuildError::Configuration {
                entity: entity.into(),
                field,
                message: message.into(),
            }
        }

        pub(crate) fn reference(
            entity: impl Into<String>,
            field: &'static str,
            reference: impl Into<String>,
        ) -> Self {
            BuildError::Reference {
                entity: entity.into(),
                field,
                reference: reference.into(),
            }
        }

        pub(crate) fn geometry(
            entity: impl Into<String>,
            field: &'static str,
            source: GeometryError,
        ) -> Self {
            BuildError::Geometry {
                entity: entity.into(),
                field,
                source,
            }
        }
    }
}
