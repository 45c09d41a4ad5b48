use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to open template `{name}` at {}", path.display())]
    TemplateNotFound {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template include cycle: {chain}")]
    CyclicInclude { chain: String },

    #[error("could not open {}", path.display())]
    SpecNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed line {line}: `{text}`")]
    MalformedLine { line: usize, text: String },

    #[error("unexpected field `{field}` in page `{page}`")]
    UnknownField { page: String, field: String },

    #[error("failed to read content for page `{page}` at {}", path.display())]
    ContentNotFound {
        page: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no page named `{0}`")]
    PageNotFound(String),

    #[error("found `#{{list:{group}:...}}` but no `#{{list:end}}`")]
    MissingEndBlock { group: String },

    #[error("`#{{list:end}}` appears before the end of `#{{list:{group}:...}}`")]
    BlockOrderError { group: String },

    #[error("list block `{group}` keeps expanding into new list blocks")]
    CyclicList { group: String },

    #[error("post fields of page `{page}` never stop expanding")]
    PostFieldCycle { page: String },

    #[error("unfilled variable in page `{page}`: {placeholder}")]
    UnresolvedVariable { page: String, placeholder: String },

    #[error("{message}: {}", path.display())]
    DirectoryError {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CompileError {
    pub(crate) fn directory<P: Into<PathBuf>>(message: &str, path: P, source: std::io::Error) -> Self {
        CompileError::DirectoryError {
            message: message.to_string(),
            path: path.into(),
            source: Some(source),
        }
    }
}

pub type Result<T, E = CompileError> = std::result::Result<T, E>;
