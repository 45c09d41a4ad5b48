pub mod compiler;
pub mod config;
pub mod error;
pub mod globals;
pub mod list;
pub mod macros;
pub mod markdown;
pub mod pages;
pub mod render;
pub mod template;

// Re-export main types
pub use compiler::{BuildSummary, Compiler, CompilerBuilder, compile_source};
pub use error::{CompileError, Result};
pub use markdown::{Cmark, MarkdownConverter};
pub use pages::{PageRecord, PageSet};
pub use render::RenderedPage;
pub use template::TemplateStore;
