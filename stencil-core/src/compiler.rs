use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{Config, SourceLayout};
use crate::error::{CompileError, Result};
use crate::globals::{Globals, parse_globals};
use crate::markdown::{Cmark, MarkdownConverter};
use crate::pages::{ContentLoader, PageSet, parse_page_specs};
use crate::render::{self, RenderedPage};
use crate::template::TemplateStore;

/// What a finished compilation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub static_files: usize,
}

pub struct CompilerBuilder {
    source_dir: PathBuf,
    output_dir: PathBuf,
    production: bool,
    layout: Option<SourceLayout>,
    markdown: Option<Box<dyn MarkdownConverter>>,
}

impl CompilerBuilder {
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            output_dir: PathBuf::from("./out"),
            production: false,
            layout: None,
            markdown: None,
        }
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    /// Production builds apply `prod:` overrides from the globals file.
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Skip reading `stencil.toml` and use this layout instead.
    pub fn layout(mut self, layout: SourceLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn markdown<M: MarkdownConverter + 'static>(mut self, converter: M) -> Self {
        self.markdown = Some(Box::new(converter));
        self
    }

    pub fn build(self) -> Result<Compiler> {
        if !self.source_dir.is_dir() {
            return Err(CompileError::DirectoryError {
                message: "source is not a directory".to_string(),
                path: self.source_dir,
                source: None,
            });
        }

        let layout = match self.layout {
            Some(layout) => layout,
            None => Config::for_source(&self.source_dir)?.layout,
        };
        let markdown: Box<dyn MarkdownConverter> = match self.markdown {
            Some(markdown) => markdown,
            None => Box::new(Cmark::new(layout.syntax_theme.as_str())),
        };
        let templates = TemplateStore::new(
            layout.templates_dir(&self.source_dir),
            &layout.template_extension,
        );

        Ok(Compiler {
            output_dir: self.output_dir,
            templates,
            sources: Sources {
                root: self.source_dir,
                layout,
                production: self.production,
                markdown,
                pages: None,
                globals: None,
            },
        })
    }
}

/// Spec files of one run, read on first use and kept for the rest of it.
struct Sources {
    root: PathBuf,
    layout: SourceLayout,
    production: bool,
    markdown: Box<dyn MarkdownConverter>,
    pages: Option<PageSet>,
    globals: Option<Globals>,
}

impl Sources {
    fn open(&self, path: PathBuf) -> Result<BufReader<File>> {
        match File::open(&path) {
            Ok(file) => Ok(BufReader::new(file)),
            Err(source) => Err(CompileError::SpecNotFound { path, source }),
        }
    }

    fn read_pages(&self) -> Result<PageSet> {
        let path = self.layout.pages_file(&self.root);
        log::info!("Loading page specs from {}", path.display());
        let reader = self.open(path)?;
        let loader = ContentLoader::new(&self.root, &self.layout, &*self.markdown);
        parse_page_specs(reader, &loader)
    }

    fn read_globals(&self) -> Result<Globals> {
        let path = self.layout.globals_file(&self.root);
        log::info!("Loading global variables from {}", path.display());
        parse_globals(self.open(path)?, self.production)
    }

    fn pages(&mut self) -> Result<&PageSet> {
        let pages = match self.pages.take() {
            Some(pages) => pages,
            None => self.read_pages()?,
        };
        Ok(self.pages.insert(pages))
    }

    fn globals(&mut self) -> Result<&Globals> {
        let globals = match self.globals.take() {
            Some(globals) => globals,
            None => self.read_globals()?,
        };
        Ok(self.globals.insert(globals))
    }

    fn load(&mut self) -> Result<(&PageSet, &Globals)> {
        let pages = match self.pages.take() {
            Some(pages) => pages,
            None => self.read_pages()?,
        };
        let globals = match self.globals.take() {
            Some(globals) => globals,
            None => match self.read_globals() {
                Ok(globals) => globals,
                Err(e) => {
                    // keep the parsed pages for the next call
                    self.pages = Some(pages);
                    return Err(e);
                }
            },
        };

        let pages: &PageSet = self.pages.insert(pages);
        let globals: &Globals = self.globals.insert(globals);
        Ok((pages, globals))
    }
}

/// One compilation run. Holds the template, page and global caches, so a
/// fresh `Compiler` always starts from a clean slate.
pub struct Compiler {
    output_dir: PathBuf,
    templates: TemplateStore,
    sources: Sources,
}

impl Compiler {
    pub fn builder<P: AsRef<Path>>(source_dir: P) -> CompilerBuilder {
        CompilerBuilder::new(source_dir)
    }

    pub fn source_dir(&self) -> &Path {
        &self.sources.root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_production(&self) -> bool {
        self.sources.production
    }

    /// All page records, parsed from the pages file on first call.
    pub fn pages(&mut self) -> Result<&PageSet> {
        self.sources.pages()
    }

    /// Global variables, parsed from the globals file on first call.
    pub fn globals(&mut self) -> Result<&Globals> {
        self.sources.globals()
    }

    pub fn templates(&mut self) -> &mut TemplateStore {
        &mut self.templates
    }

    /// Renders page `name` without writing anything.
    pub fn render_page(&mut self, name: &str) -> Result<RenderedPage> {
        let (pages, globals) = self.sources.load()?;
        let record = pages
            .get(name)
            .ok_or_else(|| CompileError::PageNotFound(name.to_string()))?;

        render::render_page(name, record, &mut self.templates, pages, globals)
    }

    /// Clears the destination, copies static files and writes every page.
    pub fn compile(&mut self) -> Result<BuildSummary> {
        log::info!("Starting compilation.");

        prepare_destination(&self.sources.root, &self.output_dir)?;
        let static_files = copy_static(
            &self.sources.layout.static_dir(&self.sources.root),
            &self.output_dir,
        )?;

        let names: Vec<String> = self.pages()?.keys().cloned().collect();
        for name in &names {
            log::info!("Loading page {name}");
            let page = self.render_page(name)?;
            write_page(&self.output_dir, &page)?;
        }

        log::info!("Compilation complete.");
        Ok(BuildSummary {
            pages: names.len(),
            static_files,
        })
    }
}

/// Compiles `source_dir` into `output_dir` in one go.
pub fn compile_source<S, D>(source_dir: S, output_dir: D, production: bool) -> Result<BuildSummary>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    Compiler::builder(source_dir)
        .output_dir(output_dir)
        .production(production)
        .build()?
        .compile()
}

fn prepare_destination(source_dir: &Path, output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        let source = source_dir
            .canonicalize()
            .map_err(|e| CompileError::directory("failed to resolve source", source_dir, e))?;
        let output = output_dir
            .canonicalize()
            .map_err(|e| CompileError::directory("failed to resolve destination", output_dir, e))?;
        if source.starts_with(&output) {
            return Err(CompileError::DirectoryError {
                message: "refusing to delete a destination that contains the source".to_string(),
                path: output,
                source: None,
            });
        }

        log::warn!("Deleting all contents of {}", output_dir.display());
        std::fs::remove_dir_all(output_dir)
            .map_err(|e| CompileError::directory("failed to delete destination", output_dir, e))?;
    }

    std::fs::create_dir_all(output_dir)
        .map_err(|e| CompileError::directory("failed to create destination", output_dir, e))
}

fn copy_static(static_dir: &Path, output_dir: &Path) -> Result<usize> {
    if !static_dir.is_dir() {
        log::warn!("No static directory at {}, skipping", static_dir.display());
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(static_dir) {
        let entry = entry.map_err(|e| {
            CompileError::directory("failed to read static files", static_dir, e.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(static_dir) else {
            continue;
        };
        let target = output_dir.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|e| CompileError::directory("failed to create directory", &target, e))?;
        } else {
            log::debug!("Copying {} to {}", entry.path().display(), target.display());
            std::fs::copy(entry.path(), &target)
                .map_err(|e| CompileError::directory("failed to copy static file", entry.path(), e))?;
            copied += 1;
        }
    }

    Ok(copied)
}

fn write_page(output_dir: &Path, page: &RenderedPage) -> Result<()> {
    let output_path = output_dir.join(&page.path);
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CompileError::directory("failed to create folder for page", parent, e))?;
    }

    std::fs::write(&output_path, &page.content)
        .map_err(|e| CompileError::directory("failed to write page", &output_path, e))
}
