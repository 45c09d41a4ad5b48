use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::config::SourceLayout;
use crate::error::{CompileError, Result};
use crate::markdown::MarkdownConverter;

/// One page to render, as described by a `[name]` section of `pages.spec`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRecord {
    pub template: String,
    pub url: String,
    pub group: String,
    pub date: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub preview: String,
    pub line: String,
    /// Parsed and kept, but list blocks do not look at it.
    pub unlisted: bool,
    pub variables: HashMap<String, String>,
}

impl PageRecord {
    /// `group/url`, or just `url` for pages outside any group.
    pub fn output_path(&self) -> String {
        if self.group.is_empty() {
            self.url.clone()
        } else {
            format!("{}/{}", self.group, self.url)
        }
    }
}

/// All page records of a run, keyed by section name.
pub type PageSet = BTreeMap<String, PageRecord>;

/// Reads the markdown files a `content:` entry points at.
pub struct ContentLoader<'a> {
    content_dir: PathBuf,
    preview_dir: PathBuf,
    line_dir: PathBuf,
    converter: &'a dyn MarkdownConverter,
}

impl<'a> ContentLoader<'a> {
    pub fn new(root: &Path, layout: &SourceLayout, converter: &'a dyn MarkdownConverter) -> Self {
        Self {
            content_dir: root.join(&layout.content),
            preview_dir: root.join(&layout.preview),
            line_dir: root.join(&layout.line),
            converter,
        }
    }

    fn read(&self, path: &Path) -> std::io::Result<String> {
        let markdown = std::fs::read_to_string(path)?;
        Ok(self.converter.to_html(&markdown))
    }

    fn fill(&self, page: &str, record: &mut PageRecord, stem: &str) -> Result<()> {
        let path = self.content_dir.join(stem);
        record.content = self
            .read(&path)
            .map_err(|source| CompileError::ContentNotFound {
                page: page.to_string(),
                path,
                source,
            })?;

        // Pages without a group usually have no preview or line.
        match self.read(&self.preview_dir.join(stem)) {
            Ok(preview) => record.preview = preview,
            Err(_) => log::warn!("Skipping `preview` for {page}"),
        }
        match self.read(&self.line_dir.join(stem)) {
            Ok(line) => record.line = line,
            Err(_) => log::warn!("Skipping `line` for {page}"),
        }

        Ok(())
    }
}

/// Splits a `key: value` line. The separator must occur exactly once.
pub(crate) fn split_entry(line_no: usize, line: &str) -> Result<(&str, &str)> {
    let malformed = || CompileError::MalformedLine {
        line: line_no,
        text: line.to_string(),
    };

    let (key, value) = line.split_once(": ").ok_or_else(malformed)?;
    if value.contains(": ") {
        return Err(malformed());
    }
    Ok((key, value))
}

/// Parses a page spec stream into one record per `[name]` section.
pub fn parse_page_specs<R: BufRead>(reader: R, loader: &ContentLoader<'_>) -> Result<PageSet> {
    let mut pages = PageSet::new();
    let mut current: Option<String> = None;
    let mut parsing_variables = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|_| CompileError::MalformedLine {
            line: line_no,
            text: "<unreadable>".to_string(),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[') {
            let name = name.strip_suffix(']').ok_or_else(|| CompileError::MalformedLine {
                line: line_no,
                text: line.to_string(),
            })?;
            log::debug!("Parsing spec for {name}");
            if pages.insert(name.to_string(), PageRecord::default()).is_some() {
                log::warn!("Page {name} is defined twice, keeping the last definition");
            }
            current = Some(name.to_string());
            parsing_variables = false;
            continue;
        }
        if line == "variables:" {
            parsing_variables = true;
            continue;
        }

        let (key, value) = split_entry(line_no, line)?;
        let Some(page) = current.as_deref() else {
            return Err(CompileError::MalformedLine {
                line: line_no,
                text: line.to_string(),
            });
        };
        let Some(record) = pages.get_mut(page) else {
            continue;
        };

        if parsing_variables {
            record.variables.insert(key.to_string(), value.to_string());
            continue;
        }

        match key {
            "template" => record.template = value.to_string(),
            "url" => record.url = value.to_string(),
            "title" => record.title = value.to_string(),
            "date" => record.date = value.to_string(),
            "author" => record.author = value.to_string(),
            "group" => record.group = value.to_string(),
            "unlisted" => record.unlisted = true,
            "content" => loader.fill(page, record, value)?,
            _ => {
                return Err(CompileError::UnknownField {
                    page: page.to_string(),
                    field: key.to_string(),
                });
            }
        }
    }

    Ok(pages)
}
