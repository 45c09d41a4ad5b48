use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};
use crate::macros::{self, Sigil};

/// Loads templates from disk and expands `${name}` includes.
///
/// Every template is expanded at most once per store; later lookups are
/// served from memory.
pub struct TemplateStore {
    dir: PathBuf,
    extension: String,
    cache: HashMap<String, String>,
}

impl TemplateStore {
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.to_string(),
            cache: HashMap::new(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{}", self.extension))
    }

    /// Returns the fully expanded text of template `name`.
    pub fn resolve(&mut self, name: &str) -> Result<String> {
        let mut visiting = Vec::new();
        self.resolve_inner(name, &mut visiting)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    fn resolve_inner(&mut self, name: &str, visiting: &mut Vec<String>) -> Result<String> {
        if let Some(content) = self.cache.get(name) {
            log::debug!("Fetching cached template {name}");
            return Ok(content.clone());
        }

        if visiting.iter().any(|v| v == name) {
            let mut chain = visiting.clone();
            chain.push(name.to_string());
            return Err(CompileError::CyclicInclude {
                chain: chain.join(" -> "),
            });
        }

        log::info!("Loading template {name}");
        let path = self.path_for(name);
        let raw = std::fs::read_to_string(&path).map_err(|source| CompileError::TemplateNotFound {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;

        let mut includes: Vec<&str> = Vec::new();
        for placeholder in macros::scan(&raw) {
            if placeholder.sigil != Sigil::Include {
                continue;
            }
            if let Some(include) = placeholder.identifier() {
                if !includes.contains(&include) {
                    includes.push(include);
                }
            }
        }

        visiting.push(name.to_string());
        let mut expanded = HashMap::with_capacity(includes.len());
        for include in includes {
            let text = self.resolve_inner(include, visiting)?;
            expanded.insert(include, text);
        }
        visiting.pop();

        let content = macros::substitute(&raw, |p| {
            if p.sigil != Sigil::Include {
                return None;
            }
            p.identifier().and_then(|include| expanded.get(include))
        })
        .into_owned();

        self.cache.insert(name.to_string(), content.clone());
        Ok(content)
    }
}
