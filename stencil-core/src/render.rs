use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{CompileError, Result};
use crate::globals::Globals;
use crate::list::expand_lists;
use crate::macros::{self, Sigil};
use crate::pages::{PageRecord, PageSet};
use crate::template::TemplateStore;

/// Number of fixed `#{post-*}` fields a record exposes.
const POST_FIELD_COUNT: usize = 7;

/// A page ready to be written, `path` being relative to the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub path: String,
    pub content: String,
}

/// Replaces `@{name}` for every name in `vars`. Unknown names stay as they are.
pub fn apply_vars<'a>(text: &'a str, vars: &HashMap<String, String>) -> Cow<'a, str> {
    macros::substitute(text, |p| match p.sigil {
        Sigil::Variable => vars.get(p.body),
        _ => None,
    })
}

fn post_field<'r>(record: &'r PageRecord, field: &str) -> Option<Cow<'r, str>> {
    let value = match field {
        "post-title" => &record.title,
        "post-author" => &record.author,
        "post-date" => &record.date,
        "post-url" => return Some(Cow::Owned(record.output_path())),
        "post-content" => &record.content,
        "post-preview" => &record.preview,
        "post-line" => &record.line,
        _ => return None,
    };
    Some(Cow::Borrowed(value.as_str()))
}

/// One round of page variables followed by the fixed `#{post-*}` fields.
pub fn apply_post_vars(text: &str, record: &PageRecord) -> String {
    let text = apply_vars(text, &record.variables);
    macros::substitute(&text, |p| match p.sigil {
        Sigil::Post => post_field(record, p.body),
        _ => None,
    })
    .into_owned()
}

fn has_post_placeholder(text: &str) -> bool {
    macros::scan(text).any(|p| p.sigil == Sigil::Post && p.identifier().is_some())
}

/// Applies post fields until none are left, so that a field whose value
/// carries more post placeholders (say `#{post-date}` inside the content)
/// still gets resolved.
///
/// Stops early when a pass changes nothing; whatever is left over is then
/// reported by [`check_unresolved`]. Every changing pass of an acyclic chain
/// uses up at least one field or page variable, so needing more passes than
/// the record has of those means some value refers back to itself.
pub fn resolve_post_fields(text: String, record: &PageRecord, page: &str) -> Result<String> {
    let max_passes = POST_FIELD_COUNT + record.variables.len() + 1;
    let mut text = text;
    let mut passes = 0;

    while has_post_placeholder(&text) {
        if passes == max_passes {
            return Err(CompileError::PostFieldCycle {
                page: page.to_string(),
            });
        }

        let next = apply_post_vars(&text, record);
        if next == text {
            break;
        }
        text = next;
        passes += 1;
    }

    Ok(text)
}

pub fn check_unresolved(text: &str, page: &str) -> Result<()> {
    match macros::find_unresolved(text) {
        Some(placeholder) => Err(CompileError::UnresolvedVariable {
            page: page.to_string(),
            placeholder: placeholder.to_string(),
        }),
        None => Ok(()),
    }
}

/// Runs the whole pipeline for one page: template, page variables, list
/// blocks, post fields, globals, then a final check for leftovers.
pub fn render_page(
    name: &str,
    record: &PageRecord,
    templates: &mut TemplateStore,
    pages: &PageSet,
    globals: &Globals,
) -> Result<RenderedPage> {
    let template = templates.resolve(&record.template)?;
    let content = apply_vars(&template, &record.variables);
    let content = expand_lists(&content, pages)?;
    let content = resolve_post_fields(content, record, name)?;
    let content = apply_vars(&content, globals).into_owned();

    check_unresolved(&content, name)?;

    Ok(RenderedPage {
        path: record.output_path(),
        content,
    })
}
