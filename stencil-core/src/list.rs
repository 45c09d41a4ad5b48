//! `#{list:<group>:<n>} ... #{list:end}` blocks.
//!
//! The body between the two macros is repeated once for each of the `n` most
//! recent pages of `<group>` (by descending `date`), with that page's post
//! fields filled in.

use std::ops::Range;

use crate::error::{CompileError, Result};
use crate::macros::{self, ListStart};
use crate::pages::{PageRecord, PageSet};
use crate::render::apply_post_vars;

/// Appended after every repetition of a block body.
pub const BLOCK_SEPARATOR: &str = "\n<!-- expanded block div -->\n";

/// The `(group, page)` expansions whose page text brought a list block into
/// existence, outermost first. Blocks written in the template have none.
type Lineage = Vec<(String, String)>;

struct Block<'a> {
    list: ListStart<'a>,
    open: Range<usize>,
    close: Range<usize>,
}

fn find_block(text: &str) -> Result<Option<Block<'_>>> {
    let Some((list, open)) = macros::scan(text)
        .find_map(|p| p.list_start().map(|list| (list, p.start..p.end)))
    else {
        return Ok(None);
    };

    let close = macros::scan(text)
        .find(|p| p.is_list_end())
        .map(|p| p.start..p.end)
        .ok_or_else(|| CompileError::MissingEndBlock {
            group: list.group.to_string(),
        })?;

    if close.start < open.end {
        return Err(CompileError::BlockOrderError {
            group: list.group.to_string(),
        });
    }

    Ok(Some(Block { list, open, close }))
}

fn count_starts(text: &str) -> usize {
    macros::scan(text).filter(|p| p.list_start().is_some()).count()
}

/// The `count` most recent pages of `group`, with their names. Pages sharing
/// a date keep page-name order.
pub fn select_pages<'p>(
    pages: &'p PageSet,
    group: &str,
    count: usize,
) -> Vec<(&'p str, &'p PageRecord)> {
    let mut selected: Vec<(&str, &PageRecord)> = pages
        .iter()
        .filter(|(_, p)| p.group == group)
        .map(|(name, p)| (name.as_str(), p))
        .collect();
    selected.sort_by(|(_, a), (_, b)| b.date.cmp(&a.date));
    selected.truncate(count);
    selected
}

/// Replaces `block` (the first one in `text`) with its repetitions.
///
/// `lineages` holds one entry per list start in `text`, in order, and is
/// rewritten to match the returned text. A repetition whose page text adds
/// list starts gives them the block's lineage plus that page; meeting the
/// same page again further down that lineage is a cycle.
fn expand_block(
    text: &str,
    block: &Block<'_>,
    pages: &PageSet,
    lineages: &mut Vec<Lineage>,
) -> Result<String> {
    let body = &text[block.open.end..block.close.start];
    let group = block.list.group;
    let selected = select_pages(pages, group, block.list.count);
    log::debug!(
        "Expanding list block {} with {} of {} requested pages",
        group,
        selected.len(),
        block.list.count
    );

    let lineage = lineages.first().cloned().unwrap_or_default();
    let body_starts = count_starts(body);
    let inherited: Vec<Lineage> = lineages.iter().skip(1).take(body_starts).cloned().collect();
    let rest: Vec<Lineage> = lineages.iter().skip(1 + body_starts).cloned().collect();

    let mut next = Vec::with_capacity(lineages.len());
    let mut out = String::with_capacity(text.len() + body.len() * selected.len());
    out.push_str(&text[..block.open.start]);
    for (name, record) in selected {
        let repeated = apply_post_vars(body, record);
        let starts = count_starts(&repeated);
        if starts > body_starts {
            if lineage.iter().any(|(g, n)| g == group && n == name) {
                return Err(CompileError::CyclicList {
                    group: group.to_string(),
                });
            }
            let mut grown = lineage.clone();
            grown.push((group.to_string(), name.to_string()));
            next.extend(std::iter::repeat_n(grown, starts));
        } else {
            next.extend(inherited.iter().take(starts).cloned());
        }
        out.push_str(&repeated);
        out.push_str(BLOCK_SEPARATOR);
    }
    out.push_str(&text[block.close.end..]);

    next.extend(rest);
    *lineages = next;
    Ok(out)
}

/// Expands list blocks one at a time, rescanning the whole text after each,
/// until none are left.
///
/// Each expansion uses up one `#{list:end}`, and new ones only arrive with
/// page text, so the loop ends unless a page keeps listing itself. That case
/// fails with [`CompileError::CyclicList`].
pub fn expand_lists(text: &str, pages: &PageSet) -> Result<String> {
    let mut text = text.to_string();
    let mut lineages: Vec<Lineage> = vec![Vec::new(); count_starts(&text)];

    loop {
        let Some(block) = find_block(&text)? else {
            return Ok(text);
        };

        let next = expand_block(&text, &block, pages, &mut lineages)?;
        text = next;
    }
}
