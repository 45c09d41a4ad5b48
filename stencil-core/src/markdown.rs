use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Turns raw markdown into HTML. Page content, previews and line excerpts all
/// go through this before they are stored on a page record.
pub trait MarkdownConverter {
    fn to_html(&self, markdown: &str) -> String;
}

impl<F> MarkdownConverter for F
where
    F: Fn(&str) -> String,
{
    fn to_html(&self, markdown: &str) -> String {
        self(markdown)
    }
}

/// CommonMark converter with syntect highlighting for fenced code blocks.
#[derive(Debug, Clone)]
pub struct Cmark {
    theme: String,
}

impl Default for Cmark {
    fn default() -> Self {
        Self::new(FALLBACK_THEME)
    }
}

impl Cmark {
    pub fn new<S: Into<String>>(theme: S) -> Self {
        let theme = theme.into();
        if !THEME_SET.themes.contains_key(&theme) {
            log::warn!("Unknown syntax theme {theme}, using {FALLBACK_THEME}");
            return Self {
                theme: FALLBACK_THEME.to_string(),
            };
        }

        Self { theme }
    }

    fn highlight(&self, lang: &str, code: &str) -> String {
        let syntax = SYNTAX_SET.find_syntax_by_token(lang).or_else(|| {
            // Fallback mappings for unsupported languages
            match lang {
                "nix" => SYNTAX_SET.find_syntax_by_name("JavaScript"),
                "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
                _ => None,
            }
        });

        let plain = || format!("<pre><code>{}</code></pre>", html_escape::encode_text(code));
        match syntax {
            Some(syntax) => {
                let theme = &THEME_SET.themes[&self.theme];
                highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)
                    .unwrap_or_else(|_| plain())
            }
            None => plain(),
        }
    }
}

impl MarkdownConverter for Cmark {
    fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let events: Vec<Event> = Parser::new_ext(markdown, options).collect();
        let mut processed = Vec::with_capacity(events.len());
        let mut i = 0;

        while i < events.len() {
            match &events[i] {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) if !lang.is_empty() => {
                    let mut code = String::new();
                    i += 1;

                    while i < events.len() {
                        match &events[i] {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => code.push_str(text),
                            _ => {}
                        }
                        i += 1;
                    }

                    processed.push(Event::Html(self.highlight(lang, &code).into()));
                }
                event => processed.push(event.clone()),
            }
            i += 1;
        }

        let mut out = String::new();
        html::push_html(&mut out, processed.into_iter());
        out
    }
}
