//! Single-pass scanner for the three placeholder families used in templates.
//!
//! | Syntax           | Meaning                              |
//! |------------------|--------------------------------------|
//! | `${name}`        | template include                     |
//! | `@{name}`        | page or global variable              |
//! | `#{post-*}`      | post field                           |
//! | `#{list:g:n}`    | start of a list block                |
//! | `#{list:end}`    | end of a list block                  |
//!
//! A placeholder is a sigil, an opening brace, a body without line breaks and
//! the first closing brace on the same line. After a placeholder the scanner
//! resumes right behind its opening brace, so `@{a @{b}}` yields both
//! `@{a @{b}` and `@{b}`.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// `$`
    Include,
    /// `@`
    Variable,
    /// `#`
    Post,
}

impl Sigil {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'$' => Some(Sigil::Include),
            b'@' => Some(Sigil::Variable),
            b'#' => Some(Sigil::Post),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub sigil: Sigil,
    /// Text between the braces.
    pub body: &'a str,
    /// The whole placeholder, sigil and braces included.
    pub raw: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Opening macro of a list block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStart<'a> {
    pub group: &'a str,
    pub count: usize,
}

impl<'a> Placeholder<'a> {
    /// The body if it is a plain `[A-Za-z-]+` name.
    pub fn identifier(&self) -> Option<&'a str> {
        is_identifier(self.body).then_some(self.body)
    }

    pub fn list_start(&self) -> Option<ListStart<'a>> {
        if self.sigil != Sigil::Post {
            return None;
        }
        let (group, count) = self.body.strip_prefix("list:")?.split_once(':')?;
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(ListStart {
            group,
            count: count.parse().ok()?,
        })
    }

    pub fn is_list_end(&self) -> bool {
        self.sigil == Sigil::Post && self.body == "list:end"
    }
}

pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-')
}

/// Iterator over every placeholder in a piece of text, in order of appearance.
pub struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

pub fn scan(text: &str) -> Placeholders<'_> {
    Placeholders { text, pos: 0 }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();

        while let Some(offset) = self.text[self.pos..].find(['$', '@', '#']) {
            let start = self.pos + offset;
            self.pos = start + 1;

            let Some(sigil) = Sigil::from_byte(bytes[start]) else {
                continue;
            };
            if bytes.get(start + 1) != Some(&b'{') {
                continue;
            }
            self.pos = start + 2;

            let rest = &self.text[start + 2..];
            match rest.find(['}', '\n']) {
                Some(close) if rest.as_bytes()[close] == b'}' => {
                    let end = start + 2 + close + 1;
                    return Some(Placeholder {
                        sigil,
                        body: &rest[..close],
                        raw: &self.text[start..end],
                        start,
                        end,
                    });
                }
                _ => continue,
            }
        }

        None
    }
}

/// Rewrites `text` in one pass. Placeholders the resolver returns a value for
/// are replaced; everything else is copied verbatim. Inserted values are not
/// scanned again.
pub fn substitute<'a, F, V>(text: &'a str, mut resolve: F) -> Cow<'a, str>
where
    F: FnMut(&Placeholder<'a>) -> Option<V>,
    V: AsRef<str>,
{
    let mut out = String::new();
    let mut cursor = 0;
    let mut replaced = false;

    for placeholder in scan(text) {
        // Nested inside something we already replaced.
        if placeholder.start < cursor {
            continue;
        }
        if let Some(value) = resolve(&placeholder) {
            out.push_str(&text[cursor..placeholder.start]);
            out.push_str(value.as_ref());
            cursor = placeholder.end;
            replaced = true;
        }
    }

    if !replaced {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}

/// First placeholder of any family left in the text.
pub fn find_unresolved(text: &str) -> Option<&str> {
    scan(text).next().map(|p| p.raw)
}
