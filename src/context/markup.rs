//! Token scanning for the two message forms.
//!
//! Display tokens look like `#<color>[<label>](<uuid>)`; namespace tokens
//! look like `@<identifier>`.

use std::ops::Range;

use regex::Regex;

use crate::foundation::error::{SceneError, SceneResult};

const DISPLAY_TOKEN: &str = r"#([a-zA-Z0-9_]+)\[([^\]]+)\]\(([^)]+)\)";
const NAMESPACE_TOKEN: &str = r"@([A-Za-z_][A-Za-z0-9_]*)";

/// A display token and where it sits in the text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayToken<'a> {
    pub span: Range<usize>,
    pub color: &'a str,
    pub label: &'a str,
    pub uuid: &'a str,
}

/// A namespace token; `name` excludes the `@`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceToken<'a> {
    pub span: Range<usize>,
    pub name: &'a str,
}

fn compile(pattern: &str) -> SceneResult<Regex> {
    Regex::new(pattern).map_err(|e| SceneError::Other(e.into()))
}

pub fn display_tokens(text: &str) -> SceneResult<Vec<DisplayToken<'_>>> {
    let re = compile(DISPLAY_TOKEN)?;
    Ok(re
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(DisplayToken {
                span: whole.range(),
                color: cap.get(1)?.as_str(),
                label: cap.get(2)?.as_str(),
                uuid: cap.get(3)?.as_str(),
            })
        })
        .collect())
}

/// Namespace tokens not glued to a preceding identifier character (so `a@b.c` is skipped).
pub fn namespace_tokens(text: &str) -> SceneResult<Vec<NamespaceToken<'_>>> {
    let re = compile(NAMESPACE_TOKEN)?;
    Ok(re
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let glued = text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
            if glued {
                return None;
            }
            Some(NamespaceToken {
                span: whole.range(),
                name: cap.get(1)?.as_str(),
            })
        })
        .collect())
}

/// Replace non-overlapping spans in `text`; `edits` must be in ascending order.
pub fn splice(text: &str, edits: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        out.push_str(&text[cursor..span.start]);
        out.push_str(replacement);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
