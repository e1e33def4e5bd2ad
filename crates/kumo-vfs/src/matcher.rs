//! Path matchers built from `glob:` and `regex:` syntax strings.
//!
//! Both syntaxes compile to one anchored [`Regex`] tested against the
//! rendered path string. Glob patterns support:
//! - `*` matches within one segment, `**` crosses separators
//! - `?` matches one non-separator character
//! - `[abc]`, `[a-z]`, `[!abc]` / `[^abc]` character classes
//! - `{a,b,c}` alternatives (nestable)
//! - `\x` escapes `x`

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::{VfsError, VfsResult};
use crate::path::{SEPARATOR, VfsPath};

/// Recognized matcher syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Syntax {
    Glob,
    Regex,
}

/// Compiled predicate over path strings.
#[derive(Clone)]
pub struct PathMatcher {
    syntax: Syntax,
    pattern: String,
    regex: Regex,
}

impl PathMatcher {
    /// Compile `"<syntax>:<pattern>"` with the `/` separator.
    pub fn new(syntax_and_pattern: &str) -> VfsResult<Self> {
        Self::with_separator(syntax_and_pattern, SEPARATOR)
    }

    /// Compile `"<syntax>:<pattern>"` for a namespace with the given separator.
    pub fn with_separator(syntax_and_pattern: &str, separator: char) -> VfsResult<Self> {
        let (syntax, pattern) = syntax_and_pattern.split_once(':').ok_or_else(|| {
            VfsError::invalid_argument(format!(
                "matcher must be '<syntax>:<pattern>', got '{syntax_and_pattern}'"
            ))
        })?;
        let syntax = Syntax::from_str(syntax).map_err(|_| {
            VfsError::invalid_argument(format!("unknown matcher syntax '{syntax}'"))
        })?;

        let source = match syntax {
            Syntax::Glob => glob_to_regex(pattern, separator)?,
            Syntax::Regex => pattern.to_string(),
        };
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|e| VfsError::invalid_argument(format!("bad {syntax} pattern: {e}")))?;

        Ok(Self {
            syntax,
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// The pattern text without its syntax prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True if the whole rendered path matches.
    pub fn matches(&self, path: &VfsPath) -> bool {
        self.is_match(path.as_str())
    }

    /// True if the whole string matches.
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathMatcher({}:{})", self.syntax, self.pattern)
    }
}

/// Translate a glob into regex source (unanchored).
fn glob_to_regex(glob: &str, separator: char) -> VfsResult<String> {
    let sep = regex::escape(&separator.to_string());
    let mut out = String::with_capacity(glob.len() * 2);
    let mut chars = glob.chars().peekable();
    let mut brace_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str(&format!("[^{sep}]*"));
                }
            }
            '?' => out.push_str(&format!("[^{sep}]")),
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('!') | Some('^')) {
                    chars.next();
                    out.push('^');
                }
                let mut closed = false;
                let mut first = true;
                while let Some(cc) = chars.next() {
                    match cc {
                        // A leading ']' is a literal member.
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let escaped = chars.next().ok_or_else(|| {
                                VfsError::invalid_argument(format!("dangling escape in '{glob}'"))
                            })?;
                            out.push_str(&regex::escape(&escaped.to_string()));
                        }
                        '[' | ']' | '&' | '~' => {
                            out.push('\\');
                            out.push(cc);
                        }
                        _ => out.push(cc),
                    }
                    first = false;
                }
                if !closed {
                    return Err(VfsError::invalid_argument(format!(
                        "unterminated character class in '{glob}'"
                    )));
                }
                out.push(']');
            }
            '{' => {
                brace_depth += 1;
                out.push_str("(?:");
            }
            '}' if brace_depth > 0 => {
                brace_depth -= 1;
                out.push(')');
            }
            ',' if brace_depth > 0 => out.push('|'),
            '\\' => {
                let escaped = chars.next().ok_or_else(|| {
                    VfsError::invalid_argument(format!("dangling escape in '{glob}'"))
                })?;
                out.push_str(&regex::escape(&escaped.to_string()));
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    if brace_depth > 0 {
        return Err(VfsError::invalid_argument(format!("unclosed '{{' in '{glob}'")));
    }
    Ok(out)
}
