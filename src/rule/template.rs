//! Text templates over capture names.
//!
//! `@name` is replaced by the verbatim source text of the node captured as
//! `name`; `@@` is a literal `@`. Names are ASCII identifiers.

use crate::error::{FixrevError, Result};
use crate::pattern::Bindings;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Capture(String),
}

/// A parsed edit or message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |message: &str| FixrevError::InvalidTemplate {
            template: template.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c != '@' {
                text.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some((_, '@')) => {
                    chars.next();
                    text.push('@');
                }
                Some((start, next)) if next.is_ascii_alphabetic() || next == '_' => {
                    let mut end = start;
                    while let Some(&(i, c)) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            end = i + c.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Capture(template[start..end].to_string()));
                }
                Some(_) => return Err(invalid("'@' must be followed by a capture name or '@'")),
                None => return Err(invalid("template ends with a dangling '@'")),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Capture names referenced by the template, in order of appearance.
    pub fn captures(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Substitutes each capture with its node's source text.
    pub fn render(&self, bindings: &Bindings<'_>) -> Result<String> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Capture(name) => {
                    let text = bindings
                        .text(name)
                        .ok_or_else(|| FixrevError::MissingCapture(name.clone()))?;
                    output.push_str(text);
                }
            }
        }
        Ok(output)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Template {
    type Err = FixrevError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
