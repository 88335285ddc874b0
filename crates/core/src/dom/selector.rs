/// CSS selector matching engine.
/// Supports: tag, .class, #id, attribute selectors with operators,
/// combinators (descendant, child, adjacent, general sibling),
/// comma-separated groups and structural/form pseudo-classes.
use super::{Document, NodeId};
use crate::error::{Error, Result};

/// A comma-separated list of selectors; matches when any member matches.
#[derive(Debug, Clone)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

/// A single selector (one part of a comma-separated list).
#[derive(Debug, Clone)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
}

/// A component of a selector chain.
#[derive(Debug, Clone)]
pub enum SelectorPart {
    /// Matches a tag name: `div`, `button`, etc.
    Tag(String),
    /// Matches a class: `.foo`
    Class(String),
    /// Matches an ID: `#bar`
    Id(String),
    /// Matches an attribute: `[type="submit"]`, `[href^="http"]`
    Attribute(String, Option<(AttrOp, String)>),
    /// Descendant combinator (space)
    Descendant,
    /// Child combinator (>)
    Child,
    /// Adjacent sibling combinator (+)
    Adjacent,
    /// General sibling combinator (~)
    Sibling,
    /// Universal selector (*)
    Universal,
    PseudoClass(Pseudo),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone)]
pub enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(i32, i32),
    Checked,
    Selected,
    Disabled,
    Enabled,
    Not(SelectorList),
}

impl SelectorList {
    /// Parse a selector group such as `form input[name='q'], textarea`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidArgument(
                "The CSS selector can't be empty.".to_string(),
            ));
        }

        let mut selectors = Vec::new();
        for part in split_top_level(input) {
            match parse_selector(part.trim()) {
                Ok(Some(selector)) => selectors.push(selector),
                Ok(None) => {
                    return Err(Error::InvalidArgument(format!(
                        "The CSS selector '{input}' contains an empty group."
                    )))
                }
                Err(reason) => {
                    return Err(Error::InvalidArgument(format!(
                        "The CSS selector '{input}' is invalid: {reason}."
                    )))
                }
            }
        }
        Ok(Self { selectors })
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.selectors.iter().any(|s| matches_element(s, doc, id))
    }
}

/// Split on commas that are not nested in brackets, parentheses or quotes.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Parse a single selector string into a Selector.
fn parse_selector(input: &str) -> std::result::Result<Option<Selector>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '.' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                let class_name = read_ident(&mut chars);
                if class_name.is_empty() {
                    return Err("expected a class name after '.'".to_string());
                }
                parts.push(SelectorPart::Class(class_name));
            }
            '#' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                let id_name = read_ident(&mut chars);
                if id_name.is_empty() {
                    return Err("expected an id after '#'".to_string());
                }
                parts.push(SelectorPart::Id(id_name));
            }
            '[' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                parts.push(parse_attribute(&mut chars)?);
            }
            ':' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                let pseudo = read_ident(&mut chars);
                let mut args = None;
                if chars.peek() == Some(&'(') {
                    chars.next();
                    let mut depth = 1;
                    let mut inner = String::new();
                    while let Some(c) = chars.next() {
                        if c == '(' {
                            depth += 1;
                        } else if c == ')' {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        inner.push(c);
                    }
                    args = Some(inner);
                }
                parts.push(SelectorPart::PseudoClass(parse_pseudo(&pseudo, args)?));
            }
            '>' | '+' | '~' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                skip_whitespace(&mut chars);
                parts.push(match ch {
                    '>' => SelectorPart::Child,
                    '+' => SelectorPart::Adjacent,
                    _ => SelectorPart::Sibling,
                });
            }
            ' ' | '\t' | '\n' | '\r' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                skip_whitespace(&mut chars);
                // Check if next char is a combinator
                if let Some(&next) = chars.peek() {
                    if next != '>' && next != '+' && next != '~' {
                        parts.push(SelectorPart::Descendant);
                    }
                }
            }
            '*' => {
                flush_tag(&mut current, &mut parts);
                chars.next();
                parts.push(SelectorPart::Universal);
            }
            _ => {
                if !(ch.is_alphanumeric() || ch == '-' || ch == '_') {
                    return Err(format!("unexpected character '{ch}'"));
                }
                current.push(ch);
                chars.next();
            }
        }
    }

    flush_tag(&mut current, &mut parts);

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Selector { parts }))
    }
}

fn parse_attribute(
    chars: &mut std::iter::Peekable<std::str::Chars>,
) -> std::result::Result<SelectorPart, String> {
    let mut attr = String::new();
    let mut value = None;
    let mut closed = false;
    // Read until ]
    while let Some(&c) = chars.peek() {
        if c == ']' {
            chars.next();
            closed = true;
            break;
        }
        if c == '=' {
            chars.next();
            let op = match attr.chars().last() {
                Some('~') => Some(AttrOp::Includes),
                Some('|') => Some(AttrOp::DashMatch),
                Some('^') => Some(AttrOp::Prefix),
                Some('$') => Some(AttrOp::Suffix),
                Some('*') => Some(AttrOp::Substring),
                _ => None,
            };
            if op.is_some() {
                attr.pop();
            }
            skip_whitespace(chars);
            let mut val = String::new();
            // Skip optional quotes
            let quote = chars.peek().copied().filter(|q| *q == '"' || *q == '\'');
            if let Some(q) = quote {
                chars.next();
                while let Some(vc) = chars.next() {
                    if vc == q {
                        break;
                    }
                    val.push(vc);
                }
            } else {
                while let Some(&vc) = chars.peek() {
                    if vc == ']' {
                        break;
                    }
                    val.push(vc);
                    chars.next();
                }
                val = val.trim().to_string();
            }
            value = Some((op.unwrap_or(AttrOp::Equals), val));
            skip_whitespace(chars);
        } else {
            attr.push(c);
            chars.next();
        }
    }

    let attr = attr.trim().to_lowercase();
    if !closed || attr.is_empty() {
        return Err("unterminated attribute selector".to_string());
    }
    Ok(SelectorPart::Attribute(attr, value))
}

fn parse_pseudo(name: &str, args: Option<String>) -> std::result::Result<Pseudo, String> {
    let pseudo = match (name.to_lowercase().as_str(), args) {
        ("first-child", None) => Pseudo::FirstChild,
        ("last-child", None) => Pseudo::LastChild,
        ("only-child", None) => Pseudo::OnlyChild,
        ("checked", None) => Pseudo::Checked,
        ("selected", None) => Pseudo::Selected,
        ("disabled", None) => Pseudo::Disabled,
        ("enabled", None) => Pseudo::Enabled,
        ("nth-child", Some(expr)) => {
            let (a, b) = parse_nth(&expr).ok_or_else(|| format!("invalid :nth-child({expr})"))?;
            Pseudo::NthChild(a, b)
        }
        ("not", Some(inner)) => {
            Pseudo::Not(SelectorList::parse(&inner).map_err(|e| e.to_string())?)
        }
        (other, _) => return Err(format!("unsupported pseudo-class ':{other}'")),
    };
    Ok(pseudo)
}

/// Parse an `an+b` expression.
fn parse_nth(expr: &str) -> Option<(i32, i32)> {
    let expr: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    match expr.to_lowercase().as_str() {
        "odd" => return Some((2, 1)),
        "even" => return Some((2, 0)),
        _ => {}
    }
    match expr.find('n') {
        Some(pos) => {
            let a = match &expr[..pos] {
                "" | "+" => 1,
                "-" => -1,
                a => a.parse().ok()?,
            };
            let b = match &expr[pos + 1..] {
                "" => 0,
                b => b.trim_start_matches('+').parse().ok()?,
            };
            Some((a, b))
        }
        None => Some((0, expr.parse().ok()?)),
    }
}

fn flush_tag(current: &mut String, parts: &mut Vec<SelectorPart>) {
    let tag = current.trim().to_string();
    if !tag.is_empty() {
        parts.push(SelectorPart::Tag(tag.to_lowercase()));
        current.clear();
    }
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars>) {
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
}

/// Check if a selector matches an element.
pub fn matches_element(selector: &Selector, doc: &Document, id: NodeId) -> bool {
    // Split into compound segments; each carries the combinator that follows it
    let mut segments: Vec<(Vec<&SelectorPart>, Option<&SelectorPart>)> = Vec::new();
    let mut current_segment: Vec<&SelectorPart> = Vec::new();

    for part in &selector.parts {
        match part {
            SelectorPart::Descendant
            | SelectorPart::Child
            | SelectorPart::Adjacent
            | SelectorPart::Sibling => {
                if !current_segment.is_empty() {
                    segments.push((current_segment, Some(part)));
                    current_segment = Vec::new();
                }
            }
            _ => current_segment.push(part),
        }
    }
    if !current_segment.is_empty() {
        segments.push((current_segment, None));
    }

    if segments.is_empty() {
        return false;
    }

    matches_from(&segments, segments.len() - 1, doc, id)
}

/// Match segment `idx` against `id`, then walk right to left through the rest.
fn matches_from(
    segments: &[(Vec<&SelectorPart>, Option<&SelectorPart>)],
    idx: usize,
    doc: &Document,
    id: NodeId,
) -> bool {
    if !segment_matches(&segments[idx].0, doc, id) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match segments[idx - 1].1 {
        Some(SelectorPart::Child) => doc
            .parent(id)
            .is_some_and(|parent| matches_from(segments, idx - 1, doc, parent)),
        Some(SelectorPart::Adjacent) => doc
            .previous_sibling(id)
            .is_some_and(|sibling| matches_from(segments, idx - 1, doc, sibling)),
        Some(SelectorPart::Sibling) => {
            let mut sibling = doc.previous_sibling(id);
            while let Some(s) = sibling {
                if matches_from(segments, idx - 1, doc, s) {
                    return true;
                }
                sibling = doc.previous_sibling(s);
            }
            false
        }
        _ => {
            let mut ancestor = doc.parent(id);
            while let Some(a) = ancestor {
                if matches_from(segments, idx - 1, doc, a) {
                    return true;
                }
                ancestor = doc.parent(a);
            }
            false
        }
    }
}

fn segment_matches(segment: &[&SelectorPart], doc: &Document, id: NodeId) -> bool {
    let Some(node) = doc.node(id) else {
        return false;
    };
    if !node.is_element() {
        return false;
    }

    for part in segment {
        match part {
            SelectorPart::Tag(t) => {
                if !t.eq_ignore_ascii_case(&node.tag) {
                    return false;
                }
            }
            SelectorPart::Class(c) => {
                let classes = node.get_attr("class").unwrap_or("");
                if !classes.split_whitespace().any(|cl| cl == c) {
                    return false;
                }
            }
            SelectorPart::Id(i) => {
                if node.get_attr("id") != Some(i.as_str()) {
                    return false;
                }
            }
            SelectorPart::Attribute(name, expected) => {
                let Some(actual) = node.get_attr(name) else {
                    return false;
                };
                if let Some((op, val)) = expected {
                    let ok = match op {
                        AttrOp::Equals => actual == val,
                        AttrOp::Includes => actual.split_whitespace().any(|w| w == val),
                        AttrOp::DashMatch => {
                            actual == val || actual.starts_with(&format!("{val}-"))
                        }
                        AttrOp::Prefix => !val.is_empty() && actual.starts_with(val.as_str()),
                        AttrOp::Suffix => !val.is_empty() && actual.ends_with(val.as_str()),
                        AttrOp::Substring => !val.is_empty() && actual.contains(val.as_str()),
                    };
                    if !ok {
                        return false;
                    }
                }
            }
            SelectorPart::PseudoClass(pseudo) => {
                if !pseudo_matches(pseudo, doc, id) {
                    return false;
                }
            }
            SelectorPart::Universal => {} // matches everything
            SelectorPart::Descendant
            | SelectorPart::Child
            | SelectorPart::Adjacent
            | SelectorPart::Sibling => {} // handled elsewhere
        }
    }
    true
}

fn pseudo_matches(pseudo: &Pseudo, doc: &Document, id: NodeId) -> bool {
    match pseudo {
        Pseudo::FirstChild => doc.previous_sibling(id).is_none(),
        Pseudo::LastChild => doc.next_sibling(id).is_none(),
        Pseudo::OnlyChild => doc.previous_sibling(id).is_none() && doc.next_sibling(id).is_none(),
        Pseudo::NthChild(a, b) => {
            let mut position = 1;
            let mut sibling = doc.previous_sibling(id);
            while let Some(s) = sibling {
                position += 1;
                sibling = doc.previous_sibling(s);
            }
            let offset = position - b;
            if *a == 0 {
                offset == 0
            } else {
                offset % a == 0 && offset / a >= 0
            }
        }
        Pseudo::Checked => doc.has_attr(id, "checked") || doc.has_attr(id, "selected"),
        Pseudo::Selected => doc.has_attr(id, "selected"),
        Pseudo::Disabled => doc.has_attr(id, "disabled"),
        Pseudo::Enabled => !doc.has_attr(id, "disabled"),
        Pseudo::Not(list) => !list.matches(doc, id),
    }
}
