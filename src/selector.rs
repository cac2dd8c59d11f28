use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorPseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    Empty,
    NthChild(NthChildSelector),
    NthLastChild(NthChildSelector),
    Not(Vec<Vec<SelectorPart>>),
    Is(Vec<Vec<SelectorPart>>),
    Where(Vec<Vec<SelectorPart>>),
    Has(Vec<Vec<SelectorPart>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NthChildSelector {
    Exact(usize),
    Odd,
    Even,
    AnPlusB(i64, i64),
}

impl NthChildSelector {
    /// `position` is one-based.
    pub(crate) fn matches(self, position: usize) -> bool {
        let position = position as i64;
        match self {
            Self::Exact(n) => position == n as i64,
            Self::Odd => position % 2 == 1,
            Self::Even => position % 2 == 0,
            Self::AnPlusB(a, b) => {
                if a == 0 {
                    return position == b;
                }
                let diff = position - b;
                diff % a == 0 && diff / a >= 0
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
    pub(crate) pseudo_classes: Vec<SelectorPseudoClass>,
}

impl SelectorStep {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && !self.universal
            && self.pseudo_classes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the part on the left.
    pub(crate) combinator: Option<SelectorCombinator>,
}

const SIMPLE_PSEUDO_CLASSES: &[(&str, SelectorPseudoClass)] = &[
    ("first-child", SelectorPseudoClass::FirstChild),
    ("last-child", SelectorPseudoClass::LastChild),
    ("only-child", SelectorPseudoClass::OnlyChild),
    ("first-of-type", SelectorPseudoClass::FirstOfType),
    ("last-of-type", SelectorPseudoClass::LastOfType),
    ("only-of-type", SelectorPseudoClass::OnlyOfType),
    ("empty", SelectorPseudoClass::Empty),
];

fn unsupported(selector: &str) -> Error {
    Error::UnsupportedSelector(selector.into())
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(unsupported(selector));
    }

    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokenize_selector(selector)? {
        let combinator = match token.as_str() {
            ">" => Some(SelectorCombinator::Child),
            "+" => Some(SelectorCombinator::AdjacentSibling),
            "~" => Some(SelectorCombinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(unsupported(selector));
            }
            pending_combinator = Some(combinator);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(unsupported(selector));
    }
    Ok(steps)
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    split_selector_groups(selector)?
        .iter()
        .map(|group| parse_selector_chain(group))
        .collect()
}

/// Tracks bracket and paren nesting so separators inside them are ignored.
#[derive(Default)]
struct Nesting {
    bracket: usize,
    paren: usize,
}

impl Nesting {
    fn track(&mut self, ch: char, selector: &str) -> Result<()> {
        match ch {
            '[' => self.bracket += 1,
            ']' => self.bracket = self.bracket.checked_sub(1).ok_or_else(|| unsupported(selector))?,
            '(' => self.paren += 1,
            ')' => self.paren = self.paren.checked_sub(1).ok_or_else(|| unsupported(selector))?,
            _ => {}
        }
        Ok(())
    }

    fn at_top(&self) -> bool {
        self.bracket == 0 && self.paren == 0
    }
}

pub(crate) fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();

    for ch in selector.chars() {
        if ch == ',' && nesting.at_top() {
            let trimmed = current.trim();
            if trimmed.is_empty() {
                return Err(unsupported(selector));
            }
            groups.push(trimmed.to_string());
            current.clear();
            continue;
        }
        nesting.track(ch, selector)?;
        current.push(ch);
    }

    let trimmed = current.trim();
    if !nesting.at_top() || trimmed.is_empty() {
        return Err(unsupported(selector));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

pub(crate) fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            tokens.push(trimmed.to_string());
        }
        current.clear();
    };

    for ch in selector.chars() {
        if nesting.at_top() {
            if matches!(ch, '>' | '+' | '~') {
                flush(&mut current, &mut tokens);
                tokens.push(ch.to_string());
                continue;
            }
            if ch.is_ascii_whitespace() {
                flush(&mut current, &mut tokens);
                continue;
            }
        }
        nesting.track(ch, selector)?;
        current.push(ch);
    }

    if !nesting.at_top() {
        return Err(unsupported(selector));
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

pub(crate) fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || step.tag.is_some() {
                    return Err(unsupported(part));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) =
                    parse_selector_ident(part, i + 1).ok_or_else(|| unsupported(part))?;
                if step.id.replace(id).is_some() {
                    return Err(unsupported(part));
                }
                i = next;
            }
            b'.' => {
                let (class_name, next) =
                    parse_selector_ident(part, i + 1).ok_or_else(|| unsupported(part))?;
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            b':' => {
                let (pseudo, next) =
                    parse_selector_pseudo(part, i).ok_or_else(|| unsupported(part))?;
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(unsupported(part));
                }
                let (tag, next) = parse_selector_ident(part, i).ok_or_else(|| unsupported(part))?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() {
        return Err(unsupported(part));
    }
    Ok(step)
}

fn is_selector_continuation(next: Option<&u8>) -> bool {
    next.is_none_or(|b| matches!(b, b'.' | b'#' | b'[' | b':'))
}

pub(crate) fn parse_selector_pseudo(
    part: &str,
    start: usize,
) -> Option<(SelectorPseudoClass, usize)> {
    if part.as_bytes().get(start)? != &b':' {
        return None;
    }
    let start = start + 1;
    let tail = part.get(start..)?;

    for (name, pseudo) in SIMPLE_PSEUDO_CLASSES {
        if let Some(rest) = tail.strip_prefix(name) {
            if is_selector_continuation(rest.as_bytes().first()) {
                return Some((pseudo.clone(), start + name.len()));
            }
        }
    }

    let open = tail.find('(')?;
    let name = &tail[..open];
    let body_start = start + open + 1;
    let body = part.get(body_start..)?;
    let close = find_matching_paren(body)?;
    let raw = body[..close].trim();
    let next = body_start + close + 1;
    if raw.is_empty() || !is_selector_continuation(part.as_bytes().get(next)) {
        return None;
    }

    let pseudo = match name {
        "nth-child" => SelectorPseudoClass::NthChild(parse_nth_child_selector(raw)?),
        "nth-last-child" => SelectorPseudoClass::NthLastChild(parse_nth_child_selector(raw)?),
        "not" => SelectorPseudoClass::Not(parse_selector_groups(raw).ok()?),
        "is" => SelectorPseudoClass::Is(parse_selector_groups(raw).ok()?),
        "where" => SelectorPseudoClass::Where(parse_selector_groups(raw).ok()?),
        "has" => SelectorPseudoClass::Has(parse_relative_selector_groups(raw)?),
        _ => return None,
    };
    Some((pseudo, next))
}

// `:has(> li)` style arguments start with a combinator relative to the subject.
fn parse_relative_selector_groups(raw: &str) -> Option<Vec<Vec<SelectorPart>>> {
    let mut out = Vec::new();
    for group in split_selector_groups(raw).ok()? {
        let (leading, rest) = match group.chars().next()? {
            '>' => (SelectorCombinator::Child, &group[1..]),
            '+' => (SelectorCombinator::AdjacentSibling, &group[1..]),
            '~' => (SelectorCombinator::GeneralSibling, &group[1..]),
            _ => (SelectorCombinator::Descendant, group.as_str()),
        };
        let mut chain = parse_selector_chain(rest).ok()?;
        if let Some(first) = chain.first_mut() {
            first.combinator = Some(leading);
        }
        out.push(chain);
    }
    Some(out)
}

pub(crate) fn find_matching_paren(body: &str) -> Option<usize> {
    let mut paren_depth = 1usize;
    let mut bracket_depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (idx, b) in body.bytes().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'\'' | b'"' => quote = Some(b),
            b'[' => bracket_depth += 1,
            b']' => bracket_depth = bracket_depth.checked_sub(1)?,
            b'(' if bracket_depth == 0 => paren_depth += 1,
            b')' if bracket_depth == 0 => {
                paren_depth -= 1;
                if paren_depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn parse_nth_child_selector(raw: &str) -> Option<NthChildSelector> {
    let compact = raw
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.as_str() {
        "" => None,
        "odd" => Some(NthChildSelector::Odd),
        "even" => Some(NthChildSelector::Even),
        other if other.contains('n') => parse_nth_child_expression(other),
        other if other.starts_with(['+', '-']) => None,
        other => match other.parse::<usize>().ok()? {
            0 => None,
            value => Some(NthChildSelector::Exact(value)),
        },
    }
}

fn parse_nth_child_expression(expr: &str) -> Option<NthChildSelector> {
    if expr.matches('n').count() != 1 {
        return None;
    }
    let (a_part, rest) = expr.split_at(expr.find('n')?);
    let b_part = &rest[1..];

    let a = match a_part {
        "" | "+" => 1,
        "-" => -1,
        _ => a_part.parse::<i64>().ok()?,
    };

    if b_part.is_empty() {
        return Some(NthChildSelector::AnPlusB(a, 0));
    }

    let (sign, raw_b) = if let Some(rest) = b_part.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = b_part.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    let b = raw_b.parse::<i64>().ok()?;
    Some(NthChildSelector::AnPlusB(a, b * sign))
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_selector_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_selector_attr_name_char(b: u8) -> bool {
    is_selector_ident_char(b) || b == b':'
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

pub(crate) fn parse_selector_attr_condition(
    src: &str,
    open_bracket: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = open_bracket + 1;

    skip_ws(bytes, &mut i);
    let key_start = i;
    while i < bytes.len() && is_selector_attr_name_char(bytes[i]) {
        i += 1;
    }
    if key_start == i {
        return Err(unsupported(src));
    }
    let key = src[key_start..i].to_ascii_lowercase();

    skip_ws(bytes, &mut i);
    match bytes.get(i) {
        Some(b']') => return Ok((SelectorAttrCondition::Exists { key }, i + 1)),
        None => return Err(unsupported(src)),
        _ => {}
    }

    let (op, next) = match (bytes[i], bytes.get(i + 1)) {
        (b'=', _) => (b'=', i + 1),
        (op @ (b'^' | b'$' | b'*' | b'~' | b'|'), Some(b'=')) => (op, i + 2),
        _ => return Err(unsupported(src)),
    };

    i = next;
    skip_ws(bytes, &mut i);
    let (value, after_value) = parse_selector_attr_value(src, i)?;
    i = after_value;
    skip_ws(bytes, &mut i);
    if bytes.get(i) != Some(&b']') {
        return Err(unsupported(src));
    }

    let cond = match op {
        b'^' => SelectorAttrCondition::StartsWith { key, value },
        b'$' => SelectorAttrCondition::EndsWith { key, value },
        b'*' => SelectorAttrCondition::Contains { key, value },
        b'~' => SelectorAttrCondition::Includes { key, value },
        b'|' => SelectorAttrCondition::DashMatch { key, value },
        _ => SelectorAttrCondition::Eq { key, value },
    };
    Ok((cond, i + 1))
}

fn parse_selector_attr_value(src: &str, start: usize) -> Result<(String, usize)> {
    let bytes = src.as_bytes();
    let Some(&first) = bytes.get(start) else {
        return Err(unsupported(src));
    };

    if first == b'"' || first == b'\'' {
        let mut i = start + 1;
        let mut value = String::new();
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() => {
                    let ch = src[i + 1..].chars().next().ok_or_else(|| unsupported(src))?;
                    value.push(ch);
                    i += 1 + ch.len_utf8();
                }
                b if b == first => return Ok((value, i + 1)),
                _ => {
                    let ch = src[i..].chars().next().ok_or_else(|| unsupported(src))?;
                    value.push(ch);
                    i += ch.len_utf8();
                }
            }
        }
        return Err(unsupported(src));
    }

    let mut i = start;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b']' {
        i += 1;
    }
    Ok((src[start..i].to_string(), i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_steps_and_combinators() -> Result<()> {
        let chain = parse_selector_chain("ul#menu > li.item[data-x^='a'] + li:first-child")?;
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].step.tag.as_deref(), Some("ul"));
        assert_eq!(chain[0].step.id.as_deref(), Some("menu"));
        assert_eq!(chain[1].combinator, Some(SelectorCombinator::Child));
        assert_eq!(chain[1].step.classes, vec!["item".to_string()]);
        assert_eq!(
            chain[1].step.attrs,
            vec![SelectorAttrCondition::StartsWith {
                key: "data-x".into(),
                value: "a".into()
            }]
        );
        assert_eq!(chain[2].combinator, Some(SelectorCombinator::AdjacentSibling));
        assert_eq!(
            chain[2].step.pseudo_classes,
            vec![SelectorPseudoClass::FirstChild]
        );
        Ok(())
    }

    #[test]
    fn splits_groups_outside_parens() -> Result<()> {
        let groups = split_selector_groups("a, :is(b, c) , d")?;
        assert_eq!(groups, vec!["a", ":is(b, c)", "d"]);
        Ok(())
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["", "div >", "> p", "a,,b", "[x", "p:hover", ".", "#a#b", "a[x=1"] {
            assert!(parse_selector_groups(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn nth_expressions() {
        assert_eq!(parse_nth_child_selector("odd"), Some(NthChildSelector::Odd));
        assert_eq!(parse_nth_child_selector("3"), Some(NthChildSelector::Exact(3)));
        assert_eq!(
            parse_nth_child_selector("-n + 3"),
            Some(NthChildSelector::AnPlusB(-1, 3))
        );
        assert_eq!(parse_nth_child_selector("0"), None);
        assert!(NthChildSelector::AnPlusB(2, 1).matches(5));
        assert!(!NthChildSelector::AnPlusB(2, 1).matches(4));
        assert!(NthChildSelector::AnPlusB(-1, 3).matches(2));
        assert!(!NthChildSelector::AnPlusB(-1, 3).matches(4));
    }

    #[test]
    fn has_accepts_relative_arguments() -> Result<()> {
        let chain = parse_selector_chain("section:has(> h2)")?;
        let [SelectorPseudoClass::Has(groups)] = chain[0].step.pseudo_classes.as_slice() else {
            panic!("expected :has");
        };
        assert_eq!(groups[0][0].combinator, Some(SelectorCombinator::Child));
        Ok(())
    }
}
