use std::collections::HashMap;

use crate::dom::Dom;
use crate::{Error, NodeId, Result};

/// Parses markup into a fresh [`Dom`] whose root holds the top-level nodes.
///
/// The parser is forgiving: unmatched end tags close up to the nearest open
/// element with that name, `<li>`/`<p>` close implicitly, and the bodies of
/// `script`/`style` are kept as raw text.
pub(crate) fn parse_fragment(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
            i = end + 3;
            continue;
        }

        if bytes[i] == b'<'
            && bytes
                .get(i + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'/' || *b == b'!')
        {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;
                close_until(&dom, &mut stack, &tag);
                continue;
            }

            if starts_with_at(bytes, i, b"<!") {
                i = parse_declaration_tag(html, i)?;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            close_optional_list_item(&dom, &mut stack, &tag);
            close_optional_paragraph(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) && !self_closing {
                let close = find_case_insensitive_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close).filter(|body| !body.is_empty()) {
                    dom.create_text(node, body.to_string());
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }
        if let Some(text) = html.get(text_start..i) {
            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let decoded = decode_character_references(text);
            if !decoded.is_empty() {
                dom.create_text(parent, decoded);
            }
        }
    }

    Ok(dom)
}

fn close_until(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    let open = (1..stack.len())
        .rev()
        .find(|index| {
            dom.tag_name(stack[*index])
                .is_some_and(|open| open.eq_ignore_ascii_case(tag))
        });
    if let Some(index) = open {
        stack.truncate(index);
    }
}

fn close_optional_list_item(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if tag != "li" {
        return;
    }
    for index in (1..stack.len()).rev() {
        match dom.tag_name(stack[index]) {
            Some("li") => {
                stack.truncate(index);
                return;
            }
            Some("ul" | "ol" | "menu") => return,
            _ => {}
        }
    }
}

fn close_optional_paragraph(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if !is_paragraph_terminator(tag) {
        return;
    }
    if let Some(index) = (1..stack.len())
        .rev()
        .find(|index| dom.tag_name(stack[*index]) == Some("p"))
    {
        stack.truncate(index);
    }
}

fn is_paragraph_terminator(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();
    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unclosed start tag <{tag}")));
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        if starts_with_at(bytes, i, b"/>") {
            self_closing = true;
            i += 2;
            break;
        }
        if !is_attr_name_char(bytes[i]) {
            // Skip junk such as a stray quote or slash.
            i += 1;
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, &mut i)?
        } else {
            String::new()
        };
        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse(format!("unclosed end tag </{tag}")));
    }
    Ok((tag, i + 1))
}

// `<!DOCTYPE ...>` and friends; skipped.
fn parse_declaration_tag(html: &str, at: usize) -> Result<usize> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'>' => return Ok(i + 1),
                _ => {}
            },
        }
        i += 1;
    }
    Err(Error::HtmlParse("unclosed declaration tag".into()))
}

fn parse_attr_value(html: &str, i: &mut usize) -> Result<String> {
    let bytes = html.as_bytes();
    let Some(&first) = bytes.get(*i) else {
        return Err(Error::HtmlParse("missing attribute value".into()));
    };

    if first == b'\'' || first == b'"' {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != first {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        *i += 1;
        return Ok(decode_character_references(value));
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !starts_with_at(bytes, *i, b"/>")
    {
        *i += 1;
    }
    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_character_references(value))
}

fn decode_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail.find(';').and_then(|end| {
            let raw = &tail[..end];
            let ch = match raw.strip_prefix('#') {
                Some(num) => decode_numeric(num),
                None => decode_named(raw),
            }?;
            Some((ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric(value: &str) -> Option<char> {
    let codepoint = match value.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse::<u32>().ok()?,
    };
    char::from_u32(codepoint)
}

fn decode_named(value: &str) -> Option<char> {
    match value {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "trade" => Some('™'),
        "hellip" => Some('…'),
        "middot" => Some('·'),
        "times" => Some('×'),
        "divide" => Some('÷'),
        "deg" => Some('°'),
        "laquo" => Some('«'),
        "raquo" => Some('»'),
        "larr" => Some('←'),
        "rarr" => Some('→'),
        _ => None,
    }
}

pub(crate) fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn find_case_insensitive_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i + 2 + tag.len() <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + 2 + tag.len()].eq_ignore_ascii_case(tag)
            && bytes
                .get(i + 2 + tag.len())
                .is_none_or(|b| *b == b'>' || b.is_ascii_whitespace())
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.get(at..at + needle.len()) == Some(needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.' | b'@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_markup_and_entities() -> Result<()> {
        let dom = parse_fragment(
            "<!DOCTYPE html><!-- note --><div id=main class=\"a b\" hidden><p>x &amp; y &#x41;</p></div>",
        )?;
        let main = dom.by_id("main").ok_or_else(|| Error::HtmlParse("missing".into()))?;
        assert_eq!(dom.attr(main, "class").as_deref(), Some("a b"));
        assert_eq!(dom.attr(main, "hidden").as_deref(), Some(""));
        assert_eq!(dom.text_content(main), "x & y A");
        Ok(())
    }

    #[test]
    fn implicit_closes_and_stray_end_tags() -> Result<()> {
        let dom = parse_fragment("<ul><li>a<li>b</ul><p>one<p>two</span>")?;
        assert_eq!(
            dom.dump_node(dom.root),
            "<ul><li>a</li><li>b</li></ul><p>one</p><p>two</p>"
        );
        Ok(())
    }

    #[test]
    fn raw_text_elements_keep_markup() -> Result<()> {
        let dom =
            parse_fragment("<script>if (a < b) { x = '</div>'; }</script><br/><img src=a.png>")?;
        assert_eq!(
            dom.dump_node(dom.root),
            "<script>if (a < b) { x = '</div>'; }</script><br><img src=\"a.png\">"
        );
        Ok(())
    }

    #[test]
    fn unterminated_constructs_are_errors() {
        assert!(matches!(parse_fragment("<!-- open"), Err(Error::HtmlParse(_))));
        assert!(matches!(parse_fragment("<div class='x"), Err(Error::HtmlParse(_))));
        assert!(matches!(parse_fragment("<script>var a;"), Err(Error::HtmlParse(_))));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("a<b & c>"), "a&lt;b &amp; c&gt;");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(decode_character_references("&bogus; &lt"), "&bogus; &lt");
    }
}
