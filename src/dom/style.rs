use super::Dom;
use crate::ext::StrExt;
use crate::{Error, NodeId, Result};

/// Inline `style` attribute split into ordered `(property, value)` pairs.
///
/// Semicolons inside quotes or parentheses do not terminate a declaration.
pub(crate) fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    let bytes = style_attr.as_bytes();
    let mut start = 0usize;
    let mut i = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let ch = bytes[i];
        match quote {
            Some(_) if ch == b'\\' && i + 1 < bytes.len() => {
                i += 2;
                continue;
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                b'\'' | b'"' => quote = Some(ch),
                b'(' => paren_depth += 1,
                b')' => paren_depth = paren_depth.saturating_sub(1),
                b';' if paren_depth == 0 => {
                    push_declaration(&style_attr[start..i], &mut out);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    push_declaration(&style_attr[start..], &mut out);
    out
}

fn push_declaration(raw: &str, out: &mut Vec<(String, String)>) {
    let Some((name, value)) = raw.trim().split_once(':') else {
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return;
    }
    let value = value.trim().to_string();
    match out.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = value,
        None => out.push((name, value)),
    }
}

pub(crate) fn serialize_style_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accepts both `marginTop` and `margin-top`.
pub(crate) fn css_property_name(prop: &str) -> String {
    if prop.contains('-') {
        prop.to_ascii_lowercase()
    } else {
        prop.to_dash_case()
    }
}

impl Dom {
    pub(crate) fn style_get(&self, node_id: NodeId, prop: &str) -> Result<String> {
        let element = self.require_element(node_id, "style")?;
        let name = css_property_name(prop);
        Ok(
            parse_style_declarations(element.attrs.get("style").map(String::as_str))
                .into_iter()
                .find(|(existing, _)| *existing == name)
                .map(|(_, value)| value)
                .unwrap_or_default(),
        )
    }

    /// An empty value removes the declaration.
    pub(crate) fn style_set(&mut self, node_id: NodeId, prop: &str, value: &str) -> Result<()> {
        let name = css_property_name(prop);
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::NotAnElement(format!("style target {node_id}")))?;
        let mut decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        let pos = decls.iter().position(|(existing, _)| *existing == name);
        match (pos, value.is_empty()) {
            (Some(pos), true) => {
                decls.remove(pos);
            }
            (Some(pos), false) => decls[pos].1 = value.to_string(),
            (None, true) => {}
            (None, false) => decls.push((name, value.to_string())),
        }
        if decls.is_empty() {
            element.attrs.remove("style");
        } else {
            element
                .attrs
                .insert("style".into(), serialize_style_declarations(&decls));
        }
        Ok(())
    }

    pub(crate) fn has_class(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id).is_some_and(|element| {
            element
                .attrs
                .get("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
        })
    }
}
