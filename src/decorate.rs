use std::fmt;
use std::rc::Rc;

use crate::dom::css_property_name;
use crate::ext::{SliceExt, StrExt, VecExt};
use crate::value::format_number;
use crate::{Document, Error, MethodTable, NodeId, Query, QueryInput, Result, Value};

pub type CustomMethod = Rc<dyn Fn(&mut Document, NodeId, &[Value]) -> Result<Value>>;

/// One entry of the element method table.
///
/// Setters return the element (or, for `appendTo`-style moves, the new
/// parent); getters return the value read.
#[derive(Clone)]
pub enum ElementMethod {
    /// Numeric inline style written as `Npx` on the next frame.
    PxStyle(String),
    /// Inline style written verbatim on the next frame.
    Style(String),
    Attribute(String),
    Builtin(Builtin),
    Custom(CustomMethod),
}

impl ElementMethod {
    pub fn custom(
        method: impl Fn(&mut Document, NodeId, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self::Custom(Rc::new(method))
    }
}

impl PartialEq for ElementMethod {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::PxStyle(a), Self::PxStyle(b)) => a == b,
            (Self::Style(a), Self::Style(b)) => a == b,
            (Self::Attribute(a), Self::Attribute(b)) => a == b,
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ElementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PxStyle(prop) => f.debug_tuple("PxStyle").field(prop).finish(),
            Self::Style(prop) => f.debug_tuple("Style").field(prop).finish(),
            Self::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            Self::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Attr,
    Opacity,
    Transition,
    Transform,
    X,
    Y,
    Z,
    Rotate,
    Border,
    BorderVertical,
    BorderHorizontal,
    BorderVerticalWidth,
    BorderHorizontalWidth,
    Padding,
    PaddingVertical,
    PaddingHorizontal,
    Width,
    Height,
    CenterX,
    CenterY,
    Center,
    AddClass,
    RemoveClass,
    Html,
    Append,
    Prepend,
    AppendTo,
    PrependTo,
    RemoveFrom,
    Tag,
    Has,
    Matches,
    Closest,
    Find,
    Next,
    Prev,
    Siblings,
}

const PX_STYLES: &[&str] = &[
    "top",
    "right",
    "bottom",
    "left",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
    "borderTopWidth",
    "borderRightWidth",
    "borderBottomWidth",
    "borderLeftWidth",
    "borderWidth",
    "borderRadius",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
];

const STYLES: &[&str] = &[
    "background",
    "backgroundColor",
    "display",
    "visibility",
    "borderTop",
    "borderRight",
    "borderBottom",
    "borderLeft",
    "position",
    "float",
    "cursor",
];

const STYLE_ALIASES: &[(&str, &str)] = &[("layer", "z-index"), ("shadow", "box-shadow")];

const ATTRIBUTES: &[(&str, &str)] = &[("classes", "class"), ("tooltip", "title"), ("src", "src")];

const BUILTINS: &[(&str, Builtin)] = &[
    ("attr", Builtin::Attr),
    ("opacity", Builtin::Opacity),
    ("transition", Builtin::Transition),
    ("transform", Builtin::Transform),
    ("x", Builtin::X),
    ("y", Builtin::Y),
    ("z", Builtin::Z),
    ("rotate", Builtin::Rotate),
    ("border", Builtin::Border),
    ("borderVertical", Builtin::BorderVertical),
    ("borderHorizontal", Builtin::BorderHorizontal),
    ("borderVerticalWidth", Builtin::BorderVerticalWidth),
    ("borderHorizontalWidth", Builtin::BorderHorizontalWidth),
    ("padding", Builtin::Padding),
    ("paddingVertical", Builtin::PaddingVertical),
    ("paddingHorizontal", Builtin::PaddingHorizontal),
    ("width", Builtin::Width),
    ("height", Builtin::Height),
    ("centerX", Builtin::CenterX),
    ("centerY", Builtin::CenterY),
    ("center", Builtin::Center),
    ("addClass", Builtin::AddClass),
    ("removeClass", Builtin::RemoveClass),
    ("html", Builtin::Html),
    ("append", Builtin::Append),
    ("prepend", Builtin::Prepend),
    ("appendTo", Builtin::AppendTo),
    ("prependTo", Builtin::PrependTo),
    ("removeFrom", Builtin::RemoveFrom),
    ("tag", Builtin::Tag),
    ("has", Builtin::Has),
    ("matches", Builtin::Matches),
    ("closest", Builtin::Closest),
    ("find", Builtin::Find),
    ("next", Builtin::Next),
    ("prev", Builtin::Prev),
    ("siblings", Builtin::Siblings),
];

fn build_default_table() -> MethodTable<ElementMethod> {
    let mut table = MethodTable::new("Element");
    table.implement(
        PX_STYLES
            .iter()
            .map(|name| (*name, ElementMethod::PxStyle(css_property_name(name)))),
    );
    table.implement(
        STYLES
            .iter()
            .map(|name| (*name, ElementMethod::Style(css_property_name(name)))),
    );
    table.implement(
        STYLE_ALIASES
            .iter()
            .map(|(name, prop)| (*name, ElementMethod::Style((*prop).to_string()))),
    );
    table.implement(
        ATTRIBUTES
            .iter()
            .map(|(name, attr)| (*name, ElementMethod::Attribute((*attr).to_string()))),
    );
    table.implement(
        BUILTINS
            .iter()
            .map(|(name, builtin)| (*name, ElementMethod::Builtin(*builtin))),
    );
    table
}

thread_local! {
    static DEFAULT_ELEMENT_METHODS: MethodTable<ElementMethod> = build_default_table();
}

/// A copy of the shared default table.
pub(crate) fn default_element_methods() -> MethodTable<ElementMethod> {
    DEFAULT_ELEMENT_METHODS.with(Clone::clone)
}

pub(crate) fn apply(
    doc: &mut Document,
    node: NodeId,
    method: &ElementMethod,
    args: &[Value],
) -> Result<Value> {
    match method {
        ElementMethod::PxStyle(prop) => px_style(doc, node, prop, args),
        ElementMethod::Style(prop) => style(doc, node, prop, args),
        ElementMethod::Attribute(name) => attribute(doc, node, name, args),
        ElementMethod::Builtin(builtin) => apply_builtin(doc, node, *builtin, args),
        ElementMethod::Custom(method) => method(doc, node, args),
    }
}

fn given(args: &[Value], idx: usize) -> Option<&Value> {
    args.get(idx).filter(|value| !value.is_nullish())
}

fn required<'a>(args: &'a [Value], idx: usize, method: &str) -> Result<&'a Value> {
    given(args, idx)
        .ok_or_else(|| Error::invalid_argument(method, format!("missing argument {idx}")))
}

fn px(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(n) => format!("{}px", format_number(*n)),
        other => format!("{}px", other.to_display_string()),
    }
}

fn int_or_nan(value: Option<i64>) -> Value {
    Value::Number(value.map_or(f64::NAN, |n| n as f64))
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::String(text) => text.to_number().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn px_style(doc: &mut Document, node: NodeId, prop: &str, args: &[Value]) -> Result<Value> {
    let Some(value) = given(args, 0) else {
        let current = doc.dom.style_get(node, prop)?;
        let current = if current.is_empty() { "0px" } else { current.as_str() };
        return Ok(int_or_nan(current.to_int()));
    };
    if let Some(time) = given(args, 1) {
        set_transition(doc, node, prop, time)?;
        if doc.dom.style_get(node, prop)?.is_empty() {
            doc.dom.style_set(node, prop, "0px")?;
        }
    }
    doc.queue_style(node, prop, px(value));
    Ok(Value::Element(node))
}

fn style(doc: &mut Document, node: NodeId, prop: &str, args: &[Value]) -> Result<Value> {
    let Some(value) = given(args, 0) else {
        return Ok(Value::String(doc.dom.style_get(node, prop)?));
    };
    if let Some(time) = given(args, 1) {
        set_transition(doc, node, prop, time)?;
    }
    doc.queue_style(node, prop, value.to_display_string());
    Ok(Value::Element(node))
}

fn attribute(doc: &mut Document, node: NodeId, name: &str, args: &[Value]) -> Result<Value> {
    let Some(value) = given(args, 0) else {
        doc.dom.require_element(node, name)?;
        return Ok(doc.dom.attr(node, name).map_or(Value::Null, Value::String));
    };
    doc.dom.set_attr(node, name, &value.to_display_string())?;
    Ok(Value::Element(node))
}

fn set_transition(doc: &mut Document, node: NodeId, prop: &str, time: &Value) -> Result<()> {
    let mut transitions = doc.dom.style_get(node, "transition")?.structure(", ", " ");
    transitions.insert(
        css_property_name(prop),
        format!("{}ms", time.to_display_string()),
    );
    doc.dom
        .style_set(node, "transition", &transitions.destructure(", ", " "))
}

fn transform_part(doc: &Document, node: NodeId, key: &str) -> Result<Option<String>> {
    let transforms = doc.dom.style_get(node, "transform")?.calls_object(" ");
    Ok(transforms.get_str(key).map(str::to_owned))
}

fn set_transform_part(doc: &mut Document, node: NodeId, key: &str, value: String) -> Result<()> {
    let mut transforms = doc.dom.style_get(node, "transform")?.calls_object(" ");
    transforms.insert(key, value);
    doc.dom
        .style_set(node, "transform", &transforms.calls_string(" "))
}

// x/y/z/rotate: one transform function with a fixed unit.
fn transform_axis(
    doc: &mut Document,
    node: NodeId,
    function: &str,
    unit: &str,
    args: &[Value],
) -> Result<Value> {
    let Some(value) = given(args, 0) else {
        let current = transform_part(doc, node, function)?.unwrap_or_else(|| "0".into());
        return Ok(int_or_nan(current.to_int()));
    };
    if let Some(time) = given(args, 1) {
        set_transition(doc, node, "transform", time)?;
    }
    set_transform_part(
        doc,
        node,
        function,
        format!("{}{unit}", value.to_display_string()),
    )?;
    Ok(Value::Element(node))
}

/// Reads through `getter` with no arguments, or writes every setter.
fn composite(
    doc: &mut Document,
    node: NodeId,
    getter: &str,
    setters: &[&str],
    args: &[Value],
) -> Result<Value> {
    if args.is_empty() {
        return doc.call(node, getter, &[]);
    }
    for setter in setters {
        doc.call(node, setter, &args[..1])?;
    }
    Ok(Value::Element(node))
}

/// Reads the sum of both sides, or writes both.
fn pair_sum(
    doc: &mut Document,
    node: NodeId,
    sides: [&str; 2],
    args: &[Value],
) -> Result<Value> {
    if args.is_empty() {
        let mut total = 0.0;
        for side in sides {
            total += number_of(&doc.call(node, side, &[])?);
        }
        return Ok(Value::Number(total));
    }
    for side in sides {
        doc.call(node, side, &args[..1])?;
    }
    Ok(Value::Element(node))
}

fn dimension(
    doc: &mut Document,
    node: NodeId,
    prop: &str,
    client: f64,
    padding: &str,
    border: &str,
    args: &[Value],
) -> Result<Value> {
    match given(args, 0) {
        None => {
            let padding = number_of(&doc.call(node, padding, &[])?);
            Ok(Value::Number(client - padding))
        }
        Some(Value::Bool(_)) => {
            let border = number_of(&doc.call(node, border, &[])?);
            Ok(Value::Number(client + border))
        }
        Some(value) => {
            doc.queue_style(node, prop, px(value));
            Ok(Value::Element(node))
        }
    }
}

fn center_axis(
    doc: &mut Document,
    node: NodeId,
    offset: &str,
    margin: &str,
    size: &str,
) -> Result<Value> {
    let outer = number_of(&doc.call(node, size, &[Value::Bool(true)])?);
    let shift = (-outer / 2.0).trunc() + 0.0;
    doc.call(node, "position", &[Value::from("absolute")])?;
    doc.call(node, offset, &[Value::from("50%")])?;
    doc.call(node, margin, &[Value::Number(shift)])?;
    Ok(Value::Element(node))
}

/// `$(value)[0]`: an element, the first member of a query, or the first
/// match of a selector.
fn resolve_element(doc: &mut Document, method: &str, value: &Value) -> Result<NodeId> {
    let query = match value {
        Value::Element(node) => return Ok(*node),
        Value::Query(query) => query.clone(),
        Value::String(selector) => doc.query(QueryInput::Selector(selector.as_str()))?,
        other => {
            return Err(Error::invalid_argument(
                method,
                format!("expected an element, got {}", other.kind().as_str()),
            ));
        }
    };
    query
        .first()
        .ok_or_else(|| Error::invalid_argument(method, "no element to use"))
}

fn class_list(doc: &Document, node: NodeId) -> Vec<String> {
    doc.dom
        .attr(node, "class")
        .map(|classes| classes.split(' ').map(str::to_owned).collect())
        .unwrap_or_default()
}

fn siblings_of(doc: &mut Document, node: NodeId, args: &[Value]) -> Result<Option<Query>> {
    let Some(parent) = doc.dom.parent(node).filter(|parent| doc.dom.element(*parent).is_some())
    else {
        return Ok(None);
    };
    let selector = given(args, 0)
        .map(Value::to_display_string)
        .filter(|selector| !selector.trim().is_empty());
    Query::from_members(vec![parent])
        .children(doc, selector.as_deref())
        .map(Some)
}

fn step_sibling(doc: &mut Document, node: NodeId, args: &[Value], step: i64) -> Result<Value> {
    let Some(children) = siblings_of(doc, node, args)? else {
        return Ok(Value::Undefined);
    };
    let position = children
        .index_of(node)
        .and_then(|idx| i64::try_from(idx).ok())
        .unwrap_or(-1);
    Ok(children
        .members()
        .index_wrapped(position + step)
        .map_or(Value::Undefined, |sibling| Value::Element(*sibling)))
}

fn apply_builtin(
    doc: &mut Document,
    node: NodeId,
    builtin: Builtin,
    args: &[Value],
) -> Result<Value> {
    doc.dom.require_element(node, "element method")?;
    match builtin {
        Builtin::Attr => {
            let key = required(args, 0, "attr")?.to_display_string();
            match args.get(1).filter(|value| value.truthy()) {
                Some(value) => {
                    doc.dom.set_attr(node, &key, &value.to_display_string())?;
                    Ok(Value::Element(node))
                }
                None => Ok(doc.dom.attr(node, &key).map_or(Value::Null, Value::String)),
            }
        }
        Builtin::Opacity => {
            let Some(value) = given(args, 0) else {
                let current = doc.dom.style_get(node, "opacity")?;
                let current = if current.is_empty() { "1" } else { current.as_str() };
                return Ok(Value::Number(current.to_number().unwrap_or(f64::NAN)));
            };
            if let Some(time) = given(args, 1) {
                set_transition(doc, node, "opacity", time)?;
            }
            doc.dom
                .style_set(node, "opacity", &value.to_display_string())?;
            Ok(Value::Element(node))
        }
        Builtin::Transition => {
            let key = css_property_name(&required(args, 0, "transition")?.to_display_string());
            match given(args, 1) {
                Some(time) => {
                    set_transition(doc, node, &key, time)?;
                    Ok(Value::Element(node))
                }
                None => {
                    let transitions = doc.dom.style_get(node, "transition")?.structure(", ", " ");
                    Ok(transitions
                        .get_str(&key)
                        .map_or(Value::Null, |time| int_or_nan(time.to_int())))
                }
            }
        }
        Builtin::Transform => {
            let key = required(args, 0, "transform")?.to_display_string();
            match args.get(1) {
                Some(value) => {
                    set_transform_part(doc, node, &key, value.to_display_string())?;
                    Ok(Value::Element(node))
                }
                None => {
                    Ok(transform_part(doc, node, &key)?.map_or(Value::Undefined, Value::String))
                }
            }
        }
        Builtin::X => transform_axis(doc, node, "translateX", "px", args),
        Builtin::Y => transform_axis(doc, node, "translateY", "px", args),
        Builtin::Z => transform_axis(doc, node, "translateZ", "px", args),
        Builtin::Rotate => transform_axis(doc, node, "rotate", "deg", args),
        Builtin::Border => composite(
            doc,
            node,
            "borderTop",
            &["borderTop", "borderRight", "borderBottom", "borderLeft"],
            args,
        ),
        Builtin::BorderVertical => {
            composite(doc, node, "borderTop", &["borderTop", "borderBottom"], args)
        }
        Builtin::BorderHorizontal => {
            composite(doc, node, "borderLeft", &["borderLeft", "borderRight"], args)
        }
        Builtin::BorderVerticalWidth => {
            pair_sum(doc, node, ["borderTopWidth", "borderBottomWidth"], args)
        }
        Builtin::BorderHorizontalWidth => {
            pair_sum(doc, node, ["borderLeftWidth", "borderRightWidth"], args)
        }
        Builtin::Padding => composite(
            doc,
            node,
            "paddingTop",
            &["paddingTop", "paddingRight", "paddingBottom", "paddingLeft"],
            args,
        ),
        Builtin::PaddingVertical => pair_sum(doc, node, ["paddingTop", "paddingBottom"], args),
        Builtin::PaddingHorizontal => pair_sum(doc, node, ["paddingLeft", "paddingRight"], args),
        Builtin::Width => {
            let (width, _) = doc.dom.client_size(node);
            dimension(
                doc,
                node,
                "width",
                width,
                "paddingHorizontal",
                "borderHorizontalWidth",
                args,
            )
        }
        Builtin::Height => {
            let (_, height) = doc.dom.client_size(node);
            dimension(
                doc,
                node,
                "height",
                height,
                "paddingVertical",
                "borderVerticalWidth",
                args,
            )
        }
        Builtin::CenterX => center_axis(doc, node, "left", "marginLeft", "width"),
        Builtin::CenterY => center_axis(doc, node, "top", "marginTop", "height"),
        Builtin::Center => {
            center_axis(doc, node, "left", "marginLeft", "width")?;
            center_axis(doc, node, "top", "marginTop", "height")
        }
        Builtin::AddClass => {
            let class_name = required(args, 0, "addClass")?.to_display_string();
            let mut classes = class_list(doc, node);
            let joined = if classes.iter().all(String::is_empty) {
                class_name
            } else {
                classes.add([class_name]);
                classes.unique().join(" ")
            };
            doc.dom.set_attr(node, "class", &joined)?;
            Ok(Value::Element(node))
        }
        Builtin::RemoveClass => {
            let class_name = required(args, 0, "removeClass")?.to_display_string();
            let mut classes = class_list(doc, node);
            if !classes.is_empty() {
                classes.remove_item(&class_name);
                doc.dom.set_attr(node, "class", &classes.join(" "))?;
            }
            Ok(Value::Element(node))
        }
        Builtin::Html => match args.first() {
            None => Ok(Value::String(doc.dom.inner_html(node)?)),
            Some(markup) => {
                let markup = if markup.is_nullish() {
                    String::new()
                } else {
                    markup.to_display_string()
                };
                doc.dom.set_inner_html(node, &markup)?;
                Ok(Value::Element(node))
            }
        },
        Builtin::Append => {
            let child = resolve_element(doc, "append", required(args, 0, "append")?)?;
            doc.dom.append_child(node, child)?;
            Ok(Value::Element(node))
        }
        Builtin::Prepend => {
            let child = resolve_element(doc, "prepend", required(args, 0, "prepend")?)?;
            doc.dom.prepend_child(node, child)?;
            Ok(Value::Element(node))
        }
        Builtin::AppendTo => {
            let parent = resolve_element(doc, "appendTo", required(args, 0, "appendTo")?)?;
            doc.dom.append_child(parent, node)?;
            Ok(Value::Element(parent))
        }
        Builtin::PrependTo => {
            let parent = resolve_element(doc, "prependTo", required(args, 0, "prependTo")?)?;
            doc.dom.prepend_child(parent, node)?;
            Ok(Value::Element(parent))
        }
        Builtin::RemoveFrom => {
            let parent = match given(args, 0) {
                Some(value) => resolve_element(doc, "removeFrom", value)?,
                None => doc
                    .dom
                    .parent(node)
                    .ok_or_else(|| Error::invalid_argument("removeFrom", "element is detached"))?,
            };
            doc.dom.remove_child(parent, node)?;
            Ok(Value::Element(parent))
        }
        Builtin::Tag => Ok(doc
            .dom
            .tag_name(node)
            .map_or(Value::Undefined, |tag| Value::String(tag.to_ascii_lowercase()))),
        Builtin::Has => match args.first() {
            Some(Value::String(selector)) => {
                Ok(Value::Bool(doc.dom.matches_selector(node, selector)?))
            }
            Some(Value::Element(other)) => Ok(Value::Bool(doc.dom.contains(node, *other))),
            _ => Ok(Value::Element(node)),
        },
        Builtin::Matches => {
            let selector = required(args, 0, "matches")?.to_display_string();
            Ok(Value::Bool(doc.dom.matches_selector(node, &selector)?))
        }
        Builtin::Closest => {
            let selector = required(args, 0, "closest")?.to_display_string();
            Ok(doc
                .dom
                .closest(node, &selector)?
                .map_or(Value::Undefined, Value::Element))
        }
        Builtin::Find => {
            let selector = required(args, 0, "find")?.to_display_string();
            let found = doc.dom.query_selector_all_from(node, &selector)?;
            Ok(Value::Query(Query::from_members(found)))
        }
        Builtin::Next => step_sibling(doc, node, args, 1),
        Builtin::Prev => step_sibling(doc, node, args, -1),
        Builtin::Siblings => Ok(siblings_of(doc, node, args)?
            .map_or_else(Query::default, |children| children.without(node))
            .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_list() {
        let table = default_element_methods();
        assert_eq!(
            table.get("marginTop"),
            Some(&ElementMethod::PxStyle("margin-top".into()))
        );
        assert_eq!(
            table.get("backgroundColor"),
            Some(&ElementMethod::Style("background-color".into()))
        );
        assert_eq!(table.get("layer"), Some(&ElementMethod::Style("z-index".into())));
        assert_eq!(
            table.get("tooltip"),
            Some(&ElementMethod::Attribute("title".into()))
        );
        assert_eq!(table.get("center"), Some(&ElementMethod::Builtin(Builtin::Center)));
        assert_eq!(
            table.len(),
            PX_STYLES.len() + STYLES.len() + STYLE_ALIASES.len() + ATTRIBUTES.len() + BUILTINS.len()
        );
    }

    #[test]
    fn custom_methods_compare_by_identity() {
        let method = ElementMethod::custom(|_, node, _| Ok(Value::Element(node)));
        assert_eq!(method, method.clone());
        assert_ne!(method, ElementMethod::custom(|_, node, _| Ok(Value::Element(node))));
    }

    #[test]
    fn px_rendering() {
        assert_eq!(px(&Value::from(5)), "5px");
        assert_eq!(px(&Value::from(-12.5)), "-12.5px");
        assert_eq!(px(&Value::from("50%")), "50%");
    }
}
