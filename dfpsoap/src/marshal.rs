//! Serialization of wire values into namespaced XML

use crate::error::SoapError;
use crate::field_order::FieldOrderTable;
use crate::value::{WireStruct, WireValue};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;
use xmltree::{EmitterConfig, Element, XMLNode};

pub const XSI_TYPE_ATTR: &str = "xsi:type";
pub const XSI_NIL_ATTR: &str = "xsi:nil";

/// Marshals `value` as the element `field_name` and renders the fragment.
///
/// An empty `field_name` renders the bare content (escaped text for a
/// scalar, the children for a struct).
///
/// # Example
///
/// ```
/// use dfpsoap::{EntityOrder, FieldOrderTable, WireStruct, marshal};
///
/// let table = FieldOrderTable::new()
///     .entity("size", EntityOrder::new(["width", "height"]));
/// let size = WireStruct::new().with("height", "250").with("width", "300");
///
/// let xml = marshal(&size.into(), "size", &table).unwrap();
/// assert_eq!(xml, "<size><width>300</width><height>250</height></size>");
/// ```
pub fn marshal(
    value: &WireValue,
    field_name: &str,
    table: &FieldOrderTable,
) -> Result<String, SoapError> {
    nodes_to_string(&marshal_nodes(value, field_name, table))
}

/// Marshals `value` into XML nodes, one per emitted element.
///
/// Sequences yield one node per item, and nothing when empty.
pub fn marshal_nodes(value: &WireValue, field_name: &str, table: &FieldOrderTable) -> Vec<XMLNode> {
    marshal_nodes_in(value, None, field_name, table)
}

/// [`marshal_nodes`] for `field_name` as a child of the element `parent`,
/// so entries scoped to that parent apply.
pub fn marshal_nodes_in(
    value: &WireValue,
    parent: Option<&str>,
    field_name: &str,
    table: &FieldOrderTable,
) -> Vec<XMLNode> {
    match value {
        WireValue::Struct(s) => marshal_struct(s, parent, field_name, table),
        WireValue::Seq(items) => {
            let nodes: Vec<XMLNode> = items
                .iter()
                .flat_map(|item| marshal_nodes_in(item, parent, field_name, table))
                .collect();

            if !field_name.is_empty() && table.is_wrapped_list(field_name) {
                let mut wrapper = Element::new(field_name);
                wrapper.children = nodes;
                vec![XMLNode::Element(wrapper)]
            } else {
                nodes
            }
        }
        WireValue::Nil => {
            if field_name.is_empty() {
                return Vec::new();
            }
            let mut elem = Element::new(field_name);
            elem.attributes
                .insert(XSI_NIL_ATTR.to_string(), "true".to_string());
            vec![XMLNode::Element(elem)]
        }
        WireValue::Scalar(text) => text_nodes(field_name, text.clone()),
        WireValue::Binary(bytes) => text_nodes(field_name, STANDARD.encode(bytes)),
    }
}

fn text_nodes(field_name: &str, text: String) -> Vec<XMLNode> {
    if field_name.is_empty() {
        return vec![XMLNode::Text(text)];
    }
    let mut elem = Element::new(field_name);
    if !text.is_empty() {
        elem.children.push(XMLNode::Text(text));
    }
    vec![XMLNode::Element(elem)]
}

fn marshal_struct(
    s: &WireStruct,
    parent: Option<&str>,
    field_name: &str,
    table: &FieldOrderTable,
) -> Vec<XMLNode> {
    let order = table.order_in(parent, field_name, s.xsi_type());
    if order.is_none() && s.xsi_type().is_some() {
        tracing::trace!(
            element = field_name,
            xsi_type = s.xsi_type(),
            "No declared field order, keeping insertion order"
        );
    }

    let scope = (!field_name.is_empty()).then_some(field_name);
    let children: Vec<XMLNode> = ordered_fields(s, order)
        .into_iter()
        .flat_map(|(name, value)| marshal_nodes_in(value, scope, name, table))
        .collect();

    if field_name.is_empty() {
        return children;
    }

    let mut elem = Element::new(field_name);
    if let Some(xsi_type) = s.xsi_type() {
        elem.attributes
            .insert(XSI_TYPE_ATTR.to_string(), xsi_type.to_string());
    }
    elem.children = children;
    vec![XMLNode::Element(elem)]
}

/// Declared fields first in table order, then undeclared ones in insertion
/// order.
fn ordered_fields<'a>(s: &'a WireStruct, order: Option<&'a [String]>) -> Vec<(&'a str, &'a WireValue)> {
    let Some(order) = order else {
        return s.iter().map(|(k, v)| (k.as_str(), v)).collect();
    };

    let mut fields: Vec<(&str, &WireValue)> = order
        .iter()
        .filter_map(|name| s.get(name).map(|v| (name.as_str(), v)))
        .collect();
    fields.extend(
        s.iter()
            .filter(|(k, _)| !order.iter().any(|o| o == *k))
            .map(|(k, v)| (k.as_str(), v)),
    );
    fields
}

/// Renders nodes without document declaration or indentation.
pub fn nodes_to_string(nodes: &[XMLNode]) -> Result<String, SoapError> {
    let mut out = String::new();
    for node in nodes {
        match node {
            XMLNode::Element(elem) => out.push_str(&element_to_string(elem, false)?),
            XMLNode::Text(text) => out.push_str(&escape(text.as_str())),
            _ => {}
        }
    }
    Ok(out)
}

/// Renders a single element, optionally indented.
pub fn element_to_string(elem: &Element, pretty: bool) -> Result<String, SoapError> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(pretty)
        .indent_string("  ");
    elem.write_with_config(&mut buf, config)?;
    Ok(String::from_utf8(buf)?)
}
