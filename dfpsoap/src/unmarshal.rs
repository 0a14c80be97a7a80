//! Conversion of response elements back into wire values

use crate::field_order::FieldOrderTable;
use crate::parser::attribute_value;
use crate::value::{WireStruct, WireValue};
use indexmap::IndexMap;
use xmltree::{Element, XMLNode};

/// Converts a response element into a [`WireValue`].
///
/// - an element with child elements becomes a struct; children sharing a
///   name are collected into a sequence,
/// - dotted child names (`Creative.Type`) become underscore-joined keys,
/// - `xsi:type` becomes the struct discriminator,
/// - `xsi:nil="true"` becomes [`WireValue::Nil`],
/// - anything else is its text, always kept as a string.
pub fn unmarshal(element: &Element) -> WireValue {
    unmarshal_in(element, None, None)
}

/// [`unmarshal`] that also knows the entities of `table`: an empty element
/// registered as an entity (`<targeting/>`) becomes an empty struct rather
/// than an empty string.
pub fn unmarshal_with(element: &Element, table: &FieldOrderTable) -> WireValue {
    unmarshal_in(element, None, Some(table))
}

fn unmarshal_in(element: &Element, parent: Option<&str>, table: Option<&FieldOrderTable>) -> WireValue {
    if attribute_value(element, "nil").is_some_and(|v| v == "true" || v == "1") {
        return WireValue::Nil;
    }

    let xsi_type = attribute_value(element, "type").map(strip_prefix);
    let children: Vec<&Element> = element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .collect();

    if children.is_empty() {
        let text = element.get_text().map(|t| t.into_owned()).unwrap_or_default();
        if !text.trim().is_empty() {
            return WireValue::Scalar(text);
        }
        return match xsi_type {
            Some(t) => WireValue::Struct(WireStruct::typed(t)),
            None if table.is_some_and(|t| t.is_entity(parent, &element.name)) => {
                WireValue::Struct(WireStruct::new())
            }
            None => WireValue::Scalar(text),
        };
    }

    let mut fields: IndexMap<String, WireValue> = IndexMap::new();
    for child in children {
        let key = child.name.replace('.', "_");
        let value = unmarshal_in(child, Some(element.name.as_str()), table);
        match fields.get_mut(&key) {
            Some(WireValue::Seq(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, WireValue::Nil);
                *existing = WireValue::Seq(vec![first, value]);
            }
            None => {
                fields.insert(key, value);
            }
        }
    }

    // Only `X.Type` elements name a subtype in responses; a plain `type`
    // element is data (`Company.type`).
    let mut s = WireStruct::new();
    for (key, value) in fields {
        if key == "type" {
            s.insert_field(key, value);
        } else {
            s.insert(key, value);
        }
    }
    if let Some(t) = xsi_type {
        s.set_xsi_type(Some(t.to_string()));
    }
    WireValue::Struct(s)
}

fn strip_prefix(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

/// Wraps every value stored under one of `collection_fields` into a
/// one-element sequence unless it already is one, at any depth.
///
/// The SOAP layer cannot tell a single repeated element from a plain one;
/// callers rely on fields such as `results` always being sequences.
/// Applying it twice changes nothing.
pub fn restore_collection_type<S: AsRef<str>>(value: &mut WireValue, collection_fields: &[S]) {
    match value {
        WireValue::Struct(s) => {
            for (key, field) in s.iter_mut() {
                restore_collection_type(field, collection_fields);
                let is_collection = collection_fields.iter().any(|c| c.as_ref() == key.as_str());
                if is_collection && !matches!(field, WireValue::Seq(_)) {
                    let single = std::mem::replace(field, WireValue::Nil);
                    *field = WireValue::Seq(vec![single]);
                }
            }
        }
        WireValue::Seq(items) => {
            for item in items {
                restore_collection_type(item, collection_fields);
            }
        }
        _ => {}
    }
}
