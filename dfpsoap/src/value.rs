//! Plain data exchanged with the SOAP layer
//!
//! A [`WireValue`] is what callers hand to the marshaller and what the
//! unmarshaller gives back: scalars are always strings, structs keep their
//! insertion order and carry an explicit type discriminator.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Key under which the discriminator appears when a struct is flattened.
pub const XSI_TYPE_KEY: &str = "xsi_type";

/// Returns true for keys that name the concrete subtype of a struct
/// (`type`, `xsi_type`, `Foo_Type`, `Foo.Type`).
pub fn is_discriminator_key(key: &str) -> bool {
    key == "type" || key == XSI_TYPE_KEY || key.ends_with("_Type") || key.ends_with(".Type")
}

/// A value as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Text content. Identifiers and amounts stay textual.
    Scalar(String),
    /// A complex element.
    Struct(WireStruct),
    /// A repeated element.
    Seq(Vec<WireValue>),
    /// Raw bytes, sent as `xsd:base64Binary`.
    Binary(Vec<u8>),
    /// An explicitly absent value (`xsi:nil`).
    Nil,
}

/// Ordered set of named fields plus the optional concrete subtype.
///
/// The discriminator is decided when the struct is built: inserting a
/// scalar under a discriminator key sets it instead of adding a field, so a
/// struct never holds its own type as a child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireStruct {
    xsi_type: Option<String>,
    fields: IndexMap<String, WireValue>,
}

impl WireStruct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty struct of the given concrete subtype.
    pub fn typed(xsi_type: impl Into<String>) -> Self {
        Self {
            xsi_type: Some(xsi_type.into()),
            fields: IndexMap::new(),
        }
    }

    /// Builder form of [`WireStruct::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a field, routing discriminator keys to the subtype.
    ///
    /// `xsi_type` always wins; `type` and `*_Type` keys only set the
    /// subtype when none is known yet.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Option<WireValue> {
        let key = key.into();
        let value = value.into();

        if is_discriminator_key(&key) {
            if let WireValue::Scalar(name) = &value {
                if key == XSI_TYPE_KEY || self.xsi_type.is_none() {
                    self.xsi_type = Some(name.clone());
                }
                return None;
            }
        }

        self.fields.insert(key, value)
    }

    /// Inserts a field as is, even under a discriminator key.
    ///
    /// Used for entities with a real `type` element (`Company.type`).
    pub fn insert_field(&mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Option<WireValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder form of [`WireStruct::insert_field`].
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Self {
        self.insert_field(key, value);
        self
    }

    pub fn xsi_type(&self) -> Option<&str> {
        self.xsi_type.as_deref()
    }

    pub fn set_xsi_type(&mut self, xsi_type: Option<String>) {
        self.xsi_type = xsi_type;
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut WireValue> {
        self.fields.get_mut(key)
    }

    /// Text of a scalar field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(WireValue::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<WireValue> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &IndexMap<String, WireValue> {
        &self.fields
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, WireValue> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, WireValue> {
        self.fields.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, WireValue)> for WireStruct {
    fn from_iter<I: IntoIterator<Item = (K, WireValue)>>(iter: I) -> Self {
        let mut s = WireStruct::new();
        for (k, v) in iter {
            s.insert(k, v);
        }
        s
    }
}

impl WireValue {
    pub fn scalar(text: impl Into<String>) -> Self {
        WireValue::Scalar(text.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&WireStruct> {
        match self {
            WireValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut WireStruct> {
        match self {
            WireValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, WireValue::Nil)
    }

    /// Field of a struct value.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.as_struct().and_then(|s| s.get(key))
    }

    /// Views the value as a list: a sequence as is, `Nil` as empty,
    /// anything else as a single item.
    pub fn into_seq(self) -> Vec<WireValue> {
        match self {
            WireValue::Seq(items) => items,
            WireValue::Nil => Vec::new(),
            other => vec![other],
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Scalar(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Scalar(value)
    }
}

impl From<&String> for WireValue {
    fn from(value: &String) -> Self {
        WireValue::Scalar(value.clone())
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Scalar(value.to_string())
    }
}

macro_rules! impl_numeric_wire_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for WireValue {
                fn from(value: $t) -> Self {
                    WireValue::Scalar(value.to_string())
                }
            }
        )*
    };
}

impl_numeric_wire_value!(i32, i64, u16, u32, u64, usize, f64);

impl From<WireStruct> for WireValue {
    fn from(value: WireStruct) -> Self {
        WireValue::Struct(value)
    }
}

impl<T: Into<WireValue>> From<Vec<T>> for WireValue {
    fn from(value: Vec<T>) -> Self {
        WireValue::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<WireValue>> From<Option<T>> for WireValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(WireValue::Nil)
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Scalar(s) => serializer.serialize_str(s),
            WireValue::Struct(s) => s.serialize(serializer),
            WireValue::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            WireValue::Binary(bytes) => serializer.serialize_bytes(bytes),
            WireValue::Nil => serializer.serialize_none(),
        }
    }
}

impl Serialize for WireStruct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.xsi_type.is_some());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        if let Some(t) = &self.xsi_type {
            map.serialize_entry(XSI_TYPE_KEY, t)?;
        }
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
