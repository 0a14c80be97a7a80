//! SOAP faults returned by the API

use crate::envelope::SoapEnvelope;
use crate::error::SoapError;
use crate::field_order::FieldOrderTable;
use crate::marshal::marshal_nodes;
use crate::parser::{body_fault, child_text, find_child_with_suffix};
use crate::unmarshal::unmarshal;
use crate::value::{WireStruct, WireValue};
use crate::SOAP_ENV_NS;
use xmltree::{Element, XMLNode};

/// SOAP fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// Fault code (e.g. `soap:Server`)
    pub fault_code: String,

    /// Human readable message
    pub fault_string: String,

    /// Content of `detail`, when the server provided one
    pub detail: Option<FaultDetail>,
}

/// Structured part of a fault (`ApiExceptionFault`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultDetail {
    pub code: Option<String>,
    pub message: Option<String>,
    pub errors: Vec<ApiErrorEntry>,
}

/// One entry of `ApiExceptionFault.errors`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrorEntry {
    pub field_path: Option<String>,
    pub trigger: Option<String>,
    pub error_string: Option<String>,
    /// Concrete error type, e.g. `AuthenticationError`
    pub error_type: Option<String>,
    pub reason: Option<String>,
}

impl SoapFault {
    pub fn new(fault_code: impl Into<String>, fault_string: impl Into<String>) -> Self {
        Self {
            fault_code: fault_code.into(),
            fault_string: fault_string.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: FaultDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Key used to classify the fault: `detail.code`, else the type of the
    /// first error.
    pub fn classification_key(&self) -> Option<&str> {
        let detail = self.detail.as_ref()?;
        detail.code.as_deref().or_else(|| {
            detail
                .errors
                .first()
                .and_then(|e| e.error_type.as_deref())
        })
    }

    /// Message best describing the fault.
    pub fn message(&self) -> &str {
        self.detail
            .as_ref()
            .and_then(|d| d.message.as_deref())
            .unwrap_or(&self.fault_string)
    }
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.fault_code, self.message())?;
        if let Some(detail) = &self.detail {
            for error in &detail.errors {
                if let Some(s) = &error.error_string {
                    write!(f, " ({s}")?;
                    if let Some(path) = &error.field_path {
                        write!(f, " @ {path}")?;
                    }
                    write!(f, ")")?;
                }
            }
        }
        Ok(())
    }
}

impl ApiErrorEntry {
    fn from_value(value: &WireValue) -> Self {
        let Some(s) = value.as_struct() else {
            return Self {
                error_string: value.as_str().map(str::to_string),
                ..Self::default()
            };
        };
        let text = |key: &str| s.get_str(key).map(str::to_string);
        Self {
            field_path: text("fieldPath"),
            trigger: text("trigger"),
            error_string: text("errorString"),
            error_type: s.xsi_type().map(str::to_string),
            reason: text("reason"),
        }
    }
}

/// Extracts the fault of a response, if any.
pub fn parse_soap_fault(envelope: &SoapEnvelope) -> Option<SoapFault> {
    let fault = body_fault(envelope)?;
    Some(fault_from_element(fault))
}

fn fault_from_element(fault: &Element) -> SoapFault {
    let fault_code = child_text(fault, "faultcode").unwrap_or_default();
    let fault_string = child_text(fault, "faultstring").unwrap_or_default();

    let detail = find_child_with_suffix(fault, "detail")
        .and_then(|d| d.children.iter().find_map(XMLNode::as_element))
        .map(|payload| {
            let value = unmarshal(payload);
            let s = value.as_struct();
            let text = |key: &str| s.and_then(|s| s.get_str(key)).map(str::to_string);
            FaultDetail {
                code: text("code"),
                message: text("message"),
                errors: s
                    .and_then(|s| s.get("errors"))
                    .cloned()
                    .map(WireValue::into_seq)
                    .unwrap_or_default()
                    .iter()
                    .map(ApiErrorEntry::from_value)
                    .collect(),
            }
        });

    SoapFault {
        fault_code,
        fault_string,
        detail,
    }
}

/// Builds a fault document as the API server returns it.
pub fn build_soap_fault(fault: &SoapFault, namespace: &str) -> Result<String, SoapError> {
    let mut fault_elem = Element::new("soap:Fault");

    let mut faultcode = Element::new("faultcode");
    faultcode
        .children
        .push(XMLNode::Text(fault.fault_code.clone()));
    fault_elem.children.push(XMLNode::Element(faultcode));

    let mut faultstring = Element::new("faultstring");
    faultstring
        .children
        .push(XMLNode::Text(fault.fault_string.clone()));
    fault_elem.children.push(XMLNode::Element(faultstring));

    if let Some(detail) = &fault.detail {
        let mut payload = WireStruct::new();
        if let Some(code) = &detail.code {
            payload.insert("code", code.as_str());
        }
        if let Some(message) = &detail.message {
            payload.insert("message", message.as_str());
        }
        let errors: Vec<WireValue> = detail
            .errors
            .iter()
            .map(|e| {
                let mut s = WireStruct::new();
                s.set_xsi_type(e.error_type.clone());
                for (key, value) in [
                    ("fieldPath", &e.field_path),
                    ("trigger", &e.trigger),
                    ("errorString", &e.error_string),
                    ("reason", &e.reason),
                ] {
                    if let Some(v) = value {
                        s.insert(key, v.as_str());
                    }
                }
                WireValue::Struct(s)
            })
            .collect();
        payload.insert("errors", errors);

        let mut detail_elem = Element::new("detail");
        for node in marshal_nodes(&payload.into(), "ApiExceptionFault", &FieldOrderTable::new()) {
            if let XMLNode::Element(mut e) = node {
                e.attributes
                    .insert("xmlns".to_string(), namespace.to_string());
                detail_elem.children.push(XMLNode::Element(e));
            }
        }
        fault_elem.children.push(XMLNode::Element(detail_elem));
    }

    let mut body = Element::new("soap:Body");
    body.children.push(XMLNode::Element(fault_elem));

    let mut envelope = Element::new("soap:Envelope");
    envelope
        .attributes
        .insert("xmlns:soap".to_string(), SOAP_ENV_NS.to_string());
    envelope
        .attributes
        .insert("xmlns:xsi".to_string(), crate::XSI_NS.to_string());
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf)?)
}
