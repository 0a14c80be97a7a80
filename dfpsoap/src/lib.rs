//! # dfpsoap - SOAP messages of the DFP API
//!
//! This crate turns plain wire values into SOAP requests and SOAP responses
//! back into wire values.
//!
//! ## Features
//!
//! - ✅ Wire values with an explicit type discriminator ([`WireValue`], [`WireStruct`])
//! - ✅ Schema element order per API version ([`FieldOrderTable`])
//! - ✅ Marshalling into namespaced XML with `xsi:type` / `xsi:nil`
//! - ✅ Request envelopes with the `RequestHeader` block
//! - ✅ Response unmarshalling and collection restoration
//! - ✅ SOAP Fault parsing (`ApiExceptionFault`)
//!
//! ## Example
//!
//! ```
//! use dfpsoap::{EntityOrder, FieldOrderTable, WireStruct, marshal};
//!
//! let table = FieldOrderTable::new()
//!     .entity("adUnit", EntityOrder::new(["name", "parentId"]));
//! let ad_unit = WireStruct::new()
//!     .with("parentId", "42")
//!     .with("name", "Ad_Unit_1");
//!
//! let xml = marshal(&ad_unit.into(), "adUnit", &table).unwrap();
//! assert_eq!(xml, "<adUnit><name>Ad_Unit_1</name><parentId>42</parentId></adUnit>");
//! ```

mod builder;
mod envelope;
mod error;
mod fault;
mod field_order;
mod marshal;
mod parser;
mod unmarshal;
mod value;

pub use builder::{REQUEST_HEADER, build_soap_request, build_soap_response};
pub use envelope::{SoapBody, SoapEnvelope, SoapHeader};
pub use error::SoapError;
pub use fault::{ApiErrorEntry, FaultDetail, SoapFault, build_soap_fault, parse_soap_fault};
pub use field_order::{EntityOrder, FieldOrderTable};
pub use marshal::{XSI_NIL_ATTR, XSI_TYPE_ATTR, element_to_string, marshal, marshal_nodes, marshal_nodes_in, nodes_to_string};
pub use parser::{
    attribute_value, body_fault, child_text, find_child_with_suffix, operation_response,
    parse_soap_envelope,
};
pub use unmarshal::{restore_collection_type, unmarshal, unmarshal_with};
pub use value::{WireStruct, WireValue, XSI_TYPE_KEY, is_discriminator_key};

/// SOAP 1.1 envelope namespace
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// XML Schema namespace
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace (`xsi:type`, `xsi:nil`)
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Re-export so callers can walk parsed envelopes.
pub use xmltree::{Element, XMLNode};
