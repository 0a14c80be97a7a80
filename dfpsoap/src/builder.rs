//! Construction of SOAP request and response documents

use crate::error::SoapError;
use crate::field_order::FieldOrderTable;
use crate::marshal::{marshal_nodes, marshal_nodes_in};
use crate::value::WireValue;
use crate::{SOAP_ENV_NS, XSD_NS, XSI_NS};
use xmltree::{Element, XMLNode};

/// Element name of the authentication header block.
pub const REQUEST_HEADER: &str = "RequestHeader";

fn build_soap_envelope(header_child: Option<Element>, body_child: Element) -> Result<String, SoapError> {
    let mut envelope = Element::new("soapenv:Envelope");
    envelope
        .attributes
        .insert("xmlns:soapenv".to_string(), SOAP_ENV_NS.to_string());
    envelope
        .attributes
        .insert("xmlns:xsd".to_string(), XSD_NS.to_string());
    envelope
        .attributes
        .insert("xmlns:xsi".to_string(), XSI_NS.to_string());

    if let Some(child) = header_child {
        let mut header = Element::new("soapenv:Header");
        header.children.push(XMLNode::Element(child));
        envelope.children.push(XMLNode::Element(header));
    }

    let mut body = Element::new("soapenv:Body");
    body.children.push(XMLNode::Element(body_child));
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new().write_document_declaration(true);
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf)?)
}

fn namespaced(name: &str, namespace: &str) -> Element {
    let mut elem = Element::new(name);
    elem.attributes
        .insert("xmlns".to_string(), namespace.to_string());
    elem
}

/// Builds the SOAP request for one API operation.
///
/// # Arguments
///
/// * `namespace` - API namespace, e.g. `https://www.google.com/apis/ads/publisher/v201010`
/// * `header` - `RequestHeader` fields, omitted when `None`
/// * `operation` - operation name, e.g. `getAdUnitsByStatement`
/// * `params` - named parameters, in schema order
/// * `table` - field orders of the API version
pub fn build_soap_request(
    namespace: &str,
    header: Option<&WireValue>,
    operation: &str,
    params: &[(String, WireValue)],
    table: &FieldOrderTable,
) -> Result<String, SoapError> {
    let header_elem = header.map(|h| {
        let mut elem = namespaced(REQUEST_HEADER, namespace);
        if let Some(XMLNode::Element(marshalled)) =
            marshal_nodes(h, REQUEST_HEADER, table).into_iter().next()
        {
            elem.children = marshalled.children;
        }
        elem
    });

    let mut request_elem = namespaced(operation, namespace);
    for (name, value) in params {
        request_elem
            .children
            .extend(marshal_nodes_in(value, Some(operation), name, table));
    }

    build_soap_envelope(header_elem, request_elem)
}

/// Builds the SOAP response of an operation, its result under `rval`.
pub fn build_soap_response(
    namespace: &str,
    operation: &str,
    rval: Option<&WireValue>,
    table: &FieldOrderTable,
) -> Result<String, SoapError> {
    let mut response_elem = namespaced(&format!("{operation}Response"), namespace);
    if let Some(value) = rval {
        response_elem
            .children
            .extend(marshal_nodes(value, "rval", table));
    }

    build_soap_envelope(None, response_elem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_order::EntityOrder;
    use crate::value::WireStruct;

    const NS: &str = "https://www.google.com/apis/ads/publisher/v201010";

    #[test]
    fn test_build_request() {
        let table = FieldOrderTable::new().entity(
            REQUEST_HEADER,
            EntityOrder::new(["authToken", "networkCode", "applicationName"]),
        );
        let header = WireStruct::new()
            .with("applicationName", "demo")
            .with("authToken", "tok");

        let xml = build_soap_request(
            NS,
            Some(&header.into()),
            "getAdUnit",
            &[("adUnitId".to_string(), "42".into())],
            &table,
        )
        .unwrap();

        assert!(xml.contains("<soapenv:Header>"));
        assert!(xml.contains("<authToken>tok</authToken><applicationName>demo</applicationName>"));
        assert!(xml.contains("<adUnitId>42</adUnitId>"));
        assert!(xml.contains(&format!("xmlns=\"{NS}\"")));
        assert!(xml.contains("xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\""));
    }

    #[test]
    fn test_build_request_without_header() {
        let xml = build_soap_request(NS, None, "getCurrentNetwork", &[], &FieldOrderTable::new())
            .unwrap();
        assert!(!xml.contains("Header"));
        assert!(xml.contains("getCurrentNetwork"));
    }

    #[test]
    fn test_build_response() {
        let rval = WireStruct::new().with("id", "7");
        let xml = build_soap_response(NS, "getAdUnit", Some(&rval.into()), &FieldOrderTable::new())
            .unwrap();
        assert!(xml.contains("getAdUnitResponse"));
        assert!(xml.contains("<rval><id>7</id></rval>"));
    }
}
