//! Parsing of SOAP responses

use crate::envelope::{SoapBody, SoapEnvelope, SoapHeader};
use crate::error::SoapError;
use std::io::BufReader;
use xmltree::{Element, XMLNode};

/// Parses a complete SOAP envelope.
pub fn parse_soap_envelope(xml: &[u8]) -> Result<SoapEnvelope, SoapError> {
    let reader = BufReader::new(xml);
    let root = Element::parse(reader)?;

    if !root.name.ends_with("Envelope") {
        return Err(SoapError::MissingEnvelope);
    }

    let header = find_child_with_suffix(&root, "Header").map(|e| SoapHeader { content: e.clone() });

    let body_elem = find_child_with_suffix(&root, "Body").ok_or(SoapError::MissingBody)?;

    Ok(SoapEnvelope {
        header,
        body: SoapBody {
            content: body_elem.clone(),
        },
    })
}

/// Finds the `{operation}Response` element of a successful call.
pub fn operation_response<'a>(
    envelope: &'a SoapEnvelope,
    operation: &str,
) -> Result<&'a Element, SoapError> {
    let expected = format!("{operation}Response");
    find_child_with_suffix(&envelope.body.content, &expected)
        .ok_or(SoapError::MissingResponse(expected))
}

/// Returns the `Fault` element when the body carries one.
pub fn body_fault(envelope: &SoapEnvelope) -> Option<&Element> {
    find_child_with_suffix(&envelope.body.content, "Fault")
}

/// First child element whose (local) name ends with `suffix`.
pub fn find_child_with_suffix<'a>(parent: &'a Element, suffix: &str) -> Option<&'a Element> {
    parent.children.iter().find_map(|node| match node {
        XMLNode::Element(elem) if elem.name.ends_with(suffix) => Some(elem),
        _ => None,
    })
}

/// Trimmed text of the child element named `suffix`, if non-empty.
pub fn child_text(parent: &Element, suffix: &str) -> Option<String> {
    find_child_with_suffix(parent, suffix)
        .and_then(|child| child.get_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Value of an attribute matched on its local name (`type` matches
/// `xsi:type`).
pub fn attribute_value<'a>(elem: &'a Element, local_name: &str) -> Option<&'a str> {
    elem.attributes.iter().find_map(|(key, value)| {
        let key: &str = key.as_ref();
        let local = key.rsplit(':').next().unwrap_or(key);
        (local == local_name).then_some(value.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <ResponseHeader xmlns="https://www.google.com/apis/ads/publisher/v201010">
      <requestId>abc</requestId>
      <responseTime>12</responseTime>
    </ResponseHeader>
  </soap:Header>
  <soap:Body>
    <getAdUnitResponse xmlns="https://www.google.com/apis/ads/publisher/v201010">
      <rval><id>42</id></rval>
    </getAdUnitResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[test]
    fn test_parse_envelope() {
        let envelope = parse_soap_envelope(RESPONSE.as_bytes()).unwrap();
        let header = envelope.header.as_ref().unwrap();
        let response_header = find_child_with_suffix(&header.content, "ResponseHeader").unwrap();
        assert_eq!(child_text(response_header, "requestId").as_deref(), Some("abc"));

        let response = operation_response(&envelope, "getAdUnit").unwrap();
        let rval = find_child_with_suffix(response, "rval").unwrap();
        assert_eq!(child_text(rval, "id").as_deref(), Some("42"));
        assert!(body_fault(&envelope).is_none());
    }

    #[test]
    fn test_missing_response() {
        let envelope = parse_soap_envelope(RESPONSE.as_bytes()).unwrap();
        assert!(matches!(
            operation_response(&envelope, "getOrder"),
            Err(SoapError::MissingResponse(_))
        ));
    }

    #[test]
    fn test_not_an_envelope() {
        let err = parse_soap_envelope(b"<html><body/></html>").unwrap_err();
        assert!(matches!(err, SoapError::MissingEnvelope));
    }
}
