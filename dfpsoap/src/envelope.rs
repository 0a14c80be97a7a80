//! SOAP envelope structures

use xmltree::Element;

/// Complete SOAP envelope
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// Optional SOAP header
    pub header: Option<SoapHeader>,

    /// Body holding the operation, its response or a fault
    pub body: SoapBody,
}

/// SOAP header
#[derive(Debug, Clone)]
pub struct SoapHeader {
    /// Raw XML content of the header
    pub content: Element,
}

/// SOAP body
#[derive(Debug, Clone)]
pub struct SoapBody {
    /// Raw XML content of the body
    pub content: Element,
}

impl SoapEnvelope {
    /// First element inside the body.
    pub fn body_element(&self) -> Option<&Element> {
        self.body.content.children.iter().find_map(|n| n.as_element())
    }
}
