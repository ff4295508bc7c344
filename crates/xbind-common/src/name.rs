//! Namespace-qualified XML names.

use std::fmt;

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` declaration pseudo-attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// An XML name: an optional namespace URI plus a local name.
///
/// An empty namespace URI is normalized to "no namespace", so `XmlName::new("", "Id")`
/// and `XmlName::local("Id")` compare equal.
///
/// Names convert from strings in Clark notation:
///
/// ```
/// use xbind_common::XmlName;
///
/// let name = XmlName::from("{http://test.com}Person");
/// assert_eq!(name.namespace_uri(), Some("http://test.com"));
/// assert_eq!(name.local_name(), "Person");
///
/// let plain = XmlName::from("Id");
/// assert_eq!(plain.namespace_uri(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmlName {
    namespace: Option<String>,
    local_name: String,
}

impl XmlName {
    /// Create a namespace-qualified name.
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: if namespace.is_empty() { None } else { Some(namespace) },
            local_name: local_name.into(),
        }
    }

    /// Create a name without a namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Parse a name in Clark notation (`{namespace}local`). Anything else is taken
    /// as a local name.
    pub fn parse_clark(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('{') {
            if let Some((namespace, local_name)) = rest.split_once('}') {
                return Self::new(namespace, local_name);
            }
        }
        Self::local(text)
    }

    /// The namespace URI, if any.
    #[inline]
    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The local part of the name.
    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Whether the name is namespace-qualified.
    #[inline]
    pub fn has_namespace(&self) -> bool {
        self.namespace.is_some()
    }

    /// Return a copy of this name in another namespace.
    pub fn in_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(namespace, self.local_name.clone())
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl From<&str> for XmlName {
    fn from(text: &str) -> Self {
        Self::parse_clark(text)
    }
}

impl From<String> for XmlName {
    fn from(text: String) -> Self {
        Self::parse_clark(&text)
    }
}

impl From<&XmlName> for XmlName {
    fn from(name: &XmlName) -> Self {
        name.clone()
    }
}

impl From<(&str, &str)> for XmlName {
    fn from((namespace, local_name): (&str, &str)) -> Self {
        Self::new(namespace, local_name)
    }
}

/// An XML namespace URI used to mint qualified names.
///
/// ```
/// use xbind_common::Namespace;
///
/// let ns = Namespace::new("http://test.com");
/// let name = ns.name("Address");
/// assert_eq!(name.to_string(), "{http://test.com}Address");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace from its URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The namespace URI.
    #[inline]
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// A name with the given local part in this namespace.
    pub fn name(&self, local_name: impl Into<String>) -> XmlName {
        XmlName::new(self.0.clone(), local_name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_namespace_is_no_namespace() {
        assert_eq!(XmlName::new("", "Id"), XmlName::local("Id"));
        assert!(!XmlName::new("", "Id").has_namespace());
    }

    #[test]
    fn test_clark_notation() {
        let name = XmlName::from("{http://test.com}Person");
        assert_eq!(name.namespace_uri(), Some("http://test.com"));
        assert_eq!(name.local_name(), "Person");
        assert_eq!(name.to_string(), "{http://test.com}Person");

        // An unterminated brace is not Clark notation.
        let odd = XmlName::from("{broken");
        assert_eq!(odd.namespace_uri(), None);
        assert_eq!(odd.local_name(), "{broken");
    }

    #[test]
    fn test_namespace_mints_names() {
        let ns = Namespace::new("http://test.com");
        assert_eq!(ns.name("Person"), XmlName::new("http://test.com", "Person"));
        assert_ne!(ns.name("Person"), XmlName::local("Person"));
    }
}
