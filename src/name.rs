//! Pluggable element names.
//!
//! A [`Naming`] strategy converts between the `(namespace, prefix, local)`
//! triple carried by the token stream and whatever name type the caller wants
//! to work with. [`Local`] keeps only the local part, [`Qualified`] keeps all
//! three as a [`QName`].

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::sax::{is_name, is_nc_name};

/// Borrowed view of a name as the token stream sees it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NameParts<'a> {
    pub namespace: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub local: &'a str,
}

impl<'a> NameParts<'a> {
    pub fn local(local: &'a str) -> NameParts<'a> {
        NameParts {
            namespace: None,
            prefix: None,
            local,
        }
    }
}

pub trait Naming {
    type Name: Clone + fmt::Debug;

    fn make_name(
        &self,
        namespace: Option<&str>,
        prefix: Option<&str>,
        local: &str,
    ) -> Result<Self::Name>;

    fn parts<'a>(&self, name: &'a Self::Name) -> NameParts<'a>;

    fn matches(&self, a: &Self::Name, b: &Self::Name) -> bool;

    /// Checks that a name handed in by a caller can be written out.
    fn validate(&self, name: &Self::Name) -> Result<()> {
        let parts = self.parts(name);
        check_local(parts.local, is_name)?;
        if let Some(prefix) = parts.prefix {
            check_local(prefix, is_nc_name)?;
        }
        Ok(())
    }
}

/// Namespace-oblivious names: a plain `String` holding the local part.
#[derive(Clone, Copy, Debug, Default)]
pub struct Local;

impl Naming for Local {
    type Name = String;

    fn make_name(&self, _: Option<&str>, _: Option<&str>, local: &str) -> Result<String> {
        check_local(local, is_name)?;
        Ok(local.to_owned())
    }

    fn parts<'a>(&self, name: &'a String) -> NameParts<'a> {
        NameParts::local(name)
    }

    fn matches(&self, a: &String, b: &String) -> bool {
        a == b
    }
}

/// Namespace-aware names, see [`QName`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Qualified;

impl Naming for Qualified {
    type Name = QName;

    fn make_name(
        &self,
        namespace: Option<&str>,
        prefix: Option<&str>,
        local: &str,
    ) -> Result<QName> {
        check_local(local, is_nc_name)?;
        let prefix = non_empty(prefix);
        if let Some(prefix) = prefix {
            check_local(prefix, is_nc_name)?;
        }
        Ok(QName {
            namespace: non_empty(namespace).map(str::to_owned),
            local: local.to_owned(),
            prefix: prefix.map(str::to_owned),
        })
    }

    fn parts<'a>(&self, name: &'a QName) -> NameParts<'a> {
        NameParts {
            namespace: name.namespace(),
            prefix: name.prefix(),
            local: name.local(),
        }
    }

    fn matches(&self, a: &QName, b: &QName) -> bool {
        a == b
    }

    fn validate(&self, name: &QName) -> Result<()> {
        check_local(name.local(), is_nc_name)?;
        if let Some(prefix) = name.prefix() {
            check_local(prefix, is_nc_name)?;
        }
        Ok(())
    }
}

fn check_local(text: &str, lexical: fn(&str) -> bool) -> Result<()> {
    if text.is_empty() {
        return Err(Error::invalid_name(text, "local part must not be empty"));
    }
    if !lexical(text) {
        return Err(Error::invalid_name(text, "not a valid XML name"));
    }
    Ok(())
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// Namespace-qualified name.
///
/// Identity is the namespace and the local part. The prefix is only a
/// serialization hint and takes no part in `Eq` or `Hash`.
#[derive(Clone, Debug)]
pub struct QName {
    namespace: Option<String>,
    local: String,
    prefix: Option<String>,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> QName {
        QName {
            namespace: non_empty(namespace).map(str::to_owned),
            local: local.to_owned(),
            prefix: None,
        }
    }

    pub fn local_only(local: &str) -> QName {
        QName::new(None, local)
    }

    pub fn with_prefix(namespace: &str, local: &str, prefix: &str) -> QName {
        QName {
            namespace: non_empty(Some(namespace)).map(str::to_owned),
            local: local.to_owned(),
            prefix: non_empty(Some(prefix)).map(str::to_owned),
        }
    }

    /// Parses `prefix:local` or `local` against an explicit namespace.
    pub fn parse(namespace: Option<&str>, qualified: &str) -> Result<QName> {
        let (prefix, local) = match qualified.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qualified),
        };
        Qualified.make_name(namespace, prefix, local)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &QName) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

// Clark notation
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Attribute key: a bare local name or a qualified one.
///
/// On read a bare name matches any attribute with that local part whatever
/// its namespace; a qualified name matches namespace and local part.
#[derive(Clone, Copy, Debug)]
pub enum AttrName<'a> {
    Local(&'a str),
    Qualified(&'a QName),
}

impl<'a> AttrName<'a> {
    pub fn parts(&self) -> NameParts<'a> {
        match *self {
            AttrName::Local(local) => NameParts::local(local),
            AttrName::Qualified(name) => NameParts {
                namespace: name.namespace(),
                prefix: name.prefix(),
                local: name.local(),
            },
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            AttrName::Local(local) => check_local(local, is_name),
            AttrName::Qualified(name) => Qualified.validate(name),
        }
    }

    pub(crate) fn matches(&self, candidate: NameParts<'_>) -> bool {
        match *self {
            AttrName::Local(local) => candidate.local == local,
            AttrName::Qualified(name) => {
                candidate.local == name.local() && candidate.namespace == name.namespace()
            }
        }
    }
}

impl<'a> From<&'a str> for AttrName<'a> {
    fn from(local: &'a str) -> AttrName<'a> {
        AttrName::Local(local)
    }
}

impl<'a> From<&'a String> for AttrName<'a> {
    fn from(local: &'a String) -> AttrName<'a> {
        AttrName::Local(local)
    }
}

impl<'a> From<&'a QName> for AttrName<'a> {
    fn from(name: &'a QName) -> AttrName<'a> {
        AttrName::Qualified(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn local_ignores_namespace_and_prefix() {
        let name = Local.make_name(Some("urn:a"), Some("a"), "foo").unwrap();
        assert_eq!(name, "foo");
        assert_eq!(Local.parts(&name), NameParts::local("foo"));
    }

    #[test]
    fn empty_local_part_is_rejected() {
        assert!(matches!(
            Local.make_name(None, None, ""),
            Err(Error::InvalidName { .. })
        ));
        assert!(matches!(
            Qualified.make_name(Some("u"), Some("p"), ""),
            Err(Error::InvalidName { .. })
        ));
    }

    #[test]
    fn qualified_rejects_colon_in_local_part() {
        assert!(Local.make_name(None, None, "a:b").is_ok());
        assert!(matches!(
            Qualified.make_name(None, None, "a:b"),
            Err(Error::InvalidName { .. })
        ));
    }

    #[test]
    fn qname_identity_excludes_prefix() {
        let a = QName::with_prefix("u", "bar", "p");
        let b = QName::with_prefix("u", "bar", "q");
        let c = QName::new(Some("v"), "bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Qualified.matches(&a, &b));

        let set: HashSet<QName> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn qname_parse_and_display() {
        let name = QName::parse(Some("urn:books"), "fp:book").unwrap();
        assert_eq!(name.prefix(), Some("fp"));
        assert_eq!(name.local(), "book");
        assert_eq!(name.to_string(), "{urn:books}book");
        assert_eq!(QName::new(Some(""), "x").namespace(), None);
    }

    #[test]
    fn attr_name_matching() {
        let qualified = QName::new(Some("urn:x"), "id");
        let parts = NameParts {
            namespace: Some("urn:x"),
            prefix: Some("x"),
            local: "id",
        };
        assert!(AttrName::from("id").matches(parts));
        assert!(AttrName::from(&qualified).matches(parts));
        assert!(!AttrName::from(&qualified).matches(NameParts::local("id")));
    }
}
