//! Class name parsing: internal (`java/util/Map$Entry`) to Java dotted
//! form, with package/simple/enclosing splitting (§4.3).

use std::fmt;

/// A JVM internal class name, decomposed into the pieces the renderer and
/// type lattice need.
///
/// # Examples
///
/// ```
/// use jclass_core::qualified_name::QualifiedName;
///
/// let q = QualifiedName::parse("java/util/Map$Entry");
/// assert_eq!(q.package(), Some("java.util"));
/// assert_eq!(q.simple_name(), "Entry");
/// assert_eq!(q.enclosing().as_deref(), Some("java.util.Map"));
/// assert!(!q.is_anonymous());
///
/// let anon = QualifiedName::parse("com/example/Foo$1");
/// assert!(anon.is_anonymous());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// The original internal name, e.g. `java/util/Map$Entry`.
    internal: String,
    /// Index of the last `/`, if any.
    package_split: Option<usize>,
    /// Index of the last `$`, if any (after `package_split`).
    enclosing_split: Option<usize>,
}

impl QualifiedName {
    pub fn parse(internal: impl Into<String>) -> Self {
        let internal = internal.into();
        let package_split = internal.rfind('/');
        let tail_start = package_split.map(|i| i + 1).unwrap_or(0);
        let enclosing_split = internal[tail_start..]
            .rfind('$')
            .map(|i| i + tail_start);
        Self {
            internal,
            package_split,
            enclosing_split,
        }
    }

    /// Dotted package name, e.g. `java.util`. `None` for the default
    /// package.
    pub fn package(&self) -> Option<&str> {
        self.package_split.map(|i| &self.internal[..i])
    }

    /// The portion after the package (may still contain `$`).
    fn unqualified(&self) -> &str {
        match self.package_split {
            Some(i) => &self.internal[i + 1..],
            None => &self.internal,
        }
    }

    /// The simple (non-enclosing) name, e.g. `Entry` for
    /// `java/util/Map$Entry`, or `Foo` for `com/example/Foo`.
    pub fn simple_name(&self) -> &str {
        match self.enclosing_split {
            Some(i) => &self.internal[i + 1..],
            None => self.unqualified(),
        }
    }

    /// Dotted enclosing-class name, if this is a member/inner/anonymous
    /// class, e.g. `java.util.Map`.
    pub fn enclosing(&self) -> Option<String> {
        self.enclosing_split.map(|i| {
            let start = self.package_split.map(|p| p + 1).unwrap_or(0);
            self.internal[start..i].replace('/', ".")
        })
    }

    /// A purely-numeric simple name marks the class anonymous (§4.3).
    pub fn is_anonymous(&self) -> bool {
        self.enclosing_split.is_some()
            && !self.simple_name().is_empty()
            && self.simple_name().bytes().all(|b| b.is_ascii_digit())
    }

    /// Full dotted name, e.g. `java.util.Map.Entry`.
    pub fn dotted(&self) -> String {
        self.internal.replace(['/', '$'], ".")
    }

    /// Name as it appears in the constant pool / descriptors, e.g.
    /// `java/util/Map$Entry`.
    pub fn internal(&self) -> &str {
        &self.internal
    }

    /// The binary name with dots for package separators but `$` kept for
    /// nesting, e.g. `java.util.Map$Entry` — what `Class.getName()`
    /// returns, and what the renderer uses before import-shortening.
    pub fn binary_name(&self) -> String {
        match self.package_split {
            Some(i) => format!("{}.{}", self.internal[..i].replace('/', "."), &self.internal[i + 1..]),
            None => self.internal.clone(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_name())
    }
}
