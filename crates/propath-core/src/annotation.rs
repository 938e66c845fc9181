//! Annotations attached to classes and methods

/// Column name override for a property
pub const COLUMN_NAME: &str = "column_name";

/// Contract produces immutable values through a builder
pub const IMMUTABLE: &str = "immutable";

/// Contract produces modifiable values through a builder
pub const MODIFIABLE: &str = "modifiable";

/// Single annotation: a kind tag and an optional string value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation kind
    pub kind: String,
    /// Optional value
    pub value: Option<String>,
}

impl Annotation {
    /// Annotation with a value
    pub fn new(kind: impl Into<String>, value: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            value,
        }
    }

    /// `column_name` override
    pub fn column_name(name: impl Into<String>) -> Self {
        Self::new(COLUMN_NAME, Some(name.into()))
    }

    /// `immutable` contract tag
    pub fn immutable() -> Self {
        Self::new(IMMUTABLE, None)
    }

    /// `modifiable` contract tag
    pub fn modifiable() -> Self {
        Self::new(MODIFIABLE, None)
    }
}

/// Ordered annotation list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// First annotation of the given kind
    pub fn find(&self, kind: &str) -> Option<&Annotation> {
        self.0.iter().find(|a| a.kind == kind)
    }

    /// Value of the first annotation of the given kind
    pub fn value_of(&self, kind: &str) -> Option<&str> {
        self.find(kind).and_then(|a| a.value.as_deref())
    }

    /// Whether an annotation of the given kind is present
    pub fn has(&self, kind: &str) -> bool {
        self.find(kind).is_some()
    }

    /// Append an annotation
    pub fn push(&mut self, annotation: Annotation) {
        self.0.push(annotation);
    }

    /// Append every annotation of `other`
    pub fn extend(&mut self, other: &Annotations) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }

    /// Number of annotations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_wins() {
        let annotations: Annotations = vec![
            Annotation::column_name("first"),
            Annotation::column_name("second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(annotations.value_of(COLUMN_NAME), Some("first"));
        assert!(!annotations.has(IMMUTABLE));
    }

    #[test]
    fn test_extend() {
        let mut a = Annotations::new();
        a.push(Annotation::immutable());
        let mut b = Annotations::new();
        b.push(Annotation::modifiable());
        a.extend(&b);

        assert_eq!(a.len(), 2);
        assert!(a.has(MODIFIABLE));
        assert_eq!(a.value_of(IMMUTABLE), None);
    }
}
