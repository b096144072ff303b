//! Resolution of semantic-id paths through nested elements.
//!
//! A path is a sequence of semantic ids. Step `i` matches elements whose
//! semantic id equals the `i`-th entry; the search descends through the
//! children of matching containers. Non-matching containers are not entered.

use crate::reference::Reference;
use crate::schema::{ElementKind, SubmodelElement};
use crate::{ModelError, ModelResult};
use std::fmt;

/// Dotted idShort path of an element, with `[i]` for unnamed list entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IdShortPath(Vec<String>);

impl IdShortPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(segment.into());
        next
    }

    fn child_of(&self, parent: &SubmodelElement, index: usize, element: &SubmodelElement) -> Self {
        match (parent, element.id_short()) {
            (SubmodelElement::SubmodelElementList(_), _) | (_, None) => {
                self.child(format!("[{index}]"))
            }
            (_, Some(id_short)) => self.child(id_short),
        }
    }
}

impl fmt::Display for IdShortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && !segment.starts_with('[') {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// A single element found by path resolution, with its path from the search root.
#[derive(Debug, Clone)]
pub struct ResolvedElement<'a> {
    pub path: IdShortPath,
    pub element: &'a SubmodelElement,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticIdPath {
    steps: Vec<Reference>,
}

impl SemanticIdPath {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn semantic_id(mut self, reference: Reference) -> Self {
        self.steps.push(reference);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All elements below `root` (exclusive) that match the full path and kind.
    pub fn resolve<'a>(
        &self,
        root_path: &IdShortPath,
        elements: &'a [SubmodelElement],
        kind: ElementKind,
    ) -> Vec<ResolvedElement<'a>> {
        let mut out = Vec::new();
        if let Some(first) = self.steps.first() {
            for element in elements {
                let path = match element.id_short() {
                    Some(id_short) => root_path.child(id_short),
                    None => root_path.child("?"),
                };
                self.walk(first, 0, &path, element, kind, &mut out);
            }
        }
        out
    }

    /// Exactly one element must match, otherwise `NotFound`/`Ambiguous`.
    pub fn resolve_unique<'a>(
        &self,
        root_path: &IdShortPath,
        elements: &'a [SubmodelElement],
        kind: ElementKind,
    ) -> ModelResult<ResolvedElement<'a>> {
        let mut matches = self.resolve(root_path, elements, kind);
        match matches.len() {
            0 => Err(ModelError::NotFound {
                what: format!("{self} ({kind:?})"),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(ModelError::Ambiguous {
                what: format!("{self} ({kind:?})"),
                count,
            }),
        }
    }

    fn walk<'a>(
        &self,
        step: &Reference,
        depth: usize,
        path: &IdShortPath,
        element: &'a SubmodelElement,
        kind: ElementKind,
        out: &mut Vec<ResolvedElement<'a>>,
    ) {
        let matches = element
            .semantic_id()
            .map(|id| id.semantically_equals(step))
            .unwrap_or(false);
        if !matches {
            return;
        }
        if depth + 1 == self.steps.len() {
            if element.kind() == kind {
                out.push(ResolvedElement {
                    path: path.clone(),
                    element,
                });
            }
            return;
        }
        let next = &self.steps[depth + 1];
        for (index, child) in element.children().iter().enumerate() {
            let child_path = path.child_of(element, index, child);
            self.walk(next, depth + 1, &child_path, child, kind, out);
        }
    }
}

impl fmt::Display for SemanticIdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", parts.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ElementCollection, File};

    fn file(id_short: &str, semantic: &str, value: &str) -> SubmodelElement {
        SubmodelElement::File(File {
            id_short: id_short.to_string(),
            semantic_id: Some(Reference::global(semantic)),
            content_type: None,
            value: Some(value.to_string()),
        })
    }

    fn collection(id_short: &str, semantic: &str, value: Vec<SubmodelElement>) -> SubmodelElement {
        SubmodelElement::SubmodelElementCollection(ElementCollection {
            id_short: Some(id_short.to_string()),
            semantic_id: Some(Reference::global(semantic)),
            qualifiers: vec![],
            value,
        })
    }

    fn path() -> SemanticIdPath {
        SemanticIdPath::builder()
            .semantic_id(Reference::global("urn:a"))
            .semantic_id(Reference::global("urn:b"))
    }

    #[test]
    fn resolves_single_nested_file() {
        let elements = vec![collection("A", "urn:a", vec![file("B", "urn:b", "/x.bin")])];
        let found = path()
            .resolve_unique(&IdShortPath::new(), &elements, ElementKind::File)
            .unwrap();
        assert_eq!(found.path.to_string(), "A.B");
    }

    #[test]
    fn reports_ambiguity_and_absence() {
        let elements = vec![collection(
            "A",
            "urn:a",
            vec![file("B1", "urn:b", "/1"), file("B2", "urn:b", "/2")],
        )];
        let err = path()
            .resolve_unique(&IdShortPath::new(), &elements, ElementKind::File)
            .unwrap_err();
        assert!(matches!(err, ModelError::Ambiguous { count: 2, .. }));

        let err = path()
            .resolve_unique(&IdShortPath::new(), &[], ElementKind::File)
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn kind_mismatch_is_not_a_match() {
        let elements = vec![collection("A", "urn:a", vec![collection("B", "urn:b", vec![])])];
        assert!(path()
            .resolve(&IdShortPath::new(), &elements, ElementKind::File)
            .is_empty());
    }

    #[test]
    fn list_entries_use_index_segments() {
        let p = IdShortPath::new().child("list").child("[2]").child("x");
        assert_eq!(p.to_string(), "list[2].x");
    }
}
