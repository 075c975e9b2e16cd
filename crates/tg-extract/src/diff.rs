//! Differences between two extractions of the same buffer.

use std::fmt;

use tg_core::Model;

/// Model ids added, removed or changed between two extractions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelDiff {
    /// Ids present only in the newer extraction.
    pub added: Vec<String>,
    /// Ids present only in the older extraction.
    pub removed: Vec<String>,
    /// Ids present in both whose models differ.
    pub changed: Vec<String>,
}

impl ModelDiff {
    /// Compares two model lists by id. Added and changed ids follow the
    /// order of `current`; removed ids follow the order of `previous`.
    #[must_use]
    pub fn between(previous: &[Model], current: &[Model]) -> Self {
        let lookup = |models: &[Model], id: &str| models.iter().position(|m| m.id == id);

        let mut diff = Self::default();
        for model in current {
            match lookup(previous, &model.id) {
                None => diff.added.push(model.id.clone()),
                Some(i) if previous[i] != *model => diff.changed.push(model.id.clone()),
                Some(_) => {}
            }
        }
        diff.removed = previous
            .iter()
            .filter(|model| lookup(current, &model.id).is_none())
            .map(|model| model.id.clone())
            .collect();
        diff
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl fmt::Display for ModelDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no changes");
        }
        let mut first = true;
        for (sign, ids) in [("+", &self.added), ("-", &self.removed), ("~", &self.changed)] {
            for id in ids {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                write!(f, "{sign}{id}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelParser;

    fn models(source: &str) -> Vec<Model> {
        ModelParser::new(source)
            .expect("ModelParser creation failed")
            .get_models()
    }

    #[test]
    fn test_identical_extractions() {
        let a = models("interface A { b: B } interface B {}");
        let diff = ModelDiff::between(&a, &a);
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "no changes");
    }

    #[test]
    fn test_added_removed_changed() {
        let before = models("interface A { b: B } interface B {} interface C {}");
        let after = models("interface A { b: string } interface B {} interface D {}");
        let diff = ModelDiff::between(&before, &after);

        assert_eq!(diff.added, ["D"]);
        assert_eq!(diff.removed, ["C"]);
        // B lost its dependant
        assert_eq!(diff.changed, ["A", "B"]);
        assert_eq!(diff.to_string(), "+D -C ~A ~B");
    }

    #[test]
    fn test_from_empty() {
        let after = models("type A = { a: string };");
        let diff = ModelDiff::between(&[], &after);
        assert_eq!(diff.added, ["A"]);
        assert!(diff.removed.is_empty());
        assert!(!diff.is_empty());
    }
}
