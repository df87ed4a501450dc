//! Attribute writer (C3): tracks the object attributes currently "in
//! force" and emits the minimal `TO`/`TD` diff needed to move from one
//! graphic object's attribute set to the next.

use std::collections::BTreeMap;

use crate::attribute_value::Attribute;

/// Attribute state carried between consecutive graphic objects. Only
/// object attributes (`TO`) are diffed this way; file and aperture
/// attributes are written once, up front.
#[derive(Debug, Default)]
pub struct AttributeWriter {
    current: BTreeMap<String, Attribute>,
}

impl AttributeWriter {
    pub fn new() -> Self {
        AttributeWriter { current: BTreeMap::new() }
    }

    /// Computes the comment lines needed to move the "current" attribute
    /// set to `next`, and updates internal state to match.
    ///
    /// Keys present in `current` but absent from `next` are unset first
    /// (`TD.<key>`); keys that are new or changed are then set (`TO.<key>`).
    /// Unchanged keys emit nothing.
    pub fn diff(&mut self, next: &[Attribute]) -> Vec<String> {
        let mut next_map = BTreeMap::new();
        for attr in next {
            next_map.insert(attr.key().to_string(), attr.clone());
        }

        let mut lines = Vec::new();

        let to_unset: Vec<String> = self
            .current
            .keys()
            .filter(|k| !next_map.contains_key(*k))
            .cloned()
            .collect();
        for key in to_unset {
            lines.push(Attribute::delete(key.clone()).to_gerber_comment());
            self.current.remove(&key);
        }

        for (key, attr) in &next_map {
            let changed = self.current.get(key).map(|cur| cur.values() != attr.values()).unwrap_or(true);
            if changed {
                lines.push(attr.to_gerber_comment());
                self.current.insert(key.clone(), attr.clone());
            }
        }

        lines
    }

    /// Clears all object attributes currently in force, emitting `TD`
    /// (delete-all) if anything was set.
    pub fn clear(&mut self) -> Option<String> {
        if self.current.is_empty() {
            None
        } else {
            self.current.clear();
            Some(Attribute::delete_all().to_gerber_comment())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::attribute_value::{object_component, object_net};

    #[test]
    fn first_call_sets_everything() {
        let mut w = AttributeWriter::new();
        let lines = w.diff(&[object_net("GND")]);
        assert_eq!(lines, vec!["G04 #@! TO.N,GND*\n"]);
    }

    #[test]
    fn unchanged_attribute_emits_nothing() {
        let mut w = AttributeWriter::new();
        w.diff(&[object_net("GND")]);
        let lines = w.diff(&[object_net("GND")]);
        assert!(lines.is_empty());
    }

    #[test]
    fn changed_value_reemits_set() {
        let mut w = AttributeWriter::new();
        w.diff(&[object_net("GND")]);
        let lines = w.diff(&[object_net("VCC")]);
        assert_eq!(lines, vec!["G04 #@! TO.N,VCC*\n"]);
    }

    #[test]
    fn dropped_key_emits_delete() {
        let mut w = AttributeWriter::new();
        w.diff(&[object_net("GND"), object_component("R1")]);
        let lines = w.diff(&[object_net("GND")]);
        assert_eq!(lines, vec!["G04 #@! TD.C*\n"]);
    }
}
