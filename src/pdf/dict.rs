//! PDF dictionary implementation

use indexmap::IndexMap;

use super::{Name, ObjectId, ObjectType, PDFString, Stream};

/// PDF dictionary object. Entries keep insertion order so output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: IndexMap<Name, ObjectType>,
}

impl Dictionary {
    /// Create new dictionary
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create a dictionary with `/Type` set
    pub fn with_type(type_name: &str) -> Self {
        let mut dict = Self::new();
        dict.set(Name::TYPE, Name::from(type_name));
        dict
    }

    /// Get value by key
    pub fn get(&self, key: &str) -> Option<&ObjectType> {
        self.entries.get(key)
    }

    /// Get mutable value by key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ObjectType> {
        self.entries.get_mut(key)
    }

    /// Get integer value
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(ObjectType::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Get numeric value, integer or real
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ObjectType::as_f64)
    }

    /// Get boolean value
    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ObjectType::as_bool)
    }

    /// Get string value
    pub fn get_string(&self, key: &str) -> Option<&PDFString> {
        match self.get(key) {
            Some(ObjectType::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Get name value
    pub fn get_name(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ObjectType::Name(n)) => Some(n.as_str()),
            _ => None,
        }
    }

    /// Get array value
    pub fn get_array(&self, key: &str) -> Option<&Vec<ObjectType>> {
        self.get(key).and_then(ObjectType::as_array)
    }

    /// Get an inline dictionary value
    pub fn get_dictionary(&self, key: &str) -> Option<&Dictionary> {
        match self.get(key) {
            Some(ObjectType::Dictionary(d)) => Some(d),
            _ => None,
        }
    }

    /// Get an inline stream value
    pub fn get_stream(&self, key: &str) -> Option<&Stream> {
        match self.get(key) {
            Some(ObjectType::Stream(s)) => Some(s),
            _ => None,
        }
    }

    /// Get reference value
    pub fn get_reference(&self, key: &str) -> Option<ObjectId> {
        self.get(key).and_then(ObjectType::as_reference)
    }

    /// Set value. Replacing an existing key keeps its position.
    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<ObjectType>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set reference value
    pub fn set_reference(&mut self, key: impl Into<Name>, id: ObjectId) {
        self.set(key, ObjectType::Reference(id));
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<ObjectType> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The `/Type` name, if any
    pub fn type_name(&self) -> Option<&str> {
        self.get_name(Name::TYPE)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> indexmap::map::Iter<'_, Name, ObjectType> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, Name, ObjectType> {
        self.entries.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.entries.keys()
    }

    /// Move every value into `out`, leaving the dictionary empty
    pub(crate) fn drain_values(&mut self, out: &mut Vec<ObjectType>) {
        out.extend(self.entries.drain(..).map(|(_, value)| value));
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Name, &'a ObjectType);
    type IntoIter = indexmap::map::Iter<'a, Name, ObjectType>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<Name>, V: Into<ObjectType>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_getters() {
        let mut dict = Dictionary::with_type("Example");
        dict.set("Subtype", Name::from("DictTest"));
        dict.set("Version", 1.5);
        dict.set("IntItem", 12);
        dict.set("StringItem", PDFString::from("test"));
        dict.set("Flag", true);

        assert_eq!(dict.type_name(), Some("Example"));
        assert_eq!(dict.get_name("Subtype"), Some("DictTest"));
        assert_eq!(dict.get_integer("IntItem"), Some(12));
        assert_eq!(dict.get_number("Version"), Some(1.5));
        assert_eq!(dict.get_string("StringItem").map(PDFString::as_bytes), Some(&b"test"[..]));
        assert_eq!(dict.get_boolean("Flag"), Some(true));
        assert_eq!(dict.get_integer("Missing"), None);
    }

    #[test]
    fn test_nested_dictionary() {
        let nested: Dictionary = [("Key1", ObjectType::from(PDFString::from("Value1"))), ("Key2", 123.into())]
            .into_iter()
            .collect();
        let mut dict = Dictionary::with_type("Test");
        dict.set("Nested", nested);

        let nested = dict.get_dictionary("Nested").expect("nested dictionary");
        assert_eq!(nested.get_integer("Key2"), Some(123));
    }

    #[test]
    fn test_dictionary_references() {
        let mut dict = Dictionary::new();
        dict.set_reference("Ref", ObjectId(4));
        assert_eq!(dict.get_reference("Ref"), Some(ObjectId(4)));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut dict = Dictionary::new();
        dict.set("B", 1);
        dict.set("A", 2);
        dict.set("C", 3);
        dict.set("B", 4);
        dict.remove("A");

        let keys: Vec<&str> = dict.keys().map(Name::as_str).collect();
        assert_eq!(keys, vec!["B", "C"]);
        assert_eq!(dict.get_integer("B"), Some(4));
    }
}
