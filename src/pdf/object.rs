//! PDF object types

use std::borrow::Borrow;
use std::fmt;

use super::{Dictionary, PDFString, Stream};

/// Handle of an object stored in a document arena.
///
/// Identity of dictionaries and streams is the handle, not their content:
/// two equal dictionaries in different slots are different objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// Position of the object in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Object number and generation of an indirect object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectKey {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.generation)
    }
}

/// PDF name object, compared by content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub const TYPE: &'static str = "Type";
    pub const ROOT: &'static str = "Root";
    pub const INFO: &'static str = "Info";
    pub const ENCRYPT: &'static str = "Encrypt";
    pub const SIZE: &'static str = "Size";
    pub const PREV: &'static str = "Prev";
    pub const LENGTH: &'static str = "Length";
    pub const FILTER: &'static str = "Filter";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// PDF object types
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectType {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real value
    Real(f64),
    /// Name object
    Name(Name),
    /// String value (literal or hexadecimal on output)
    String(PDFString),
    /// Array object
    Array(Vec<ObjectType>),
    /// Dictionary object
    Dictionary(Dictionary),
    /// Stream object
    Stream(Stream),
    /// Indirect reference into the document arena
    Reference(ObjectId),
}

impl ObjectType {
    /// Human-readable variant name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectType::Null => "Null",
            ObjectType::Boolean(_) => "Boolean",
            ObjectType::Integer(_) => "Integer",
            ObjectType::Real(_) => "Real",
            ObjectType::Name(_) => "Name",
            ObjectType::String(_) => "String",
            ObjectType::Array(_) => "Array",
            ObjectType::Dictionary(_) => "Dictionary",
            ObjectType::Stream(_) => "Stream",
            ObjectType::Reference(_) => "Reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ObjectType::Null)
    }

    /// Dictionaries and streams are always written as indirect objects
    /// when they appear inside another container.
    pub fn is_container(&self) -> bool {
        matches!(self, ObjectType::Dictionary(_) | ObjectType::Stream(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ObjectType::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value as `f32`; integers are converted, reals narrowed.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ObjectType::Integer(i) => Some(*i as f32),
            ObjectType::Real(r) => Some(*r as f32),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObjectType::Integer(i) => Some(*i as f64),
            ObjectType::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Numeric value as `i32`. Out-of-range values truncate the way `as`
    /// casts do.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ObjectType::Integer(i) => Some(*i as i32),
            ObjectType::Real(r) => Some(*r as i32),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ObjectType::Integer(i) => Some(*i),
            ObjectType::Real(r) => Some(*r as i64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            ObjectType::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PDFString> {
        match self {
            ObjectType::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<ObjectType>> {
        match self {
            ObjectType::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            ObjectType::Dictionary(d) => Some(d),
            ObjectType::Stream(s) => Some(s.dictionary()),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            ObjectType::Dictionary(d) => Some(d),
            ObjectType::Stream(s) => Some(s.dictionary_mut()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            ObjectType::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            ObjectType::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Move nested values out, leaving empty containers behind
    fn take_children(&mut self, out: &mut Vec<ObjectType>) {
        match self {
            ObjectType::Array(items) => out.append(items),
            ObjectType::Dictionary(dictionary) => dictionary.drain_values(out),
            ObjectType::Stream(stream) => stream.dictionary_mut().drain_values(out),
            _ => {}
        }
    }
}

/// Nested values are released from a heap stack, so dropping a value of
/// any depth uses constant call stack.
impl Drop for ObjectType {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.take_children(&mut stack);
        while let Some(mut value) = stack.pop() {
            value.take_children(&mut stack);
        }
    }
}

impl From<bool> for ObjectType {
    fn from(b: bool) -> Self {
        ObjectType::Boolean(b)
    }
}

impl From<i32> for ObjectType {
    fn from(i: i32) -> Self {
        ObjectType::Integer(i as i64)
    }
}

impl From<i64> for ObjectType {
    fn from(i: i64) -> Self {
        ObjectType::Integer(i)
    }
}

impl From<usize> for ObjectType {
    fn from(i: usize) -> Self {
        ObjectType::Integer(i as i64)
    }
}

impl From<f32> for ObjectType {
    fn from(r: f32) -> Self {
        ObjectType::Real(r as f64)
    }
}

impl From<f64> for ObjectType {
    fn from(r: f64) -> Self {
        ObjectType::Real(r)
    }
}

impl From<Name> for ObjectType {
    fn from(n: Name) -> Self {
        ObjectType::Name(n)
    }
}

impl From<PDFString> for ObjectType {
    fn from(s: PDFString) -> Self {
        ObjectType::String(s)
    }
}

impl From<Vec<ObjectType>> for ObjectType {
    fn from(a: Vec<ObjectType>) -> Self {
        ObjectType::Array(a)
    }
}

impl From<Dictionary> for ObjectType {
    fn from(d: Dictionary) -> Self {
        ObjectType::Dictionary(d)
    }
}

impl From<Stream> for ObjectType {
    fn from(s: Stream) -> Self {
        ObjectType::Stream(s)
    }
}

impl From<ObjectId> for ObjectType {
    fn from(id: ObjectId) -> Self {
        ObjectType::Reference(id)
    }
}

/// Arena slot: an object plus the numbering it was loaded with, if any
#[derive(Debug, Clone)]
pub struct PDFObject {
    /// Number and generation carried over from a parsed file
    pub key: Option<ObjectKey>,
    /// Object value
    pub object_type: ObjectType,
}

impl PDFObject {
    /// Create a new object without parsed numbering
    pub fn new(object_type: ObjectType) -> Self {
        Self { key: None, object_type }
    }

    /// Create an object that was loaded as `number generation obj`
    pub fn parsed(key: ObjectKey, object_type: ObjectType) -> Self {
        Self { key: Some(key), object_type }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_log::test;

    #[test]
    fn test_numeric_conversions() {
        let int = ObjectType::Integer(42);
        assert_eq!(int.as_f32(), Some(42.0));
        assert_eq!(int.as_f64(), Some(42.0));
        assert_eq!(int.as_i32(), Some(42));
        assert_eq!(int.as_i64(), Some(42));

        let real = ObjectType::Real(-3.75);
        assert_eq!(real.as_i32(), Some(-3));
        assert_eq!(real.as_i64(), Some(-3));
        assert_eq!(real.as_f32(), Some(-3.75));

        assert_eq!(ObjectType::Null.as_i64(), None);
    }

    #[test]
    fn test_integer_narrowing_truncates() {
        let big = ObjectType::Integer(0x1_0000_0005);
        assert_eq!(big.as_i32(), Some(5));
        assert_eq!(big.as_i64(), Some(0x1_0000_0005));
    }

    #[test]
    fn test_value_equality_for_hash_keys() {
        let mut names = HashSet::new();
        names.insert(Name::from("Type"));
        assert!(names.contains(&Name::new("Type".to_string())));

        let mut strings = HashSet::new();
        strings.insert(PDFString::new(b"abc".to_vec()));
        assert!(strings.contains(&PDFString::from("abc")));

        assert_eq!(ObjectType::Integer(7), ObjectType::Integer(7));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ObjectType::Null.type_name(), "Null");
        assert_eq!(ObjectType::Reference(ObjectId(0)).type_name(), "Reference");
        assert_eq!(ObjectType::from(Dictionary::new()).type_name(), "Dictionary");
    }

    #[test]
    fn test_deeply_nested_values_drop() {
        let mut value = ObjectType::Null;
        for depth in 0..200_000 {
            value = match depth % 3 {
                0 => ObjectType::Array(vec![value, ObjectType::Integer(depth)]),
                1 => [("Next", value)].into_iter().collect::<Dictionary>().into(),
                _ => {
                    let dictionary = [("Next", value)].into_iter().collect();
                    Stream::new(dictionary, Vec::new()).into()
                }
            };
        }
        drop(value);

        let mut dictionary = Dictionary::new();
        for _ in 0..200_000 {
            let mut outer = Dictionary::new();
            outer.set("Inner", dictionary);
            dictionary = outer;
        }
        drop(dictionary);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ObjectKey::new(12, 0).to_string(), "12 0");
        assert_eq!(Name::from("Root").to_string(), "/Root");
        assert!(ObjectKey::new(1, 5) < ObjectKey::new(2, 0));
    }
}
