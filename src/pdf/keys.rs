//! Object number assignment for one write pass

use std::collections::HashMap;

use log::{trace, warn};

use crate::error::{PDFError, PDFResult};
use super::{ObjectId, ObjectKey};

/// Maps arena objects to the keys they are written under.
///
/// Numbers start at 1 and grow in first-encountered order. Keys seeded from
/// parsed objects are kept, and the counter starts past the largest one.
#[derive(Debug, Default)]
pub struct ObjectKeyRegistry {
    keys: HashMap<ObjectId, ObjectKey>,
    claimed: HashMap<u32, ObjectId>,
    last_number: u32,
}

impl ObjectKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key an object already carries. Returns false, leaving the
    /// object unseeded, when another object already claimed the number.
    pub fn seed(&mut self, id: ObjectId, key: ObjectKey) -> bool {
        if let Some(owner) = self.claimed.get(&key.number) {
            if *owner != id {
                warn!("Object {} also claims key {} held by {}, renumbering it", id, key, owner);
                return false;
            }
        }
        if let Some(previous) = self.keys.insert(id, key) {
            self.claimed.remove(&previous.number);
        }
        self.claimed.insert(key.number, id);
        self.last_number = self.last_number.max(key.number);
        true
    }

    /// Key of `id`, allocating the next number on first request
    pub fn get_or_assign(&mut self, id: ObjectId) -> PDFResult<ObjectKey> {
        if let Some(key) = self.keys.get(&id) {
            return Ok(*key);
        }
        let key = self.assign_fresh()?;
        trace!("Assigned key {} to {}", key, id);
        self.keys.insert(id, key);
        self.claimed.insert(key.number, id);
        Ok(key)
    }

    /// Allocate a number for an object with no arena identity. Fails once
    /// a seeded key has taken the largest object number.
    pub fn assign_fresh(&mut self) -> PDFResult<ObjectKey> {
        let number = self
            .last_number
            .checked_add(1)
            .ok_or_else(|| PDFError::xref(format!("No object number left after {}", self.last_number)))?;
        self.last_number = number;
        Ok(ObjectKey::new(number, 0))
    }

    pub fn get(&self, id: ObjectId) -> Option<ObjectKey> {
        self.keys.get(&id).copied()
    }

    /// Largest number handed out or seeded so far
    pub fn last_number(&self) -> u32 {
        self.last_number
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_sequential_assignment() -> PDFResult<()> {
        let mut registry = ObjectKeyRegistry::new();
        assert_eq!(registry.get_or_assign(ObjectId(5))?, ObjectKey::new(1, 0));
        assert_eq!(registry.get_or_assign(ObjectId(2))?, ObjectKey::new(2, 0));
        assert_eq!(registry.get_or_assign(ObjectId(5))?, ObjectKey::new(1, 0));
        assert_eq!(registry.len(), 2);
        Ok(())
    }

    #[test]
    fn test_seeded_keys_advance_counter() -> PDFResult<()> {
        let mut registry = ObjectKeyRegistry::new();
        assert!(registry.seed(ObjectId(0), ObjectKey::new(7, 2)));
        assert!(registry.seed(ObjectId(1), ObjectKey::new(3, 0)));

        assert_eq!(registry.get_or_assign(ObjectId(0))?, ObjectKey::new(7, 2));
        assert_eq!(registry.get_or_assign(ObjectId(9))?, ObjectKey::new(8, 0));
        assert_eq!(registry.assign_fresh()?, ObjectKey::new(9, 0));
        Ok(())
    }

    #[test]
    fn test_conflicting_seed_rejected() -> PDFResult<()> {
        let mut registry = ObjectKeyRegistry::new();
        assert!(registry.seed(ObjectId(0), ObjectKey::new(4, 0)));
        assert!(!registry.seed(ObjectId(1), ObjectKey::new(4, 0)));
        assert!(!registry.seed(ObjectId(2), ObjectKey::new(4, 1)));

        assert_eq!(registry.get(ObjectId(1)), None);
        assert_eq!(registry.get_or_assign(ObjectId(1))?, ObjectKey::new(5, 0));
        Ok(())
    }

    #[test]
    fn test_numbers_exhausted() {
        let mut registry = ObjectKeyRegistry::new();
        assert!(registry.seed(ObjectId(0), ObjectKey::new(u32::MAX, 0)));

        assert!(matches!(registry.assign_fresh(), Err(PDFError::XRefError(_))));
        assert!(matches!(registry.get_or_assign(ObjectId(1)), Err(PDFError::XRefError(_))));
        assert_eq!(registry.get(ObjectId(1)), None);
        assert_eq!(registry.last_number(), u32::MAX);
    }
}
