//! Generation-tagged handle tables
//!
//! Handles given to foreign callers are plain `u64` values laid out as
//! `kind (8 bits) | generation (24 bits) | slot (32 bits)`. A slot's
//! generation is bumped every time its value is removed, so a handle kept
//! after its delete call no longer matches and is rejected instead of
//! reaching freed memory.

use thiserror::Error;

const KIND_SHIFT: u32 = 56;
const GENERATION_SHIFT: u32 = 32;
const GENERATION_MASK: u64 = 0x00FF_FFFF;
const SLOT_MASK: u64 = 0xFFFF_FFFF;
const MAX_GENERATION: u32 = GENERATION_MASK as u32;

/// Object family a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandleKind {
    Service = 1,
    Model = 2,
    CancelToken = 3,
}

impl HandleKind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Service),
            2 => Some(Self::Model),
            3 => Some(Self::CancelToken),
            _ => None,
        }
    }
}

/// Reasons a handle is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("{0:?} handle is null")]
    Null(HandleKind),
    #[error("value {0:#x} is not a handle")]
    Malformed(u64),
    #[error("expected a {expected:?} handle, got a {found:?} handle")]
    WrongKind { expected: HandleKind, found: HandleKind },
    #[error("{0:?} handle is stale or was already deleted")]
    Stale(HandleKind),
    #[error("no free {0:?} handles left")]
    Exhausted(HandleKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handle {
    kind: HandleKind,
    generation: u32,
    slot: u32,
}

impl Handle {
    fn encode(self) -> u64 {
        ((self.kind as u64) << KIND_SHIFT)
            | ((u64::from(self.generation) & GENERATION_MASK) << GENERATION_SHIFT)
            | u64::from(self.slot)
    }

    fn decode(raw: u64) -> Option<Self> {
        let kind = HandleKind::from_tag((raw >> KIND_SHIFT) as u8)?;
        Some(Self {
            kind,
            generation: ((raw >> GENERATION_SHIFT) & GENERATION_MASK) as u32,
            slot: (raw & SLOT_MASK) as u32,
        })
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena mapping handles to live values of one kind
pub struct HandleTable<T> {
    kind: HandleKind,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    pub const fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Store `value` and return its handle
    pub fn insert(&mut self, value: T) -> Result<u64, HandleError> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = u32::try_from(self.slots.len())
                    .map_err(|_| HandleError::Exhausted(self.kind))?;
                self.slots.push(Slot {
                    generation: 1,
                    value: None,
                });
                slot
            }
        };

        let entry = &mut self.slots[slot as usize];
        entry.value = Some(value);
        self.live += 1;

        Ok(Handle {
            kind: self.kind,
            generation: entry.generation,
            slot,
        }
        .encode())
    }

    /// Borrow the value behind `raw`
    pub fn get(&self, raw: u64) -> Result<&T, HandleError> {
        let handle = self.check(raw)?;
        self.slots[handle.slot as usize]
            .value
            .as_ref()
            .ok_or(HandleError::Stale(self.kind))
    }

    /// Remove the value behind `raw`, invalidating every copy of the handle
    pub fn remove(&mut self, raw: u64) -> Result<T, HandleError> {
        let handle = self.check(raw)?;
        let entry = &mut self.slots[handle.slot as usize];
        let value = entry.value.take().ok_or(HandleError::Stale(self.kind))?;
        self.live -= 1;

        // A slot whose generation would wrap is retired rather than reused
        if entry.generation < MAX_GENERATION {
            entry.generation += 1;
            self.free.push(handle.slot);
        }

        Ok(value)
    }

    fn check(&self, raw: u64) -> Result<Handle, HandleError> {
        if raw == 0 {
            return Err(HandleError::Null(self.kind));
        }
        let handle = Handle::decode(raw).ok_or(HandleError::Malformed(raw))?;
        if handle.kind != self.kind {
            return Err(HandleError::WrongKind {
                expected: self.kind,
                found: handle.kind,
            });
        }

        match self.slots.get(handle.slot as usize) {
            Some(slot) if slot.generation == handle.generation => Ok(handle),
            Some(_) => Err(HandleError::Stale(self.kind)),
            None => Err(HandleError::Malformed(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut table = HandleTable::new(HandleKind::Model);
        let handle = table.insert("model").unwrap();

        assert_ne!(handle, 0);
        assert_eq!(table.get(handle), Ok(&"model"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.remove(handle), Ok("model"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_stale_handle_rejected_after_reuse() {
        let mut table = HandleTable::new(HandleKind::Service);
        let first = table.insert(1).unwrap();
        table.remove(first).unwrap();

        // Slot is reused with a new generation
        let second = table.insert(2).unwrap();
        assert_ne!(first, second);
        assert_eq!(table.get(first), Err(HandleError::Stale(HandleKind::Service)));
        assert_eq!(table.remove(first), Err(HandleError::Stale(HandleKind::Service)));
        assert_eq!(table.get(second), Ok(&2));
    }

    #[test]
    fn test_double_remove() {
        let mut table = HandleTable::new(HandleKind::Model);
        let handle = table.insert(()).unwrap();
        assert!(table.remove(handle).is_ok());
        assert!(matches!(table.remove(handle), Err(HandleError::Stale(_))));
    }

    #[test]
    fn test_wrong_kind_and_garbage() {
        let mut services = HandleTable::new(HandleKind::Service);
        let mut models = HandleTable::new(HandleKind::Model);
        let service = services.insert("s").unwrap();
        let _model = models.insert("m").unwrap();

        assert!(matches!(models.get(service), Err(HandleError::WrongKind { .. })));
        assert_eq!(models.get(0), Err(HandleError::Null(HandleKind::Model)));
        assert!(matches!(models.get(0xdead_beef), Err(HandleError::Malformed(_))));

        let unknown_slot = Handle {
            kind: HandleKind::Model,
            generation: 1,
            slot: 999,
        }
        .encode();
        assert!(matches!(models.get(unknown_slot), Err(HandleError::Malformed(_))));
    }

    #[test]
    fn test_encoding_roundtrip() {
        let handle = Handle {
            kind: HandleKind::CancelToken,
            generation: MAX_GENERATION,
            slot: u32::MAX,
        };
        assert_eq!(Handle::decode(handle.encode()), Some(handle));
    }
}
