//! Object storage on top of the arena.
//!
//! Objects live in a slot vector addressed by [`HeapId`]. Each slot holds an
//! arena region sized to the object's footprint, so the arena capacity
//! bounds how much a program can allocate. Nothing is freed individually
//! while a program runs; [`Heap::clear`] releases everything at once.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::collections::{HashSet, VecDeque};

use sinter_foundation::{Error, ErrorKind, ExecutionLimit, HeapId, Result, Type, Value};

use crate::arena::{Arena, Handle};
use crate::object::HeapObject;

#[derive(Debug)]
struct Slot {
    object: HeapObject,
    region: Handle,
}

/// The object heap.
#[derive(Debug, Default)]
pub struct Heap {
    arena: Arena,
    slots: Vec<Slot>,
}

impl Heap {
    /// Creates a heap over an uninitialised arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a heap over an arena of `size` bytes.
    #[must_use]
    pub fn with_capacity(size: u32) -> Self {
        Self {
            arena: Arena::with_capacity(size),
            slots: Vec::new(),
        }
    }

    /// (Re)initialises the arena, dropping every object and region.
    pub fn init(&mut self, size: u32) {
        self.slots.clear();
        self.arena.init(size);
    }

    /// Borrows the arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutably borrows the arena.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no objects are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Releases every object's region back to the arena.
    ///
    /// Regions the embedder allocated directly are untouched.
    pub fn clear(&mut self) -> Result<()> {
        for slot in self.slots.drain(..) {
            self.arena.release(slot.region)?;
        }
        Ok(())
    }

    /// Allocates an object.
    pub fn alloc(&mut self, object: HeapObject) -> Result<HeapId> {
        let region = self.arena.allocate(object.footprint())?;
        let id = HeapId::new(self.slots.len() as u32);
        self.slots.push(Slot { object, region });
        Ok(id)
    }

    /// Borrows an object.
    pub fn get(&self, id: HeapId) -> Result<&HeapObject> {
        self.slots
            .get(id.index() as usize)
            .map(|slot| &slot.object)
            .ok_or_else(|| Error::internal(format!("dangling reference {id}")))
    }

    /// Mutably borrows an object.
    pub fn get_mut(&mut self, id: HeapId) -> Result<&mut HeapObject> {
        self.slots
            .get_mut(id.index() as usize)
            .map(|slot| &mut slot.object)
            .ok_or_else(|| Error::internal(format!("dangling reference {id}")))
    }

    /// Replaces an object, recharging the arena for its new footprint.
    fn replace(&mut self, id: HeapId, object: HeapObject) -> Result<()> {
        let region = self.arena.allocate(object.footprint())?;
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .ok_or_else(|| Error::internal(format!("dangling reference {id}")))?;
        let old = std::mem::replace(&mut slot.region, region);
        slot.object = object;
        self.arena.release(old)
    }

    /// Returns the object behind a value, if it is a reference.
    pub fn object(&self, value: Value) -> Result<Option<&HeapObject>> {
        match value {
            Value::Reference(id) => self.get(id).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns the runtime type of a value.
    pub fn type_of(&self, value: Value) -> Result<Type> {
        match value.immediate_type() {
            Some(ty) => Ok(ty),
            None => Ok(self.object(value)?.map_or(Type::Any, HeapObject::type_of)),
        }
    }

    /// Builds a type mismatch error for `value`.
    pub fn mismatch(&self, expected: Type, value: Value) -> Error {
        match self.type_of(value) {
            Ok(actual) => Error::type_mismatch(expected, actual),
            Err(err) => err,
        }
    }

    // =========================================================================
    // Pairs
    // =========================================================================

    /// Allocates a pair.
    pub fn cons(&mut self, car: Value, cdr: Value) -> Result<Value> {
        self.alloc(HeapObject::Pair([car, cdr])).map(Value::Reference)
    }

    /// Returns both halves of a pair.
    ///
    /// A two-element array is a pair as far as the list library is
    /// concerned, since array literals are how programs write pairs.
    pub fn pair_parts(&self, value: Value) -> Result<Option<(Value, Value)>> {
        Ok(match self.object(value)? {
            Some(HeapObject::Pair([car, cdr])) => Some((*car, *cdr)),
            Some(HeapObject::Array(items)) if items.len() == 2 => Some((items[0], items[1])),
            _ => None,
        })
    }

    /// Returns true if `value` is a pair.
    pub fn is_pair(&self, value: Value) -> Result<bool> {
        Ok(self.pair_parts(value)?.is_some())
    }

    /// Returns the head of a pair.
    pub fn car(&self, value: Value) -> Result<Value> {
        self.pair_parts(value)?
            .map(|(car, _)| car)
            .ok_or_else(|| self.mismatch(Type::Pair, value))
    }

    /// Returns the tail of a pair.
    pub fn cdr(&self, value: Value) -> Result<Value> {
        self.pair_parts(value)?
            .map(|(_, cdr)| cdr)
            .ok_or_else(|| self.mismatch(Type::Pair, value))
    }

    /// Overwrites the head of a pair.
    pub fn set_car(&mut self, pair: Value, car: Value) -> Result<()> {
        self.set_pair_slot(pair, 0, car)
    }

    /// Overwrites the tail of a pair.
    pub fn set_cdr(&mut self, pair: Value, cdr: Value) -> Result<()> {
        self.set_pair_slot(pair, 1, cdr)
    }

    fn set_pair_slot(&mut self, pair: Value, index: usize, value: Value) -> Result<()> {
        if let Value::Reference(id) = pair {
            match self.get_mut(id)? {
                HeapObject::Pair(cell) => {
                    cell[index] = value;
                    return Ok(());
                }
                HeapObject::Array(items) if items.len() == 2 => {
                    items[index] = value;
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(self.mismatch(Type::Pair, pair))
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    /// Allocates an array.
    pub fn array(&mut self, items: Vec<Value>) -> Result<Value> {
        self.alloc(HeapObject::Array(items)).map(Value::Reference)
    }

    /// Returns the elements of a pair or array.
    pub fn elements(&self, value: Value) -> Result<Option<&[Value]>> {
        Ok(self.object(value)?.and_then(HeapObject::elements))
    }

    /// Reads element `index` of a pair or array.
    pub fn element(&self, value: Value, index: usize) -> Result<Value> {
        let items = self
            .elements(value)?
            .ok_or_else(|| self.mismatch(Type::Array, value))?;
        items.get(index).copied().ok_or_else(|| {
            Error::new(ErrorKind::IndexOutOfBounds {
                index,
                length: items.len(),
            })
        })
    }

    /// Writes element `index` of a pair or array.
    ///
    /// Writing one past the end of an array appends to it; pairs are
    /// fixed at two elements.
    pub fn set_element(&mut self, target: Value, index: usize, value: Value) -> Result<()> {
        let Value::Reference(id) = target else {
            return Err(self.mismatch(Type::Array, target));
        };
        let grown = match self.get_mut(id)? {
            HeapObject::Pair(cell) if index < 2 => {
                cell[index] = value;
                return Ok(());
            }
            HeapObject::Array(items) if index < items.len() => {
                items[index] = value;
                return Ok(());
            }
            HeapObject::Array(items) if index == items.len() => {
                let mut grown = items.clone();
                grown.push(value);
                grown
            }
            HeapObject::Pair(_) => {
                return Err(Error::new(ErrorKind::IndexOutOfBounds { index, length: 2 }));
            }
            HeapObject::Array(items) => {
                let length = items.len();
                return Err(Error::new(ErrorKind::IndexOutOfBounds { index, length }));
            }
            _ => return Err(self.mismatch(Type::Array, target)),
        };
        self.replace(id, HeapObject::Array(grown))
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Allocates a string.
    pub fn string(&mut self, text: impl Into<Box<str>>) -> Result<Value> {
        self.alloc(HeapObject::String(text.into()))
            .map(Value::Reference)
    }

    /// Returns the text of a string value.
    pub fn as_str(&self, value: Value) -> Result<Option<&str>> {
        Ok(match self.object(value)? {
            Some(HeapObject::String(text)) => Some(text),
            _ => None,
        })
    }

    /// Returns true for closures, primitives, internal functions and thunks.
    pub fn is_callable(&self, value: Value) -> Result<bool> {
        Ok(self.object(value)?.is_some_and(HeapObject::is_callable))
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Identity comparison (`===`).
    ///
    /// Immediates compare by value with IEEE-754 semantics. Strings compare
    /// by contents since they are never interned. Every other object is
    /// only identical to itself.
    pub fn strict_equal(&self, a: Value, b: Value) -> Result<bool> {
        if a.identical(&b) {
            return Ok(true);
        }
        match (self.as_str(a)?, self.as_str(b)?) {
            (Some(x), Some(y)) => Ok(x == y),
            _ => Ok(false),
        }
    }

    /// Structural equality (`equal`).
    ///
    /// Pairs and arrays compare element-wise; `NaN` equals itself; atoms
    /// fall back to identity. Two operands that are the same reference are
    /// equal without looking inside. A pair of containers already queued
    /// is not expanded again, so distinct cycles of the same shape compare
    /// equal instead of unrolling forever. `limit` bounds the number of
    /// comparisons regardless.
    pub fn equal(&self, a: Value, b: Value, limit: usize) -> Result<bool> {
        let mut pending = VecDeque::from([(a, b)]);
        let mut expanded: HashSet<(HeapId, HeapId)> = HashSet::new();
        let mut comparisons = 0_usize;

        while let Some((x, y)) = pending.pop_front() {
            comparisons += 1;
            if comparisons > limit {
                return Err(Error::limit_exceeded(
                    ExecutionLimit::EqualityComparisons { limit },
                ));
            }

            match (x, y) {
                (Value::Reference(p), Value::Reference(q)) if p == q => {}
                (Value::Number(m), Value::Number(n)) => {
                    if m != n && !(m.is_nan() && n.is_nan()) {
                        return Ok(false);
                    }
                }
                (Value::Reference(p), Value::Reference(q)) => {
                    if let (Some(xs), Some(ys)) = (self.elements(x)?, self.elements(y)?) {
                        if xs.len() != ys.len() {
                            return Ok(false);
                        }
                        if !expanded.insert((p, q)) {
                            continue;
                        }
                        pending.extend(xs.iter().copied().zip(ys.iter().copied()));
                    } else if !self.strict_equal(x, y)? {
                        return Ok(false);
                    }
                }
                _ => {
                    if !x.identical(&y) {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }
}
