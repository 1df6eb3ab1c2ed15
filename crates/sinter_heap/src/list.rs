//! List algorithms over pairs.
//!
//! Lists are `null` or pairs whose tail is a list. Walks are bounded by the
//! number of live objects, so a cyclic spine is reported as a type error
//! instead of looping.

use sinter_foundation::{ErrorKind, Result, Type, Value};

use crate::heap::Heap;

impl Heap {
    /// Builds a fresh list of `items`.
    pub fn list(&mut self, items: &[Value]) -> Result<Value> {
        self.list_onto(items, Value::Null)
    }

    /// Builds fresh pairs for `items` ending in `tail`, which is shared.
    pub fn list_onto(&mut self, items: &[Value], tail: Value) -> Result<Value> {
        let mut result = tail;
        for item in items.iter().rev() {
            result = self.cons(*item, result)?;
        }
        Ok(result)
    }

    /// Collects the pairs of a list spine, in order.
    fn spine(&self, xs: Value) -> Result<Vec<(Value, Value)>> {
        let mut pairs = Vec::new();
        let mut current = xs;
        loop {
            if current.is_null() {
                return Ok(pairs);
            }
            let Some((head, tail)) = self.pair_parts(current)? else {
                return Err(self.mismatch(Type::List, xs));
            };
            if pairs.len() > self.len() {
                return Err(self.mismatch(Type::List, xs));
            }
            pairs.push((current, head));
            current = tail;
        }
    }

    /// Returns the elements of a list.
    pub fn list_to_vec(&self, xs: Value) -> Result<Vec<Value>> {
        Ok(self.spine(xs)?.into_iter().map(|(_, head)| head).collect())
    }

    /// Returns true if `xs` is a finite, null-terminated list.
    pub fn is_list(&self, xs: Value) -> Result<bool> {
        if !xs.is_null() && !self.is_pair(xs)? {
            return Ok(false);
        }
        match self.spine(xs) {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.kind, ErrorKind::TypeMismatch { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Number of elements in a list.
    pub fn length(&self, xs: Value) -> Result<usize> {
        Ok(self.spine(xs)?.len())
    }

    /// Copies the pairs of `xs` and shares `ys` as the final tail.
    ///
    /// `append(null, ys)` is `ys` itself.
    pub fn append(&mut self, xs: Value, ys: Value) -> Result<Value> {
        let items = self.list_to_vec(xs)?;
        self.list_onto(&items, ys)
    }

    /// Builds a reversed copy of a list.
    pub fn reverse(&mut self, xs: Value) -> Result<Value> {
        let items = self.list_to_vec(xs)?;
        let mut result = Value::Null;
        for item in items {
            result = self.cons(item, result)?;
        }
        Ok(result)
    }

    /// Returns the suffix of `xs` whose head is structurally equal to `v`,
    /// or `null`.
    pub fn member(&self, v: Value, xs: Value, limit: usize) -> Result<Value> {
        for (pair, head) in self.spine(xs)? {
            if self.equal(v, head, limit)? {
                return Ok(pair);
            }
        }
        Ok(Value::Null)
    }

    /// Removes the first element structurally equal to `v`.
    ///
    /// Elements before it are copied; the list after it is shared.
    pub fn remove(&mut self, v: Value, xs: Value, limit: usize) -> Result<Value> {
        let spine = self.spine(xs)?;
        for (i, (pair, head)) in spine.iter().enumerate() {
            if self.equal(v, *head, limit)? {
                let rest = self.cdr(*pair)?;
                let prefix: Vec<Value> = spine[..i].iter().map(|(_, h)| *h).collect();
                return self.list_onto(&prefix, rest);
            }
        }
        Ok(xs)
    }

    /// Builds a list of the elements not structurally equal to `v`, in order.
    pub fn remove_all(&mut self, v: Value, xs: Value, limit: usize) -> Result<Value> {
        let mut kept = Vec::new();
        for item in self.list_to_vec(xs)? {
            if !self.equal(v, item, limit)? {
                kept.push(item);
            }
        }
        self.list(&kept)
    }
}
