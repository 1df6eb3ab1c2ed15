//! Rendering values as text.

use std::collections::HashSet;

use sinter_foundation::{HeapId, Result, Value, format_number};

use crate::heap::Heap;
use crate::object::HeapObject;

enum Task {
    Value(Value),
    Text(&'static str),
    Leave(HeapId),
}

impl Heap {
    /// Renders a value the way `display` prints it.
    ///
    /// Pairs and arrays print as `[a, b]`. A structure reached again while
    /// it is still being printed prints as `...<circular>`; shared but
    /// acyclic substructure prints in full each time.
    pub fn render(&self, value: Value) -> Result<String> {
        let mut out = String::new();
        let mut active: HashSet<HeapId> = HashSet::new();
        let mut tasks = vec![Task::Value(value)];

        while let Some(task) = tasks.pop() {
            match task {
                Task::Text(text) => out.push_str(text),
                Task::Leave(id) => {
                    active.remove(&id);
                }
                Task::Value(Value::Reference(id)) => match self.get(id)? {
                    HeapObject::String(text) => out.push_str(text),
                    HeapObject::Pair(_) | HeapObject::Array(_) if active.contains(&id) => {
                        out.push_str("...<circular>");
                    }
                    object @ (HeapObject::Pair(_) | HeapObject::Array(_)) => {
                        let items = object.elements().unwrap_or_default();
                        active.insert(id);
                        out.push('[');
                        tasks.push(Task::Leave(id));
                        tasks.push(Task::Text("]"));
                        for (i, item) in items.iter().enumerate().rev() {
                            tasks.push(Task::Value(*item));
                            if i > 0 {
                                tasks.push(Task::Text(", "));
                            }
                        }
                    }
                    HeapObject::Environment { .. } => out.push_str("<environment>"),
                    HeapObject::Closure { .. }
                    | HeapObject::Primitive(_)
                    | HeapObject::Internal(_)
                    | HeapObject::Thunk(_) => out.push_str("<function>"),
                },
                Task::Value(Value::Number(n)) => out.push_str(&format_number(n)),
                Task::Value(other) => out.push_str(&other.to_string()),
            }
        }
        Ok(out)
    }
}
