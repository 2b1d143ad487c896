//! Deep structural equality over value graphs.
//!
//! [`is_equal`] compares two graphs without encoding them. Every pair of
//! objects it starts comparing is recorded; meeting the same pair again
//! answers `true`, which is what makes cyclic graphs terminate.
//!
//! Rules beyond the obvious ones:
//!
//! - `NaN` equals `NaN`, and `-0` equals `0`.
//! - Objects must be the same kind: a `Map` never equals a `Set` or a plain object.
//! - Arrays compare in order. `Map` entries, `Set` members and object
//!   properties compare regardless of order.
//! - Symbols compare by description.
//! - Class instances must share the same [`Class`](crate::Class).
//! - `Error` values compare `name` and `message`; the stack is ignored.

use crate::object::{FileSource, Handle, Object, PlainObject};
use crate::{Properties, Symbol, Value, ValueMap, ValueSet};
use rustc_hash::FxHashSet;

/// Returns `true` if `a` and `b` are structurally equal.
///
/// # Examples
///
/// ```rust
/// use dson::{is_equal, Value};
///
/// let a = Value::empty_object();
/// a.set("self", a.clone());
/// let b = Value::empty_object();
/// b.set("self", b.clone());
/// assert!(is_equal(&a, &b));
///
/// b.set("extra", Value::from(1));
/// assert!(!is_equal(&a, &b));
/// ```
pub fn is_equal(a: &Value, b: &Value) -> bool {
    Comparison::default().values(a, b)
}

#[derive(Default)]
struct Comparison {
    visited: FxHashSet<(usize, usize)>,
    /// Pairs in insertion order, so failed trial matches can be undone.
    trail: Vec<(usize, usize)>,
}

impl Comparison {
    fn values(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
            (Value::String(x), Value::String(y)) => x == y,
            (Value::BigInt(x), Value::BigInt(y)) => x == y,
            (Value::Symbol(x), Value::Symbol(y)) => symbols_match(x, y),
            (Value::Object(x), Value::Object(y)) => self.objects(x, y),
            _ => false,
        }
    }

    fn objects(&mut self, a: &Handle, b: &Handle) -> bool {
        if a.ptr_eq(b) {
            return true;
        }
        let pair = (a.addr(), b.addr());
        if !self.visited.insert(pair) {
            return true;
        }
        self.trail.push(pair);

        let (Ok(x), Ok(y)) = (a.try_borrow(), b.try_borrow()) else {
            return false;
        };
        match (&*x, &*y) {
            (Object::Plain(p), Object::Plain(q)) => self.plain(p, q),
            (Object::Array(p), Object::Array(q))
            | (Object::FileList(p), Object::FileList(q))
            | (Object::NodeList(p), Object::NodeList(q)) => self.lists(p, q),
            (Object::Map(p), Object::Map(q)) => self.maps(p, q),
            (Object::Set(p), Object::Set(q)) => self.sets(p, q),
            (Object::Date(p), Object::Date(q)) => p == q,
            (Object::RegExp(p), Object::RegExp(q)) => p == q,
            (Object::Url(p), Object::Url(q)) => p == q,
            (Object::SearchParams(p), Object::SearchParams(q)) => p == q,
            (Object::WeakMap, Object::WeakMap) | (Object::WeakSet, Object::WeakSet) => true,
            (Object::Function(p), Object::Function(q)) => p == q,
            (Object::TypedArray(p), Object::TypedArray(q)) => p == q,
            (Object::Error(p), Object::Error(q)) => p.name == q.name && p.message == q.message,
            (Object::File(p), Object::File(q)) => {
                p.name == q.name
                    && p.mime_type == q.mime_type
                    && p.last_modified == q.last_modified
                    && sources_match(&p.source, &q.source)
            }
            (Object::FormData(p), Object::FormData(q)) => {
                p.entries.len() == q.entries.len()
                    && p.entries
                        .iter()
                        .zip(&q.entries)
                        .all(|((kp, vp), (kq, vq))| kp == kq && self.values(vp, vq))
            }
            (Object::Element(p), Object::Element(q)) => p == q,
            (Object::Text(p), Object::Text(q)) | (Object::Comment(p), Object::Comment(q)) => {
                p == q
            }
            (Object::Instance(p), Object::Instance(q)) => {
                p.class.ptr_eq(&q.class) && self.properties(&p.properties, &q.properties)
            }
            _ => false,
        }
    }

    fn plain(&mut self, a: &PlainObject, b: &PlainObject) -> bool {
        if !self.properties(&a.properties, &b.properties) {
            return false;
        }
        self.unordered(&a.symbols, &b.symbols, |cmp, (ka, va), (kb, vb)| {
            symbols_match(ka, kb) && cmp.values(va, vb)
        })
    }

    fn properties(&mut self, a: &Properties, b: &Properties) -> bool {
        a.len() == b.len()
            && a.iter()
                .all(|(key, va)| b.get(key).is_some_and(|vb| self.values(va, vb)))
    }

    fn lists(&mut self, a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.values(x, y))
    }

    fn maps(&mut self, a: &ValueMap, b: &ValueMap) -> bool {
        let left: Vec<_> = a.iter().collect();
        let right: Vec<_> = b.iter().collect();
        self.unordered(&left, &right, |cmp, (ka, va), (kb, vb)| {
            cmp.values(ka, kb) && cmp.values(va, vb)
        })
    }

    fn sets(&mut self, a: &ValueSet, b: &ValueSet) -> bool {
        let left: Vec<_> = a.iter().collect();
        let right: Vec<_> = b.iter().collect();
        self.unordered(&left, &right, |cmp, x, y| cmp.values(x, y))
    }

    /// One-to-one matching of `left` against `right` in any order. Each
    /// candidate pairing is a trial; pairs it visited are forgotten if it fails.
    fn unordered<T>(
        &mut self,
        left: &[T],
        right: &[T],
        mut eq: impl FnMut(&mut Self, &T, &T) -> bool,
    ) -> bool {
        if left.len() != right.len() {
            return false;
        }
        let n = right.len();
        let mut used = vec![false; n];
        'outer: for (i, l) in left.iter().enumerate() {
            // Same position first: matching graphs usually share insertion order.
            for j in (0..n).map(|k| (i + k) % n) {
                if used[j] {
                    continue;
                }
                let mark = self.trail.len();
                if eq(self, l, &right[j]) {
                    used[j] = true;
                    continue 'outer;
                }
                self.rollback(mark);
            }
            return false;
        }
        true
    }

    fn rollback(&mut self, mark: usize) {
        for pair in self.trail.drain(mark..) {
            self.visited.remove(&pair);
        }
    }
}

fn symbols_match(a: &Symbol, b: &Symbol) -> bool {
    a == b || a.description() == b.description()
}

fn sources_match(a: &FileSource, b: &FileSource) -> bool {
    match (a, b) {
        (FileSource::Bytes(x), FileSource::Bytes(y)) => x == y,
        (FileSource::Path(x), FileSource::Path(y)) => x == y,
        _ => false,
    }
}
