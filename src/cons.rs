use crate::value::{write_joined, Value};
use std::fmt;

pub const QUOTE_SYMBOL: &str = "CL:QUOTE";

/// A pair cell. The tail is usually another cell or [`Value::Nil`]; any
/// other tail makes the chain dotted.
///
/// Cells own their head and tail through `Box`, so a chain can never loop
/// back on itself and every traversal terminates.
pub struct Cons {
    pub car: Value,
    pub cdr: Value,
}

impl Cons {
    pub fn new(car: Value, cdr: Value) -> Self {
        Self { car, cdr }
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            current: Some(self),
            terminator: None,
        }
    }

    /// Final non-cell tail of the chain: `Nil` for proper lists.
    pub fn terminator(&self) -> &Value {
        let mut cell = self;
        while let Value::Cons(next) = &cell.cdr {
            cell = next;
        }
        &cell.cdr
    }

    pub fn is_proper(&self) -> bool {
        self.terminator().is_nil()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

// Chains are unlinked one cell at a time so long lists do not exhaust the
// stack through recursive drops.
impl Drop for Cons {
    fn drop(&mut self) {
        let mut next = std::mem::replace(&mut self.cdr, Value::Nil);
        while let Value::Cons(mut cell) = next {
            next = std::mem::replace(&mut cell.cdr, Value::Nil);
        }
    }
}

// Clone, equality and both printers walk the tail spine in a loop; only
// nesting in head position recurses.
impl Clone for Cons {
    fn clone(&self) -> Self {
        let mut iter = self.iter();
        let mut heads = iter.by_ref().cloned().collect::<Vec<_>>().into_iter();
        let tail = iter.terminator().cloned().unwrap_or(Value::Nil);
        let car = heads.next().unwrap_or(Value::Nil);
        Cons::new(car, build_dotted(heads, tail))
    }
}

impl PartialEq for Cons {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            if left.car != right.car {
                return false;
            }
            match (&left.cdr, &right.cdr) {
                (Value::Cons(l), Value::Cons(r)) => {
                    left = l;
                    right = r;
                }
                (l, r) => return l == r,
            }
        }
    }
}

impl fmt::Debug for Cons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.iter();
        let mut list = f.debug_list();
        list.entries(iter.by_ref());
        if let Some(tail) = iter.terminator().filter(|tail| !tail.is_nil()) {
            list.entry(&format_args!(". {tail:?}"));
        }
        list.finish()
    }
}

impl fmt::Display for Cons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_proper() {
            write!(f, "List(")?;
            write_joined(f, self.iter())?;
            return write!(f, ")");
        }
        let mut iter = self.iter();
        let mut depth = 0usize;
        for head in iter.by_ref() {
            write!(f, "Cons({head}, ")?;
            depth += 1;
        }
        if let Some(tail) = iter.terminator() {
            write!(f, "{tail}")?;
        }
        for _ in 0..depth {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Forward iterator over the heads of a chain.
///
/// Stops at the first tail that is not a cell; [`ListIter::terminator`]
/// then tells a proper end (`Nil`) apart from a dotted one.
#[derive(Clone, Debug)]
pub struct ListIter<'a> {
    current: Option<&'a Cons>,
    terminator: Option<&'a Value>,
}

impl<'a> ListIter<'a> {
    /// Iterates `value` as a list. Non-cell values yield nothing and are
    /// their own terminator.
    pub fn over(value: &'a Value) -> Self {
        match value {
            Value::Cons(cell) => Self {
                current: Some(&**cell),
                terminator: None,
            },
            other => Self {
                current: None,
                terminator: Some(other),
            },
        }
    }

    /// `None` until the iterator is exhausted.
    pub fn terminator(&self) -> Option<&'a Value> {
        self.terminator
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.current?;
        match &cell.cdr {
            Value::Cons(next) => self.current = Some(&**next),
            other => {
                self.current = None;
                self.terminator = Some(other);
            }
        }
        Some(&cell.car)
    }
}

/// Builds a right-associated proper list. An empty input is `Nil`.
pub fn build_list<I>(items: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    build_dotted(items, Value::Nil)
}

/// Builds a chain of `items` whose last tail is `tail`.
pub fn build_dotted<I>(items: I, tail: Value) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let items: Vec<Value> = items.into_iter().collect();
    items
        .into_iter()
        .rev()
        .fold(tail, |acc, item| Value::cons(item, acc))
}

/// `(QUOTE value)` with the default quote symbol.
pub fn build_quoted(value: Value) -> Value {
    quote_with(QUOTE_SYMBOL, value)
}

pub(crate) fn quote_with(symbol: &str, value: Value) -> Value {
    build_list([Value::symbol(symbol), value])
}
