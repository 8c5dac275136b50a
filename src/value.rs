use crate::cons::Cons;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::RemoteHandle;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::ToPrimitive;
use std::fmt;

/// Host-side view of everything that can cross the wire.
///
/// `Nil` is the absence-marker: `false` encodes to the same wire atom, but
/// decoding that atom always produces `Nil`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(BigInt),
    Float(f64),
    Complex(Complex64),
    Ratio(BigRational),
    /// Text that is escaped and quoted on the wire.
    String(String),
    /// Text inserted into the outgoing expression as-is. Never decoded.
    Verbatim(String),
    Symbol(String),
    Vector(Vec<Value>),
    /// Encodes as an ordinary list; nothing decodes back into it.
    Tuple(Vec<Value>),
    HashTable(HashTable),
    Cons(Box<Cons>),
    Handle(RemoteHandle),
}

impl Value {
    pub fn verbatim(text: impl Into<String>) -> Self {
        Value::Verbatim(text.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn cons(car: Value, cdr: Value) -> Self {
        Value::Cons(Box::new(Cons::new(car, cdr)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_cons(&self) -> Option<&Cons> {
        match self {
            Value::Cons(cell) => Some(&**cell),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Ratio(_) => "ratio",
            Value::String(_) => "string",
            Value::Verbatim(_) => "verbatim",
            Value::Symbol(_) => "symbol",
            Value::Vector(_) => "vector",
            Value::Tuple(_) => "tuple",
            Value::HashTable(_) => "hash-table",
            Value::Cons(_) => "cons",
            Value::Handle(_) => "handle",
        }
    }
}

/// Hash-table entries. Key order carries no meaning; uniqueness of keys is
/// the caller's responsibility.
#[derive(Clone, Debug, Default)]
pub struct HashTable {
    entries: Vec<(Value, Value)>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub(crate) fn push_unchecked(&mut self, key: Value, value: Value) {
        self.entries.push((key, value));
    }
}

impl PartialEq for HashTable {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl FromIterator<(Value, Value)> for HashTable {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut table = HashTable::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Complex(c) => write!(f, "Complex({:?}, {:?})", c.re, c.im),
            Value::Ratio(r) => {
                let r = r.reduced();
                write!(f, "{}/{}", r.numer(), r.denom())
            }
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Verbatim(s) => write!(f, "{s}"),
            Value::Symbol(name) => write!(f, "{name}"),
            Value::Vector(items) => {
                write!(f, "[")?;
                write_joined(f, items.iter())?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_joined(f, items.iter())?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::HashTable(table) => {
                write!(f, "{{")?;
                let mut first = true;
                for (key, value) in table.iter() {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Cons(cell) => write!(f, "{cell}"),
            Value::Handle(handle) => write!(f, "{handle}"),
        }
    }
}

pub(crate) fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (idx, value) in items.enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Complex64> for Value {
    fn from(value: Complex64) -> Self {
        Value::Complex(value)
    }
}

impl From<BigRational> for Value {
    fn from(value: BigRational) -> Self {
        Value::Ratio(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Vector(value)
    }
}

impl From<HashTable> for Value {
    fn from(value: HashTable) -> Self {
        Value::HashTable(value)
    }
}

impl From<RemoteHandle> for Value {
    fn from(value: RemoteHandle) -> Self {
        Value::Handle(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Nil)
    }
}

fn mismatch(expected: &str, found: &Value) -> BridgeError {
    BridgeError::unsupported(format!("expected {expected}, found {}", found.type_name()))
}

/// `Nil` reads as `false` here; decoding never yields `Bool(false)`.
impl TryFrom<&Value> for bool {
    type Error = BridgeError;

    fn try_from(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Nil => Ok(false),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl TryFrom<&Value> for i64 {
    type Error = BridgeError;

    fn try_from(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Integer(n) => n
                .to_i64()
                .ok_or_else(|| BridgeError::unsupported(format!("integer {n} exceeds i64"))),
            other => Err(mismatch("integer", other)),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = BridgeError;

    fn try_from(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            other => Err(mismatch("float", other)),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = BridgeError;

    fn try_from(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_tables_compare_without_order() {
        let left: HashTable = [
            (Value::from("a"), Value::from(1i64)),
            (Value::from("b"), Value::from(2i64)),
        ]
        .into_iter()
        .collect();
        let right: HashTable = [
            (Value::from("b"), Value::from(2i64)),
            (Value::from("a"), Value::from(1i64)),
        ]
        .into_iter()
        .collect();
        assert_eq!(left, right);
    }

    #[test]
    fn insert_replaces_existing_key() {
        let mut table = HashTable::new();
        assert!(table.insert(Value::from(1i64), Value::from("x")).is_none());
        let old = table.insert(Value::from(1i64), Value::from("y"));
        assert_eq!(old, Some(Value::from("x")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn option_none_is_nil() {
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(Value::from(Some(3i64)), Value::from(3i64));
    }

    #[test]
    fn extraction_reports_mismatch() {
        let err = i64::try_from(&Value::from("3")).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedType { .. }));
        assert!(!bool::try_from(&Value::Nil).unwrap());
    }

    #[test]
    fn display_uses_host_forms() {
        assert_eq!(
            Value::Vector(vec![Value::from(1i64), Value::from("a")]).to_string(),
            "[1, String(\"a\")]"
        );
        assert_eq!(Value::Tuple(vec![Value::from(1i64)]).to_string(), "(1,)");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
    }
}
