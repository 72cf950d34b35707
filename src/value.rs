use crate::marshal::StructView;

/// High-level representation of the data stored in native memory.
///
/// Struct values are never copied out of the buffer: `Value::Struct` borrows the bytes it was
/// read from, so a value can't outlive the memory backing it.
#[derive(Clone, Debug)]
pub enum Value<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    List(Vec<Value<'a>>),
    Struct(StructView<'a>),
}

impl<'a> Value<'a> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
        }
    }

    /// Any integer-like value widened to `i128`, which holds both `i64` and `u64` exactly.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Int(n) => Some(n as i128),
            Value::UInt(n) => Some(n as i128),
            Value::Bool(b) => Some(b as i128),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            Value::Int(n) => Some(n as f64),
            Value::UInt(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructView<'a>> {
        match self {
            Value::Struct(view) => Some(view),
            _ => None,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => {
                std::ptr::eq(a.descriptor(), b.descriptor())
                    && a.memory().as_bytes() == b.memory().as_bytes()
            }
            _ => false,
        }
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value<'_> {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value<'_> {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value<'_> {
    fn from(n: u32) -> Self {
        Value::UInt(n.into())
    }
}

impl From<f64> for Value<'_> {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<'a> From<StructView<'a>> for Value<'a> {
    fn from(view: StructView<'a>) -> Self {
        Value::Struct(view)
    }
}

impl<'a, T: Into<Value<'a>>> From<Vec<T>> for Value<'a> {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}
