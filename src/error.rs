#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("pack must be a positive integer, got {0}")]
    InvalidPack(i64),

    #[error("fields of structure `{0}` are already finalized")]
    FieldsFinalized(String),

    #[error("structure `{0}` cannot contain itself")]
    SelfContainment(String),

    #[error("too many initializers: `{name}` has {fields} field(s), got {given}")]
    TooManyInitializers {
        name: String,
        fields: usize,
        given: usize,
    },

    #[error("structure `{0}` cannot be initialized from this value")]
    UnsupportedInitializer(String),

    #[error("field `{field}` has type `{ty}` which has no usable size or alignment")]
    FieldTypeIncapable { field: String, ty: String },

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("invalid bit field `{field}`: {reason}")]
    InvalidBitField { field: String, reason: &'static str },

    #[error("access of {len} byte(s) at offset {offset} is out of bounds for a view of {size} byte(s)")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("expected {expected} value, found {found}")]
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value does not fit in `{0}`")]
    ValueOutOfRange(String),

    #[error("structure `{name}` has no field `{field}`")]
    UnknownField { name: String, field: String },

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("type `{0}` is already declared")]
    DuplicateType(String),
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;
