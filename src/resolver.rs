//! Dynamic arguments: lengths, counts, offsets and tags computed at parse time.

use std::{fmt, sync::Arc};

use crate::{
    errors::{BoxError, ErrorKind},
    value::Record,
};

/// Callback computing an argument from the record decoded so far.
pub type ResolveFn = Arc<dyn Fn(&Record) -> Result<i64, BoxError> + Send + Sync>;

/// A dynamic argument.
///
/// Resolution is lazy: the value is looked up exactly when the consuming codec needs it,
/// against the record of the scope the field is declared in.
#[derive(Clone)]
pub enum Arg {
    /// A fixed value.
    Literal(i64),
    /// Name (or dotted path) of a field already decoded in the current scope.
    Field(String),
    /// Computed from the in-progress record.
    Callback(ResolveFn),
}

impl Arg {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Result<i64, BoxError> + Send + Sync + 'static,
    {
        Arg::Callback(Arc::new(f))
    }

    pub(crate) fn resolve(&self, record: &Record) -> Result<i64, ErrorKind> {
        match self {
            Arg::Literal(v) => Ok(*v),
            Arg::Field(path) => {
                let value =
                    record
                        .get_path(path)
                        .ok_or_else(|| ErrorKind::UnresolvedReference {
                            reference: path.clone(),
                        })?;
                value.as_i64().ok_or_else(|| ErrorKind::UnsupportedType {
                    detail: format!(
                        "reference `{path}` holds a {} value, expected an integer",
                        value.type_name()
                    ),
                })
            }
            Arg::Callback(f) => f(record).map_err(ErrorKind::Callback),
        }
    }

    /// Resolves a length or count, which must not be negative.
    pub(crate) fn resolve_len(&self, record: &Record) -> Result<usize, ErrorKind> {
        let value = self.resolve(record)?;
        usize::try_from(value).map_err(|_| ErrorKind::UnsupportedType {
            detail: format!("{self:?} resolved to {value}, expected a non-negative length"),
        })
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Literal(v) => write!(f, "{v}"),
            Arg::Field(path) => write!(f, "`{path}`"),
            Arg::Callback(_) => f.write_str("<callback>"),
        }
    }
}

macro_rules! arg_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Literal(v.into())
                }
            }
        )+
    };
}

arg_from_int!(u8, u16, u32, i8, i16, i32, i64);

impl From<usize> for Arg {
    fn from(v: usize) -> Self {
        Arg::Literal(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Arg {
    fn from(path: &str) -> Self {
        Arg::Field(path.to_string())
    }
}

impl From<String> for Arg {
    fn from(path: String) -> Self {
        Arg::Field(path)
    }
}
