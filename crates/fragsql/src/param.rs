//! Bound parameter values and their presence classification.
//!
//! A fragment is only meaningful when its parameter carries a value. [`Param`]
//! keeps the value that will be sent to the database together with its shape,
//! so the assembler can tell a scalar from a collection and an empty
//! collection from a typed `NULL`.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A value that can be sent to the database as a single parameter.
pub type BoxedValue = Arc<dyn ToSql + Send + Sync>;

/// How a bound value participates in fragment inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// A non-null, non-collection value.
    Scalar,
    /// A collection with at least one element.
    Collection,
    /// `NULL`, or a collection with no elements.
    Absent,
}

#[derive(Debug, Clone)]
enum Shape {
    Null,
    Scalar,
    List(Vec<BoxedValue>),
}

/// A parameter value bound to a named placeholder.
///
/// Collections keep both the whole value (sent as a PostgreSQL array) and
/// their individual elements (sent one placeholder each).
#[derive(Debug, Clone)]
pub struct Param {
    value: BoxedValue,
    shape: Shape,
}

impl Param {
    /// Wrap a single non-null value.
    pub fn scalar<T>(value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Self {
            value: Arc::new(value),
            shape: Shape::Scalar,
        }
    }

    /// A typed `NULL`.
    ///
    /// The type parameter decides which PostgreSQL types the `NULL` is
    /// accepted for when it is sent.
    pub fn null<T>() -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Self {
            value: Arc::new(None::<T>),
            shape: Shape::Null,
        }
    }

    /// Wrap a collection of values.
    pub fn list<T>(values: Vec<T>) -> Self
    where
        T: ToSql + Clone + Send + Sync + 'static,
        Vec<T>: ToSql,
    {
        let items = values
            .iter()
            .map(|v| Arc::new(v.clone()) as BoxedValue)
            .collect();
        Self {
            value: Arc::new(values),
            shape: Shape::List(items),
        }
    }

    /// Classify this value.
    pub fn presence(&self) -> Presence {
        match &self.shape {
            Shape::Null => Presence::Absent,
            Shape::Scalar => Presence::Scalar,
            Shape::List(items) if items.is_empty() => Presence::Absent,
            Shape::List(_) => Presence::Collection,
        }
    }

    /// `true` for `NULL` and empty collections.
    pub fn is_absent(&self) -> bool {
        self.presence() == Presence::Absent
    }

    /// `true` if this value is a collection, empty or not.
    pub fn is_collection(&self) -> bool {
        matches!(self.shape, Shape::List(_))
    }

    /// The elements of a collection, or `None` for scalars and `NULL`.
    pub fn elements(&self) -> Option<&[BoxedValue]> {
        match &self.shape {
            Shape::List(items) => Some(items),
            _ => None,
        }
    }

    /// The whole value as a single database parameter.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        self.value.as_ref() as &(dyn ToSql + Sync)
    }
}

/// Conversion into a [`Param`].
///
/// Implemented for the scalar types `tokio-postgres` can send, for `Option`
/// (where `None` becomes a typed `NULL`) and for vectors, slices and arrays.
pub trait IntoParam {
    fn into_param(self) -> Param;
}

impl IntoParam for Param {
    fn into_param(self) -> Param {
        self
    }
}

macro_rules! impl_scalar_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoParam for $ty {
                fn into_param(self) -> Param {
                    Param::scalar(self)
                }
            }
        )*
    };
}

impl_scalar_param!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &'static str,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
);

/// JSON `null` is absent; every other JSON value is sent as one document.
impl IntoParam for serde_json::Value {
    fn into_param(self) -> Param {
        if self.is_null() {
            Param::null::<serde_json::Value>()
        } else {
            Param::scalar(self)
        }
    }
}

impl<T> IntoParam for Option<T>
where
    T: IntoParam + ToSql + Send + Sync + 'static,
{
    fn into_param(self) -> Param {
        match self {
            Some(value) => value.into_param(),
            None => Param::null::<T>(),
        }
    }
}

impl<T> IntoParam for Vec<T>
where
    T: ToSql + Clone + Send + Sync + 'static,
    Vec<T>: ToSql,
{
    fn into_param(self) -> Param {
        Param::list(self)
    }
}

impl<T> IntoParam for &[T]
where
    T: ToSql + Clone + Send + Sync + 'static,
    Vec<T>: ToSql,
{
    fn into_param(self) -> Param {
        Param::list(self.to_vec())
    }
}

impl<T, const N: usize> IntoParam for [T; N]
where
    T: ToSql + Clone + Send + Sync + 'static,
    Vec<T>: ToSql,
{
    fn into_param(self) -> Param {
        Param::list(self.to_vec())
    }
}
