//! # Tagged result container.
//!
//! [`JobValue`] stores a job's result together with the type name recorded at
//! storage time. Retrieval resolves a requested type against the stored value
//! and returns `None` on mismatch instead of failing; the recorded name feeds
//! the queue log ("result of type ... added").

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A job result with its logical type recorded at storage time.
///
/// Cloning is cheap; the value itself is shared behind an `Arc`.
///
/// # Example
/// ```
/// use jobq::JobValue;
///
/// let v = JobValue::new(42i32);
/// assert_eq!(v.get::<i32>(), Some(42));
/// assert_eq!(v.get::<String>(), None);
/// assert_eq!(v.type_name(), "i32");
/// ```
#[derive(Clone)]
pub struct JobValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl JobValue {
    /// Wraps a value, recording its type name.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The type name recorded when the value was stored. Diagnostic only;
    /// retrieval is resolved through the type system, not this string.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the stored value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the stored value as a `T`, or `None` on mismatch.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns an owned copy of the stored value, or `None` on mismatch.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for JobValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JobValue").field(&self.type_name).finish()
    }
}
