/// Payload data that passed a schema guard.
///
/// `Validated<T>` is the only form in which schema-checked data reaches a
/// handler. It cannot be built outside this crate, so a handler that declares
/// a `Validated<T>` input knows a schema guard ran for it on this request.
///
/// # Access
///
/// - [`AsRef::as_ref`] or [`get`](Self::get): borrow the data
/// - [`into_inner`](Self::into_inner): consume and extract it
///
/// There is deliberately no `Deref`: field access goes through the typed
/// struct, never through ambient lookup by name.
///
/// External callers cannot create one:
///
/// ```compile_fail
/// use guard_chain::Validated;
///
/// let data = Validated::new_unchecked(5u8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T> {
    inner: T,
}

impl<T> Validated<T> {
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrows the validated data.
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Consumes the wrapper and returns the data.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Validated<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
