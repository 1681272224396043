use std::{
    fmt::Debug,
    marker::PhantomData
};

// std::default_delete<T>
// Empty in every standard library, so unique_ptr folds it away (EBO / compressed pair)
#[repr(C)]
pub struct DefaultDelete<T> {
    _marker: PhantomData<fn(*mut T)>
}

impl<T> DefaultDelete<T> {
    pub const fn new() -> Self { Self { _marker: PhantomData } }
}

impl<T> Default for DefaultDelete<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Clone for DefaultDelete<T> {
    fn clone(&self) -> Self { Self::new() }
}

impl<T> Copy for DefaultDelete<T> {}

impl<T> Debug for DefaultDelete<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DefaultDelete")
    }
}
