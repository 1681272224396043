use crate::generic::{
    deleter::DefaultDelete,
    layout::PointerLayout,
    simple::SimpleUniquePtr
};
use std::{
    fmt::Debug,
    mem::offset_of,
    ptr
};

// std::unique_ptr<T, D>
// std::__uniq_ptr_impl keeps a std::tuple<pointer, D>. libstdc++'s tuple stores its elements
// last to first, so a stateful deleter sits ahead of the pointer. An empty one takes no space.
#[repr(C)]
pub struct UniquePtr<T, D = DefaultDelete<T>> {
    deleter: D,
    ptr: *mut T // _M_t._M_head_impl
}

impl<T> UniquePtr<T> {
    pub const fn null() -> Self { Self::from_raw(ptr::null_mut()) }
    pub const fn from_raw(ptr: *mut T) -> Self { Self::from_raw_in(ptr, DefaultDelete::new()) }
}

impl<T, D> UniquePtr<T, D> {
    pub const fn from_raw_in(ptr: *mut T, deleter: D) -> Self { Self { deleter, ptr } }
    pub fn get_ptr(&self) -> *mut T { self.ptr }
    pub fn get_deleter(&self) -> &D { &self.deleter }
    pub fn is_null(&self) -> bool { self.ptr.is_null() }
    pub fn into_raw_parts(self) -> (*mut T, D) { (self.ptr, self.deleter) }
}

impl<T, D> PointerLayout for UniquePtr<T, D> {
    const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
}

impl<T> From<SimpleUniquePtr<T>> for UniquePtr<T> {
    fn from(value: SimpleUniquePtr<T>) -> Self { Self::from_raw(value.into_raw()) }
}

impl<T> From<UniquePtr<T>> for SimpleUniquePtr<T> {
    fn from(value: UniquePtr<T>) -> Self { Self::from_raw(value.ptr) }
}

impl<T, D> Debug for UniquePtr<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UniquePtr {{ ptr: {:p} }}", self.ptr)
    }
}
