use crate::{
    generic::layout::{ CountedLayout, PointerLayout },
    shim::header::{ self, Substitution }
};
use std::{
    ffi::c_void,
    fmt::Debug,
    mem::offset_of,
    ptr
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Shared,
    Unique,
    Weak
}

impl PointerKind {
    pub const ALL: [PointerKind; 3] = [PointerKind::Shared, PointerKind::Unique, PointerKind::Weak];

    pub fn substitution(self) -> &'static Substitution {
        match self {
            Self::Shared => &header::SHARED_PTR,
            Self::Unique => &header::UNIQUE_PTR,
            Self::Weak => &header::WEAK_PTR
        }
    }

    /// Name of the C++ placeholder template, e.g. `simple_shared_ptr`
    pub fn placeholder_name(self) -> &'static str { self.substitution().placeholder }

    /// Name of the template it stands in for, e.g. `std::shared_ptr`
    pub fn std_name(self) -> &'static str { self.substitution().replaces }
}

// simple_shared_ptr<T>
/// Storage of a `std::shared_ptr<T>` and nothing else. Not `Clone`:
///
/// ```compile_fail
/// use simple_ptr::generic::simple::SimpleSharedPtr;
/// let handle: SimpleSharedPtr<i32> = SimpleSharedPtr::null();
/// let copy = handle.clone();
/// ```
#[repr(C)]
pub struct SimpleSharedPtr<T> {
    ptr: *mut T,
    count: *mut c_void
}

impl<T> SimpleSharedPtr<T> {
    pub const fn null() -> Self {
        Self { ptr: ptr::null_mut(), count: ptr::null_mut() }
    }
    pub const fn from_raw_parts(ptr: *mut T, count: *mut c_void) -> Self {
        Self { ptr, count }
    }
    pub fn as_ptr(&self) -> *mut T { self.ptr }
    pub fn control_block(&self) -> *mut c_void { self.count }
    pub fn is_null(&self) -> bool { self.ptr.is_null() }
    pub fn into_raw_parts(self) -> (*mut T, *mut c_void) { (self.ptr, self.count) }
}

impl<T> PointerLayout for SimpleSharedPtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
}

impl<T> CountedLayout for SimpleSharedPtr<T> {
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, count);
}

impl<T> Debug for SimpleSharedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimpleSharedPtr {{ ptr: {:p}, count: {:p} }}", self.ptr, self.count)
    }
}

// simple_unique_ptr<T>
#[repr(C)]
pub struct SimpleUniquePtr<T> {
    ptr: *mut T
}

impl<T> SimpleUniquePtr<T> {
    pub const fn null() -> Self { Self { ptr: ptr::null_mut() } }
    pub const fn from_raw(ptr: *mut T) -> Self { Self { ptr } }
    pub fn as_ptr(&self) -> *mut T { self.ptr }
    pub fn is_null(&self) -> bool { self.ptr.is_null() }
    pub fn into_raw(self) -> *mut T { self.ptr }
}

impl<T> PointerLayout for SimpleUniquePtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
}

impl<T> Debug for SimpleUniquePtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimpleUniquePtr {{ ptr: {:p} }}", self.ptr)
    }
}

// simple_weak_ptr<T>
// Same shape as simple_shared_ptr, but the count it points at is only weakly held
#[repr(C)]
pub struct SimpleWeakPtr<T> {
    ptr: *mut T,
    count: *mut c_void
}

impl<T> SimpleWeakPtr<T> {
    pub const fn null() -> Self {
        Self { ptr: ptr::null_mut(), count: ptr::null_mut() }
    }
    pub const fn from_raw_parts(ptr: *mut T, count: *mut c_void) -> Self {
        Self { ptr, count }
    }
    pub fn as_ptr(&self) -> *mut T { self.ptr }
    pub fn control_block(&self) -> *mut c_void { self.count }
    pub fn is_null(&self) -> bool { self.count.is_null() }
    pub fn into_raw_parts(self) -> (*mut T, *mut c_void) { (self.ptr, self.count) }
}

impl<T> PointerLayout for SimpleWeakPtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
}

impl<T> CountedLayout for SimpleWeakPtr<T> {
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, count);
}

impl<T> Debug for SimpleWeakPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimpleWeakPtr {{ ptr: {:p}, count: {:p} }}", self.ptr, self.count)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::generic::layout::{ CountedLayout, PointerLayout };
    use std::{
        error::Error,
        mem::size_of
    };

    type TestReturn = Result<(), Box<dyn Error>>;

    #[test]
    fn field_order_matches_header() -> TestReturn {
        let word = size_of::<*const u8>();
        assert_eq!(<SimpleSharedPtr<i32> as PointerLayout>::POINTEE_OFFSET, 0, "ptr should come first");
        assert_eq!(<SimpleSharedPtr<i32> as CountedLayout>::CONTROL_BLOCK_OFFSET, word, "count should follow ptr");
        assert_eq!(<SimpleWeakPtr<i32> as CountedLayout>::CONTROL_BLOCK_OFFSET, word, "count should follow ptr");
        assert_eq!(<SimpleUniquePtr<i32> as PointerLayout>::POINTEE_OFFSET, 0, "ptr should be the only field");
        for kind in PointerKind::ALL {
            let sub = kind.substitution();
            assert_eq!(sub.fields[0].name, "ptr", "{} should start with ptr", sub.placeholder);
            assert_eq!(sub.has_control_block(), kind != PointerKind::Unique,
                "{} control block presence is wrong", sub.placeholder);
        }
        Ok(())
    }

    #[test]
    fn raw_parts_are_kept_verbatim() -> TestReturn {
        let mut value = 7i32;
        let mut block = [0usize; 2];
        let shared = SimpleSharedPtr::from_raw_parts(&raw mut value, block.as_mut_ptr() as *mut c_void);
        assert!(!shared.is_null(), "Handle with a pointee should not be null");
        assert_eq!(shared.as_ptr(), &raw mut value, "Pointee address should be unchanged");
        let (ptr, count) = shared.into_raw_parts();
        assert_eq!(ptr, &raw mut value);
        assert_eq!(count, block.as_mut_ptr() as *mut c_void);

        let unique = SimpleUniquePtr::from_raw(&raw mut value);
        assert_eq!(unique.into_raw(), &raw mut value);
        assert!(SimpleWeakPtr::<i32>::null().is_null(), "null() should produce a null handle");
        Ok(())
    }

    #[test]
    fn names_follow_substitution_table() -> TestReturn {
        assert_eq!(PointerKind::Shared.placeholder_name(), "simple_shared_ptr");
        assert_eq!(PointerKind::Unique.std_name(), "std::unique_ptr");
        assert_eq!(PointerKind::Weak.std_name(), "std::weak_ptr");
        Ok(())
    }
}
