//! libstdc++'s `std::shared_ptr` and `std::weak_ptr` (bits/shared_ptr_base.h)

use crate::{
    gcc::unique_ptr::UniquePtr,
    generic::{
        layout::{ CountedLayout, PointerAbi, PointerLayout },
        simple::{ SimpleSharedPtr, SimpleWeakPtr }
    }
};
use allocator_api2::alloc::{ Allocator, Global };
use std::{
    ffi::c_void,
    fmt::Debug,
    mem::{ offset_of, size_of, MaybeUninit },
    ptr,
    sync::atomic::{ AtomicI32, Ordering }
};

/// GNU libstdc++, the default on Linux and MinGW.
pub struct Libstdcxx;

impl PointerAbi for Libstdcxx {
    const NAME: &'static str = "libstdc++";
    type SharedPtr<T> = SharedPtr<T>;
    type UniquePtr<T> = UniquePtr<T>;
    type WeakPtr<T> = WeakPtr<T>;
}

// std::_Sp_counted_base<_S_atomic>
#[repr(C)]
pub struct SpCountedBase {
    // Self::_M_dispose
    // Self::_M_destroy
    // Self::_M_get_deleter
    _cpp_vtable: *const u8,
    use_count: AtomicI32, // _M_use_count
    weak_count: AtomicI32 // _M_weak_count, weak refs + (use_count != 0)
}

impl SpCountedBase {
    pub const fn new(_cpp_vtable: *const u8) -> Self {
        Self {
            _cpp_vtable,
            use_count: AtomicI32::new(1),
            weak_count: AtomicI32::new(1)
        }
    }
    pub fn get_vtable(&self) -> *const u8 { self._cpp_vtable }
    pub fn use_count(&self) -> usize { self.use_count.load(Ordering::SeqCst) as usize }
    pub fn weak_count(&self) -> usize { self.weak_count.load(Ordering::SeqCst) as usize }
}

// std::_Sp_counted_ptr_inplace<T, A, _S_atomic>, what make_shared/allocate_shared allocate
#[repr(C)]
pub struct SpCountedPtrInplace<T, A = Global>
where A: Allocator + Clone
{
    base: SpCountedBase,
    _impl: u8, // _M_impl wraps the allocator, but an empty member still takes a byte
    _allocator: A,
    storage: MaybeUninit<T> // _M_storage
}

impl<T> SpCountedPtrInplace<T, Global> {
    pub fn new(value: T) -> Self { Self::new_in(value, Global) }
}

impl<T, A> SpCountedPtrInplace<T, A>
where A: Allocator + Clone
{
    const ALLOCATOR_IS_EMPTY: () = assert!(size_of::<A>() == 0, "Allocator must be zero-sized!");

    pub fn new_in(value: T, alloc: A) -> Self {
        let () = Self::ALLOCATOR_IS_EMPTY;
        Self {
            base: SpCountedBase::new(ptr::null()),
            _impl: 0,
            _allocator: alloc,
            storage: MaybeUninit::new(value)
        }
    }

    /// Distance from the control block to the object, i.e. `_M_ptr - _M_pi` after make_shared
    pub const fn value_offset() -> usize { offset_of!(Self, storage) }

    pub fn base(&self) -> &SpCountedBase { &self.base }
    pub fn base_mut(&mut self) -> *mut SpCountedBase { &raw mut self.base }
    pub fn value_ptr(&mut self) -> *mut T { self.storage.as_mut_ptr() }
    pub fn get_allocator(&self) -> &A { &self._allocator }
}

impl<T, A> Drop for SpCountedPtrInplace<T, A>
where A: Allocator + Clone
{
    fn drop(&mut self) {
        // _M_dispose has already run once the last owner let go
        if self.base.use_count() > 0 {
            unsafe { self.storage.assume_init_drop() }
        }
    }
}

// std::__shared_count<_S_atomic>
#[repr(C)]
pub struct SharedCount {
    pi: *mut SpCountedBase // _M_pi
}

// std::__weak_count<_S_atomic>
#[repr(C)]
pub struct WeakCount {
    pi: *mut SpCountedBase // _M_pi
}

// std::shared_ptr<T>, all state lives in its std::__shared_ptr<T> base
#[repr(C)]
pub struct SharedPtr<T> {
    ptr: *mut T, // _M_ptr
    refcount: SharedCount // _M_refcount
}

impl<T> SharedPtr<T> {
    pub const fn null() -> Self { Self::from_raw_parts(ptr::null_mut(), ptr::null_mut()) }

    pub const fn from_raw_parts(ptr: *mut T, rep: *mut SpCountedBase) -> Self {
        Self { ptr, refcount: SharedCount { pi: rep } }
    }

    pub fn get_ptr(&self) -> *mut T { self.ptr }
    pub fn get_rep(&self) -> *mut SpCountedBase { self.refcount.pi }
    pub fn is_null(&self) -> bool { self.ptr.is_null() }

    /// # Safety
    /// The control block, if any, must still be allocated.
    pub unsafe fn use_count(&self) -> usize {
        match unsafe { self.refcount.pi.as_ref() } {
            Some(rep) => rep.use_count(),
            None => 0
        }
    }

    /// # Safety
    /// The pointee, if any, must be alive and not mutated for the returned lifetime.
    pub unsafe fn get(&self) -> Option<&T> { unsafe { self.ptr.as_ref() } }
}

impl<T> PointerLayout for SharedPtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
}

impl<T> CountedLayout for SharedPtr<T> {
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, refcount);
}

impl<T> From<SimpleSharedPtr<T>> for SharedPtr<T> {
    fn from(value: SimpleSharedPtr<T>) -> Self {
        let (ptr, count) = value.into_raw_parts();
        Self::from_raw_parts(ptr, count as *mut SpCountedBase)
    }
}

impl<T> From<SharedPtr<T>> for SimpleSharedPtr<T> {
    fn from(value: SharedPtr<T>) -> Self {
        Self::from_raw_parts(value.ptr, value.refcount.pi as *mut c_void)
    }
}

impl<T> Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedPtr {{ ptr: {:p}, rep: {:p} }}", self.ptr, self.refcount.pi)
    }
}

// std::weak_ptr<T> (std::__weak_ptr<T>)
#[repr(C)]
pub struct WeakPtr<T> {
    ptr: *mut T, // _M_ptr
    refcount: WeakCount // _M_refcount
}

impl<T> WeakPtr<T> {
    pub const fn null() -> Self { Self::from_raw_parts(ptr::null_mut(), ptr::null_mut()) }

    pub const fn from_raw_parts(ptr: *mut T, rep: *mut SpCountedBase) -> Self {
        Self { ptr, refcount: WeakCount { pi: rep } }
    }

    pub fn get_ptr(&self) -> *mut T { self.ptr }
    pub fn get_rep(&self) -> *mut SpCountedBase { self.refcount.pi }

    /// # Safety
    /// The control block, if any, must still be allocated.
    pub unsafe fn use_count(&self) -> usize {
        match unsafe { self.refcount.pi.as_ref() } {
            Some(rep) => rep.use_count(),
            None => 0
        }
    }

    /// # Safety
    /// See [`WeakPtr::use_count`].
    pub unsafe fn expired(&self) -> bool { unsafe { self.use_count() == 0 } }

    /// # Safety
    /// See [`SharedPtr::get`]. Nothing is locked: an owner on another thread can still
    /// release the object.
    pub unsafe fn get(&self) -> Option<&T> {
        match unsafe { self.expired() } {
            true => None,
            false => unsafe { self.ptr.as_ref() }
        }
    }
}

impl<T> PointerLayout for WeakPtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
}

impl<T> CountedLayout for WeakPtr<T> {
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, refcount);
}

impl<T> From<SimpleWeakPtr<T>> for WeakPtr<T> {
    fn from(value: SimpleWeakPtr<T>) -> Self {
        let (ptr, count) = value.into_raw_parts();
        Self::from_raw_parts(ptr, count as *mut SpCountedBase)
    }
}

impl<T> From<WeakPtr<T>> for SimpleWeakPtr<T> {
    fn from(value: WeakPtr<T>) -> Self {
        Self::from_raw_parts(value.ptr, value.refcount.pi as *mut c_void)
    }
}

impl<T> Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeakPtr {{ ptr: {:p}, rep: {:p} }}", self.ptr, self.refcount.pi)
    }
}
