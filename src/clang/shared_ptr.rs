//! libc++'s `std::shared_ptr` and `std::weak_ptr` (__memory/shared_ptr.h)

use crate::{
    clang::unique_ptr::UniquePtr,
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
    sync::atomic::Ordering
};

// long: 32 bits on LLP64
#[cfg(windows)]
type AtomicLong = std::sync::atomic::AtomicI32;
#[cfg(not(windows))]
type AtomicLong = std::sync::atomic::AtomicIsize;

/// LLVM libc++, the default on Apple platforms and Android.
pub struct Libcxx;

impl PointerAbi for Libcxx {
    const NAME: &'static str = "libc++";
    type SharedPtr<T> = SharedPtr<T>;
    type UniquePtr<T> = UniquePtr<T>;
    type WeakPtr<T> = WeakPtr<T>;
}

// std::__shared_weak_count, flattened with its std::__shared_count base
// Both counts are stored minus one: a block with a single owner holds zeros.
#[repr(C)]
pub struct SharedWeakCount {
    // Self::~__shared_weak_count
    // Self::__on_zero_shared
    // Self::__get_deleter
    // Self::__on_zero_shared_weak
    _cpp_vtable: *const u8,
    shared_owners: AtomicLong, // __shared_owners_
    shared_weak_owners: AtomicLong // __shared_weak_owners_
}

impl SharedWeakCount {
    pub const fn new(_cpp_vtable: *const u8) -> Self {
        Self {
            _cpp_vtable,
            shared_owners: AtomicLong::new(0),
            shared_weak_owners: AtomicLong::new(0)
        }
    }
    pub fn get_vtable(&self) -> *const u8 { self._cpp_vtable }
    pub fn use_count(&self) -> usize {
        (self.shared_owners.load(Ordering::SeqCst) as isize + 1) as usize
    }
    pub fn weak_count(&self) -> usize {
        (self.shared_weak_owners.load(Ordering::SeqCst) as isize + 1) as usize
    }
}

// std::__shared_ptr_emplace<T, A>, what make_shared/allocate_shared allocate
// _Storage holds a __compressed_pair<A, T>, so an empty allocator folds into the value.
#[repr(C)]
pub struct SharedPtrEmplace<T, A = Global>
where A: Allocator + Clone
{
    base: SharedWeakCount,
    _allocator: A,
    storage: MaybeUninit<T> // __storage_
}

impl<T> SharedPtrEmplace<T, Global> {
    pub fn new(value: T) -> Self { Self::new_in(value, Global) }
}

impl<T, A> SharedPtrEmplace<T, A>
where A: Allocator + Clone
{
    const ALLOCATOR_IS_EMPTY: () = assert!(size_of::<A>() == 0, "Allocator must be zero-sized!");

    pub fn new_in(value: T, alloc: A) -> Self {
        let () = Self::ALLOCATOR_IS_EMPTY;
        Self {
            base: SharedWeakCount::new(ptr::null()),
            _allocator: alloc,
            storage: MaybeUninit::new(value)
        }
    }

    /// Distance from the control block to the object, i.e. `__ptr_ - __cntrl_` after make_shared
    pub const fn value_offset() -> usize { offset_of!(Self, storage) }

    pub fn base(&self) -> &SharedWeakCount { &self.base }
    pub fn base_mut(&mut self) -> *mut SharedWeakCount { &raw mut self.base }
    pub fn value_ptr(&mut self) -> *mut T { self.storage.as_mut_ptr() }
    pub fn get_allocator(&self) -> &A { &self._allocator }
}

impl<T, A> Drop for SharedPtrEmplace<T, A>
where A: Allocator + Clone
{
    fn drop(&mut self) {
        // __shared_owners_ drops to -1 once __on_zero_shared has run
        if self.base.shared_owners.load(Ordering::SeqCst) >= 0 {
            unsafe { self.storage.assume_init_drop() }
        }
    }
}

// std::shared_ptr<T>
#[repr(C)]
pub struct SharedPtr<T> {
    ptr: *mut T, // __ptr_
    cntrl: *mut SharedWeakCount // __cntrl_
}

impl<T> SharedPtr<T> {
    pub const fn null() -> Self { Self::from_raw_parts(ptr::null_mut(), ptr::null_mut()) }
    pub const fn from_raw_parts(ptr: *mut T, cntrl: *mut SharedWeakCount) -> Self { Self { ptr, cntrl } }

    pub fn get_ptr(&self) -> *mut T { self.ptr }
    pub fn get_rep(&self) -> *mut SharedWeakCount { self.cntrl }
    pub fn is_null(&self) -> bool { self.ptr.is_null() }

    /// # Safety
    /// The control block, if any, must still be allocated.
    pub unsafe fn use_count(&self) -> usize {
        match unsafe { self.cntrl.as_ref() } {
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
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, cntrl);
}

impl<T> From<SimpleSharedPtr<T>> for SharedPtr<T> {
    fn from(value: SimpleSharedPtr<T>) -> Self {
        let (ptr, count) = value.into_raw_parts();
        Self::from_raw_parts(ptr, count as *mut SharedWeakCount)
    }
}

impl<T> From<SharedPtr<T>> for SimpleSharedPtr<T> {
    fn from(value: SharedPtr<T>) -> Self {
        Self::from_raw_parts(value.ptr, value.cntrl as *mut c_void)
    }
}

impl<T> Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedPtr {{ ptr: {:p}, cntrl: {:p} }}", self.ptr, self.cntrl)
    }
}

// std::weak_ptr<T>
#[repr(C)]
pub struct WeakPtr<T> {
    ptr: *mut T, // __ptr_
    cntrl: *mut SharedWeakCount // __cntrl_
}

impl<T> WeakPtr<T> {
    pub const fn null() -> Self { Self::from_raw_parts(ptr::null_mut(), ptr::null_mut()) }
    pub const fn from_raw_parts(ptr: *mut T, cntrl: *mut SharedWeakCount) -> Self { Self { ptr, cntrl } }

    pub fn get_ptr(&self) -> *mut T { self.ptr }
    pub fn get_rep(&self) -> *mut SharedWeakCount { self.cntrl }

    /// # Safety
    /// The control block, if any, must still be allocated.
    pub unsafe fn use_count(&self) -> usize {
        match unsafe { self.cntrl.as_ref() } {
            Some(rep) => rep.use_count(),
            None => 0
        }
    }

    /// # Safety
    /// See [`WeakPtr::use_count`].
    pub unsafe fn expired(&self) -> bool { unsafe { self.use_count() == 0 } }

    /// # Safety
    /// See [`SharedPtr::get`]. Nothing is locked.
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
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, cntrl);
}

impl<T> From<SimpleWeakPtr<T>> for WeakPtr<T> {
    fn from(value: SimpleWeakPtr<T>) -> Self {
        let (ptr, count) = value.into_raw_parts();
        Self::from_raw_parts(ptr, count as *mut SharedWeakCount)
    }
}

impl<T> From<WeakPtr<T>> for SimpleWeakPtr<T> {
    fn from(value: WeakPtr<T>) -> Self {
        Self::from_raw_parts(value.ptr, value.cntrl as *mut c_void)
    }
}

impl<T> Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeakPtr {{ ptr: {:p}, cntrl: {:p} }}", self.ptr, self.cntrl)
    }
}
