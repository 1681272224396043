use crate::{
    generic::{
        layout::{ CountedLayout, PointerAbi, PointerLayout },
        simple::{ SimpleSharedPtr, SimpleWeakPtr }
    },
    msvc::unique_ptr::UniquePtr
};
use allocator_api2::alloc::{ Allocator, Global };
use std::{
    ffi::c_void,
    fmt::Debug,
    mem::{ offset_of, size_of, MaybeUninit },
    ptr,
    sync::atomic::{ AtomicU32, Ordering }
};

/// Microsoft's STL, shipped with MSVC.
pub struct MsvcStl;

impl PointerAbi for MsvcStl {
    const NAME: &'static str = "MSVC STL";
    type SharedPtr<T> = SharedPtr<T>;
    type UniquePtr<T> = UniquePtr<T>;
    type WeakPtr<T> = WeakPtr<T>;
}

// std::_Ref_count_base
#[repr(C)]
pub struct RefCountBase {
    // Self::_Destroy
    // Self::_Delete_this
    // Self::`scalar_deleting_destructor`
    // Self::_Get_deleter
    _cpp_vtable: *const u8,
    uses: AtomicU32, // _Uses
    weaks: AtomicU32 // _Weaks, weak refs + (uses != 0)
}

impl RefCountBase {
    pub const fn new(_cpp_vtable: *const u8) -> Self {
        Self {
            _cpp_vtable,
            uses: AtomicU32::new(1),
            weaks: AtomicU32::new(1)
        }
    }
    pub fn get_vtable(&self) -> *const u8 { self._cpp_vtable }
    pub fn use_count(&self) -> usize { self.uses.load(Ordering::SeqCst) as usize }
    pub fn weak_count(&self) -> usize { self.weaks.load(Ordering::SeqCst) as usize }
}

// std::_Ref_count_obj2<T>, or std::_Ref_count_obj_alloc3<T, A> with an empty allocator
#[repr(C)]
pub struct RefCountObject<T, A = Global>
where A: Allocator + Clone
{
    base: RefCountBase,
    _allocator: A,
    storage: MaybeUninit<T> // _Storage
}

impl<T> RefCountObject<T, Global> {
    pub fn new(value: T) -> Self { Self::new_in(value, Global) }
}

impl<T, A> RefCountObject<T, A>
where A: Allocator + Clone
{
    const ALLOCATOR_IS_EMPTY: () = assert!(size_of::<A>() == 0, "Allocator must be zero-sized!");

    pub fn new_in(value: T, alloc: A) -> Self {
        let () = Self::ALLOCATOR_IS_EMPTY;
        Self {
            base: RefCountBase::new(ptr::null()),
            _allocator: alloc,
            storage: MaybeUninit::new(value)
        }
    }

    /// Distance from `_Rep` to `_Ptr` after make_shared
    pub const fn value_offset() -> usize { offset_of!(Self, storage) }

    pub fn base(&self) -> &RefCountBase { &self.base }
    pub fn base_mut(&mut self) -> *mut RefCountBase { &raw mut self.base }
    pub fn value_ptr(&mut self) -> *mut T { self.storage.as_mut_ptr() }
    pub fn get_allocator(&self) -> &A { &self._allocator }
}

impl<T, A> Drop for RefCountObject<T, A>
where A: Allocator + Clone
{
    fn drop(&mut self) {
        // _Destroy already ran if the last owner is gone
        if self.base.use_count() > 0 {
            unsafe { self.storage.assume_init_drop() }
        }
    }
}

// std::shared_ptr, state in std::_Ptr_base
#[repr(C)]
pub struct SharedPtr<T> {
    _ptr: *mut T,
    _rep: *mut RefCountBase
}

impl<T> SharedPtr<T> {
    pub const fn null() -> Self { Self::from_raw_parts(ptr::null_mut(), ptr::null_mut()) }
    pub const fn from_raw_parts(_ptr: *mut T, _rep: *mut RefCountBase) -> Self { Self { _ptr, _rep } }

    pub fn get_ptr(&self) -> *mut T { self._ptr }
    pub fn get_rep(&self) -> *mut RefCountBase { self._rep }
    pub fn is_null(&self) -> bool { self._ptr.is_null() }

    /// # Safety
    /// The control block, if any, must still be allocated.
    pub unsafe fn use_count(&self) -> usize {
        match unsafe { self._rep.as_ref() } {
            Some(rep) => rep.use_count(),
            None => 0
        }
    }

    /// # Safety
    /// The pointee, if any, must be alive and not mutated for the returned lifetime.
    pub unsafe fn get(&self) -> Option<&T> { unsafe { self._ptr.as_ref() } }
}

impl<T> PointerLayout for SharedPtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, _ptr);
}

impl<T> CountedLayout for SharedPtr<T> {
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, _rep);
}

impl<T> From<SimpleSharedPtr<T>> for SharedPtr<T> {
    fn from(value: SimpleSharedPtr<T>) -> Self {
        let (ptr, count) = value.into_raw_parts();
        Self::from_raw_parts(ptr, count as *mut RefCountBase)
    }
}

impl<T> From<SharedPtr<T>> for SimpleSharedPtr<T> {
    fn from(value: SharedPtr<T>) -> Self {
        Self::from_raw_parts(value._ptr, value._rep as *mut c_void)
    }
}

impl<T> Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedPtr {{ _ptr: {:p}, _rep: {:p} }}", self._ptr, self._rep)
    }
}

// std::weak_ptr, state in std::_Ptr_base
#[repr(C)]
pub struct WeakPtr<T> {
    _ptr: *mut T,
    _rep: *mut RefCountBase
}

impl<T> WeakPtr<T> {
    pub const fn null() -> Self { Self::from_raw_parts(ptr::null_mut(), ptr::null_mut()) }
    pub const fn from_raw_parts(_ptr: *mut T, _rep: *mut RefCountBase) -> Self { Self { _ptr, _rep } }

    pub fn get_ptr(&self) -> *mut T { self._ptr }
    pub fn get_rep(&self) -> *mut RefCountBase { self._rep }

    /// # Safety
    /// The control block, if any, must still be allocated.
    pub unsafe fn use_count(&self) -> usize {
        match unsafe { self._rep.as_ref() } {
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
            false => unsafe { self._ptr.as_ref() }
        }
    }
}

impl<T> PointerLayout for WeakPtr<T> {
    const POINTEE_OFFSET: usize = offset_of!(Self, _ptr);
}

impl<T> CountedLayout for WeakPtr<T> {
    const CONTROL_BLOCK_OFFSET: usize = offset_of!(Self, _rep);
}

impl<T> From<SimpleWeakPtr<T>> for WeakPtr<T> {
    fn from(value: SimpleWeakPtr<T>) -> Self {
        let (ptr, count) = value.into_raw_parts();
        Self::from_raw_parts(ptr, count as *mut RefCountBase)
    }
}

impl<T> From<WeakPtr<T>> for SimpleWeakPtr<T> {
    fn from(value: WeakPtr<T>) -> Self {
        Self::from_raw_parts(value._ptr, value._rep as *mut c_void)
    }
}

impl<T> Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeakPtr {{ _ptr: {:p}, _rep: {:p} }}", self._ptr, self._rep)
    }
}

#[cfg(test)]
pub mod tests {
    use super::{ RefCountObject, SharedPtr, WeakPtr };
    use crate::generic::simple::SimpleSharedPtr;
    use std::{
        error::Error,
        mem::size_of
    };

    type TestReturn = Result<(), Box<dyn Error>>;

    #[test]
    fn read_make_shared_block() -> TestReturn {
        let mut block = RefCountObject::new(100i32);
        let shared = SharedPtr::from_raw_parts(block.value_ptr(), block.base_mut());
        unsafe {
            assert!(shared.get_ptr() as *const u8 == (shared.get_rep() as *const u8).add(RefCountObject::<i32>::value_offset()),
                "_Ptr in SharedPtr is not contiguous with _Rep");
            assert_eq!(shared.use_count(), 1, "Strong count for a fresh block should be 1");
            assert_eq!(*shared.get().ok_or("SharedPtr should not be null")?, 100);
        }
        assert_eq!(block.base().weak_count(), 1, "Weak count for a fresh block should be 1");
        Ok(())
    }

    #[test]
    fn weak_pointers() -> TestReturn {
        let mut block = RefCountObject::new(200i32);
        let weak = WeakPtr::from_raw_parts(block.value_ptr(), block.base_mut());
        unsafe {
            assert_eq!(weak.use_count(), 1, "Strong count seen through weak_ptr should be 1");
            assert_eq!(weak.get(), Some(200).as_ref(), "Value from weak_ptr should be Some(200)");
        }
        let weak = WeakPtr::<i32>::null();
        unsafe {
            assert_eq!(weak.use_count(), 0, "Strong count for an empty weak_ptr should be 0");
            assert!(weak.get() == None, "Value from an empty weak_ptr should be None");
        }
        Ok(())
    }

    #[test]
    fn convert_placeholder() -> TestReturn {
        let mut block = RefCountObject::new(300i32);
        let simple = SimpleSharedPtr::from_raw_parts(block.value_ptr(), block.base_mut() as *mut _);
        let shared = SharedPtr::from(simple);
        assert_eq!(unsafe { shared.use_count() }, 1);
        let simple = SimpleSharedPtr::from(shared);
        assert_eq!(simple.control_block() as *mut u8, block.base_mut() as *mut u8,
            "_Rep should survive the round trip");
        Ok(())
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn lp64_layout() -> TestReturn {
        assert_eq!(size_of::<SharedPtr<i32>>(), 16, "std::shared_ptr should be two words");
        assert_eq!(size_of::<WeakPtr<i32>>(), 16, "std::weak_ptr should be two words");
        assert_eq!(RefCountObject::<i32>::value_offset(), 0x10, "_Storage should directly follow _Weaks");
        Ok(())
    }
}
