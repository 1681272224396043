use crate::generic::pointee::{ LargeAggregate, Opaque, OverAligned, WordSized };

#[cfg(target_env = "msvc")]
pub use crate::msvc::{
    shared_ptr::{ RefCountObject as InplaceBlock, SharedPtr, WeakPtr },
    unique_ptr::UniquePtr,
    MsvcStl as Native
};

#[cfg(all(
    not(target_env = "msvc"),
    any(feature = "libcxx", target_vendor = "apple", target_os = "android", target_os = "freebsd", target_os = "openbsd")
))]
pub use crate::clang::{
    shared_ptr::{ SharedPtrEmplace as InplaceBlock, SharedPtr, WeakPtr },
    unique_ptr::UniquePtr,
    Libcxx as Native
};

#[cfg(all(
    not(target_env = "msvc"),
    not(any(feature = "libcxx", target_vendor = "apple", target_os = "android", target_os = "freebsd", target_os = "openbsd"))
))]
pub use crate::gcc::{
    shared_ptr::{ SpCountedPtrInplace as InplaceBlock, SharedPtr, WeakPtr },
    unique_ptr::UniquePtr,
    Libstdcxx as Native
};

crate::assert_placeholders!(crate::gcc::Libstdcxx => i32, WordSized, LargeAggregate, OverAligned, Opaque);
crate::assert_placeholders!(crate::clang::Libcxx => i32, WordSized, LargeAggregate, OverAligned, Opaque);
crate::assert_placeholders!(crate::msvc::MsvcStl => i32, WordSized, LargeAggregate, OverAligned, Opaque);

#[cfg(test)]
pub mod tests {
    use super::{ InplaceBlock, Native, SharedPtr, UniquePtr, WeakPtr };
    use crate::generic::{
        layout::{ check_placeholders, PointerAbi },
        simple::{ SimpleSharedPtr, SimpleUniquePtr, SimpleWeakPtr }
    };
    use std::{
        error::Error,
        ffi::c_void
    };

    type TestReturn = Result<(), Box<dyn Error>>;

    // What a generated binding for `std::shared_ptr<int> GetHandle()` turns into
    extern "C" fn get_handle(ptr: *mut i32, count: *mut c_void) -> SimpleSharedPtr<i32> {
        SimpleSharedPtr::from_raw_parts(ptr, count)
    }

    #[test]
    fn host_abi_is_selected() -> TestReturn {
        let name = <Native as PointerAbi>::NAME;
        #[cfg(target_env = "msvc")]
        assert_eq!(name, "MSVC STL");
        #[cfg(target_os = "linux")]
        assert!(name == "libstdc++" || cfg!(feature = "libcxx"), "Linux should default to libstdc++, got {}", name);
        #[cfg(any(target_vendor = "apple", target_os = "android", target_os = "freebsd", target_os = "openbsd"))]
        assert_eq!(name, "libc++");
        #[cfg(all(feature = "libcxx", not(target_env = "msvc")))]
        assert_eq!(name, "libc++", "libcxx feature should select libc++");
        check_placeholders::<Native, i32>()?;
        Ok(())
    }

    #[test]
    #[cfg(all(target_pointer_width = "64", not(windows)))]
    fn inplace_value_offset_follows_host_abi() -> TestReturn {
        let expected = match <Native as PointerAbi>::NAME {
            "libc++" => 24,
            "libstdc++" => 20,
            name => return Err(format!("Unexpected native ABI {}", name).into())
        };
        assert_eq!(InplaceBlock::<i32>::value_offset(), expected, "make_shared value offset should match the host library");
        Ok(())
    }

    #[test]
    fn handle_from_binding() -> TestReturn {
        let mut block = InplaceBlock::new(42);
        let handle = get_handle(block.value_ptr(), block.base_mut() as *mut c_void);
        assert!(!handle.is_null(), "Handle returned over the boundary should not be null");
        let shared = SharedPtr::from(handle);
        unsafe {
            assert_eq!(shared.use_count(), 1, "Handle should see the block's single owner");
            assert_eq!(shared.get(), Some(&42), "Handle should point at the block's value");
        }
        let weak = WeakPtr::from(SimpleWeakPtr::from_raw_parts(shared.get_ptr(), shared.get_rep() as *mut _));
        assert!(unsafe { !weak.expired() }, "WeakPtr to a live block should not be expired");
        Ok(())
    }

    #[test]
    fn unique_handle_round_trip() -> TestReturn {
        let mut value = [7u64; 4];
        let unique = UniquePtr::from(SimpleUniquePtr::from_raw(&raw mut value));
        assert_eq!(unique.get_ptr(), &raw mut value);
        let handle: SimpleUniquePtr<[u64; 4]> = unique.into();
        assert_eq!(handle.into_raw(), &raw mut value);
        Ok(())
    }
}
