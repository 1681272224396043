use crate::generic::simple::{ PointerKind, SimpleSharedPtr, SimpleUniquePtr, SimpleWeakPtr };
use std::{
    any::type_name,
    fmt::Display,
    mem::{ align_of, size_of }
};
use thiserror::Error;

// Read straight out of the C++ probe, see cpp/layout_probe.cpp
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CppLayout {
    pub size: usize,
    pub align: usize
}

impl CppLayout {
    pub const fn new(size: usize, align: usize) -> Self { Self { size, align } }
    pub const fn of<T>() -> Self { Self::new(size_of::<T>(), align_of::<T>()) }
}

impl Display for CppLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes, align {}", self.size, self.align)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutProperty {
    Size,
    Align,
    PointeeOffset,
    ControlBlockOffset
}

impl Display for LayoutProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Size => "size",
            Self::Align => "alignment",
            Self::PointeeOffset => "pointee offset",
            Self::ControlBlockOffset => "control block offset"
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{placeholder}<{pointee}>: {property} is {found}, {real}<{pointee}> on {abi} has {expected}")]
pub struct LayoutMismatch {
    pub abi: &'static str,
    pub placeholder: &'static str,
    pub real: &'static str,
    pub pointee: &'static str,
    pub property: LayoutProperty,
    pub expected: usize,
    pub found: usize
}

/// Where a pointer object keeps the address of its pointee.
pub trait PointerLayout: Sized {
    const POINTEE_OFFSET: usize;
}

/// Pointer objects that also carry the address of a reference count block.
pub trait CountedLayout: PointerLayout {
    const CONTROL_BLOCK_OFFSET: usize;
}

/// A C++ standard library's smart pointers, as layout mirrors.
pub trait PointerAbi {
    const NAME: &'static str;
    type SharedPtr<T>: CountedLayout;
    type UniquePtr<T>: PointerLayout;
    type WeakPtr<T>: CountedLayout;
}

struct Checker {
    abi: &'static str,
    pointee: &'static str
}

impl Checker {
    fn compare(&self, kind: PointerKind, property: LayoutProperty, expected: usize, found: usize) -> Result<(), LayoutMismatch> {
        if expected == found {
            return Ok(());
        }
        Err(LayoutMismatch {
            abi: self.abi,
            placeholder: kind.placeholder_name(),
            real: kind.std_name(),
            pointee: self.pointee,
            property,
            expected,
            found
        })
    }

    fn layout(&self, kind: PointerKind, placeholder: CppLayout, real: CppLayout) -> Result<(), LayoutMismatch> {
        self.compare(kind, LayoutProperty::Size, real.size, placeholder.size)?;
        self.compare(kind, LayoutProperty::Align, real.align, placeholder.align)
    }

    fn pointer<P, R>(&self, kind: PointerKind) -> Result<(), LayoutMismatch>
    where P: PointerLayout,
          R: PointerLayout
    {
        self.layout(kind, CppLayout::of::<P>(), CppLayout::of::<R>())?;
        self.compare(kind, LayoutProperty::PointeeOffset, R::POINTEE_OFFSET, P::POINTEE_OFFSET)
    }

    fn counted<P, R>(&self, kind: PointerKind) -> Result<(), LayoutMismatch>
    where P: CountedLayout,
          R: CountedLayout
    {
        self.pointer::<P, R>(kind)?;
        self.compare(kind, LayoutProperty::ControlBlockOffset, R::CONTROL_BLOCK_OFFSET, P::CONTROL_BLOCK_OFFSET)
    }
}

/// Compare one placeholder's measured layout against the real type's, e.g. as reported by
/// the C++ compiler.
pub fn compare_layouts(kind: PointerKind, abi: &'static str, pointee: &'static str,
    placeholder: CppLayout, real: CppLayout) -> Result<(), LayoutMismatch>
{
    Checker { abi, pointee }.layout(kind, placeholder, real)
}

/// Runtime version of [`assert_placeholders!`](crate::assert_placeholders) for one pointee.
pub fn check_placeholders<A, T>() -> Result<(), LayoutMismatch>
where A: PointerAbi
{
    let checker = Checker { abi: A::NAME, pointee: type_name::<T>() };
    log::trace!("checking placeholders against {} for {}", checker.abi, checker.pointee);
    checker.counted::<SimpleSharedPtr<T>, A::SharedPtr<T>>(PointerKind::Shared)?;
    checker.pointer::<SimpleUniquePtr<T>, A::UniquePtr<T>>(PointerKind::Unique)?;
    checker.counted::<SimpleWeakPtr<T>, A::WeakPtr<T>>(PointerKind::Weak)?;
    log::debug!("placeholders match {} for {} ({})", checker.abi, checker.pointee,
        CppLayout::of::<A::SharedPtr<T>>());
    Ok(())
}

/// Fail the build unless two types have the same size and alignment.
///
/// ```
/// use simple_ptr::{ assert_layout_eq, gcc::shared_ptr::SharedPtr, generic::simple::SimpleSharedPtr };
///
/// assert_layout_eq!(SimpleSharedPtr<u64>, SharedPtr<u64>);
/// ```
///
/// ```compile_fail
/// use simple_ptr::{ assert_layout_eq, gcc::shared_ptr::SharedPtr };
///
/// #[repr(C)]
/// struct MissingControlBlock<T> {
///     ptr: *mut T
/// }
///
/// assert_layout_eq!(MissingControlBlock<i32>, SharedPtr<i32>);
/// ```
#[macro_export]
macro_rules! assert_layout_eq {
    ($placeholder:ty, $real:ty $(,)?) => {
        const _: () = {
            assert!(::core::mem::size_of::<$placeholder>() == ::core::mem::size_of::<$real>(),
                concat!("layout mismatch: size of ", stringify!($placeholder), " differs from ", stringify!($real)));
            assert!(::core::mem::align_of::<$placeholder>() == ::core::mem::align_of::<$real>(),
                concat!("layout mismatch: alignment of ", stringify!($placeholder), " differs from ", stringify!($real)));
        };
    };
}

/// Fail the build unless all three placeholders match `$abi`'s mirrors for every listed
/// pointee: size, alignment, pointee offset and (shared/weak) control block offset.
#[macro_export]
macro_rules! assert_placeholders {
    ($abi:ty => $($pointee:ty),+ $(,)?) => {
        $(
            $crate::__assert_placeholder!(counted: $abi, $pointee, SimpleSharedPtr, SharedPtr,
                "simple_shared_ptr", "std::shared_ptr");
            $crate::__assert_placeholder!(plain: $abi, $pointee, SimpleUniquePtr, UniquePtr,
                "simple_unique_ptr", "std::unique_ptr");
            $crate::__assert_placeholder!(counted: $abi, $pointee, SimpleWeakPtr, WeakPtr,
                "simple_weak_ptr", "std::weak_ptr");
        )+
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __assert_placeholder {
    (plain: $abi:ty, $pointee:ty, $simple:ident, $real:ident, $name:literal, $std:literal) => {
        const _: () = {
            use $crate::generic::layout::{ PointerAbi, PointerLayout };
            type Simple = $crate::generic::simple::$simple<$pointee>;
            type Real = <$abi as PointerAbi>::$real<$pointee>;
            assert!(::core::mem::size_of::<Simple>() == ::core::mem::size_of::<Real>(),
                concat!($name, "<", stringify!($pointee), ">: size differs from ", $std, " on ", stringify!($abi)));
            assert!(::core::mem::align_of::<Simple>() == ::core::mem::align_of::<Real>(),
                concat!($name, "<", stringify!($pointee), ">: alignment differs from ", $std, " on ", stringify!($abi)));
            assert!(<Simple as PointerLayout>::POINTEE_OFFSET == <Real as PointerLayout>::POINTEE_OFFSET,
                concat!($name, "<", stringify!($pointee), ">: pointee offset differs from ", $std, " on ", stringify!($abi)));
        };
    };
    (counted: $abi:ty, $pointee:ty, $simple:ident, $real:ident, $name:literal, $std:literal) => {
        $crate::__assert_placeholder!(plain: $abi, $pointee, $simple, $real, $name, $std);
        const _: () = {
            use $crate::generic::layout::{ CountedLayout, PointerAbi };
            type Simple = $crate::generic::simple::$simple<$pointee>;
            type Real = <$abi as PointerAbi>::$real<$pointee>;
            assert!(<Simple as CountedLayout>::CONTROL_BLOCK_OFFSET == <Real as CountedLayout>::CONTROL_BLOCK_OFFSET,
                concat!($name, "<", stringify!($pointee), ">: control block offset differs from ", $std, " on ", stringify!($abi)));
        };
    };
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::{
        clang::Libcxx,
        gcc::Libstdcxx,
        generic::pointee::{ LargeAggregate, Opaque, OverAligned, WordSized },
        msvc::MsvcStl
    };
    use std::{
        error::Error,
        mem::offset_of
    };

    type TestReturn = Result<(), Box<dyn Error>>;

    // Shared pointer that forgot its control block
    #[repr(C)]
    pub struct Truncated<T> {
        ptr: *mut T
    }
    impl<T> PointerLayout for Truncated<T> {
        const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
    }
    impl<T> CountedLayout for Truncated<T> {
        const CONTROL_BLOCK_OFFSET: usize = 0;
    }

    // Unique pointer with its fields the wrong way around
    #[repr(C)]
    pub struct Swapped<T> {
        deleter: usize,
        ptr: *mut T
    }
    impl<T> PointerLayout for Swapped<T> {
        const POINTEE_OFFSET: usize = offset_of!(Self, ptr);
    }

    struct TruncatedShared;
    impl PointerAbi for TruncatedShared {
        const NAME: &'static str = "truncated";
        type SharedPtr<T> = Truncated<T>;
        type UniquePtr<T> = <Libstdcxx as PointerAbi>::UniquePtr<T>;
        type WeakPtr<T> = <Libstdcxx as PointerAbi>::WeakPtr<T>;
    }

    struct StatefulUnique;
    impl PointerAbi for StatefulUnique {
        const NAME: &'static str = "stateful";
        type SharedPtr<T> = <Libstdcxx as PointerAbi>::SharedPtr<T>;
        type UniquePtr<T> = Swapped<T>;
        type WeakPtr<T> = <Libstdcxx as PointerAbi>::WeakPtr<T>;
    }

    fn check_all<A: PointerAbi>() -> TestReturn {
        check_placeholders::<A, i32>()?;
        check_placeholders::<A, WordSized>()?;
        check_placeholders::<A, LargeAggregate>()?;
        check_placeholders::<A, OverAligned>()?;
        check_placeholders::<A, Opaque>()?;
        Ok(())
    }

    #[test]
    fn placeholders_match_every_abi() -> TestReturn {
        let _ = env_logger::builder().is_test(true).try_init();
        check_all::<Libstdcxx>()?;
        check_all::<Libcxx>()?;
        check_all::<MsvcStl>()?;
        Ok(())
    }

    #[test]
    fn missing_control_block_is_reported() -> TestReturn {
        let err = check_placeholders::<TruncatedShared, i32>().err()
            .ok_or("Truncated shared_ptr should not match simple_shared_ptr")?;
        assert_eq!(err.placeholder, "simple_shared_ptr", "Mismatch should name the shared placeholder");
        assert_eq!(err.real, "std::shared_ptr");
        assert_eq!(err.property, LayoutProperty::Size, "Size should be the first property to diverge");
        assert_eq!(err.expected, size_of::<*const u8>());
        assert_eq!(err.found, 2 * size_of::<*const u8>());
        let message = err.to_string();
        assert!(message.starts_with("simple_shared_ptr<i32>: size"), "Unexpected message {}", message);
        Ok(())
    }

    #[test]
    fn stateful_unique_is_reported() -> TestReturn {
        let err = check_placeholders::<StatefulUnique, u8>().err()
            .ok_or("Two-word unique_ptr should not match simple_unique_ptr")?;
        assert_eq!(err.placeholder, "simple_unique_ptr");
        assert_eq!(err.property, LayoutProperty::Size);
        Ok(())
    }

    #[test]
    fn compare_measured_layouts() -> TestReturn {
        let word = size_of::<*const u8>();
        let good = CppLayout::new(2 * word, word);
        compare_layouts(PointerKind::Weak, "probe", "int", good, good)?;
        let err = compare_layouts(PointerKind::Weak, "probe", "int", good, CppLayout::new(2 * word, 2 * word)).err()
            .ok_or("Different alignment should be reported")?;
        assert_eq!(err.property, LayoutProperty::Align);
        assert_eq!(err.to_string(),
            format!("simple_weak_ptr<int>: alignment is {}, std::weak_ptr<int> on probe has {}", word, 2 * word));
        Ok(())
    }

    #[test]
    fn layout_of_tracks_size_and_align() -> TestReturn {
        assert_eq!(CppLayout::of::<OverAligned>(), CppLayout::new(64, 64));
        assert_eq!(CppLayout::of::<u16>().to_string(), "2 bytes, align 2");
        Ok(())
    }
}
