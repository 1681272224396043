//! Layouts of the real types as measured by the host C++ compiler.

use crate::generic::{
    layout::{ compare_layouts, CppLayout, LayoutMismatch },
    simple::{ PointerKind, SimpleSharedPtr, SimpleUniquePtr, SimpleWeakPtr }
};

#[allow(non_upper_case_globals)]
extern "C" {
    static simple_ptr_shared_layout: CppLayout;
    static simple_ptr_unique_layout: CppLayout;
    static simple_ptr_weak_layout: CppLayout;
    static simple_ptr_simple_shared_layout: CppLayout;
    static simple_ptr_simple_unique_layout: CppLayout;
    static simple_ptr_simple_weak_layout: CppLayout;
}

const PROBE_ABI: &str = "host C++ compiler";
const PROBE_POINTEE: &str = "int";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasuredLayouts {
    pub shared: CppLayout,
    pub unique: CppLayout,
    pub weak: CppLayout
}

impl MeasuredLayouts {
    pub fn get(&self, kind: PointerKind) -> CppLayout {
        match kind {
            PointerKind::Shared => self.shared,
            PointerKind::Unique => self.unique,
            PointerKind::Weak => self.weak
        }
    }
}

/// `std::shared_ptr<int>`, `std::unique_ptr<int>` and `std::weak_ptr<int>`
pub fn measured() -> MeasuredLayouts {
    unsafe {
        MeasuredLayouts {
            shared: simple_ptr_shared_layout,
            unique: simple_ptr_unique_layout,
            weak: simple_ptr_weak_layout
        }
    }
}

/// The C++ placeholder templates, instantiated on `int`
pub fn measured_placeholders() -> MeasuredLayouts {
    unsafe {
        MeasuredLayouts {
            shared: simple_ptr_simple_shared_layout,
            unique: simple_ptr_simple_unique_layout,
            weak: simple_ptr_simple_weak_layout
        }
    }
}

fn rust_placeholders() -> MeasuredLayouts {
    MeasuredLayouts {
        shared: CppLayout::of::<SimpleSharedPtr<i32>>(),
        unique: CppLayout::of::<SimpleUniquePtr<i32>>(),
        weak: CppLayout::of::<SimpleWeakPtr<i32>>()
    }
}

/// Compare both sets of placeholders with the real types as the C++ compiler laid them out.
pub fn verify() -> Result<MeasuredLayouts, LayoutMismatch> {
    let real = measured();
    let cpp = measured_placeholders();
    let rust = rust_placeholders();
    for kind in PointerKind::ALL {
        log::trace!("{}<int>: {}", kind.std_name(), real.get(kind));
        compare_layouts(kind, PROBE_ABI, PROBE_POINTEE, cpp.get(kind), real.get(kind))?;
        compare_layouts(kind, PROBE_ABI, PROBE_POINTEE, rust.get(kind), real.get(kind))?;
    }
    log::debug!("placeholders match the host C++ compiler");
    Ok(real)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::{ generic::layout::PointerAbi, native::Native };
    use std::error::Error;

    type TestReturn = Result<(), Box<dyn Error>>;

    #[test]
    fn host_compiler_agrees() -> TestReturn {
        let _ = env_logger::builder().is_test(true).try_init();
        let real = verify()?;
        assert_eq!(real, measured_placeholders(), "C++ placeholders should match the real types");
        assert_eq!(real.shared, CppLayout::of::<<Native as PointerAbi>::SharedPtr<i32>>(),
            "Native shared_ptr mirror should match the compiler");
        assert_eq!(real.unique, CppLayout::of::<<Native as PointerAbi>::UniquePtr<i32>>(),
            "Native unique_ptr mirror should match the compiler");
        Ok(())
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn lp64_sizes() -> TestReturn {
        let real = measured();
        assert_eq!(real.shared, CppLayout::new(16, 8));
        assert_eq!(real.weak, CppLayout::new(16, 8));
        assert_eq!(real.unique, CppLayout::new(8, 8));
        Ok(())
    }
}
