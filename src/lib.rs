pub mod generic {
    pub mod deleter;
    pub mod layout;
    pub mod pointee;
    pub mod simple;
}
pub mod clang {
    pub mod shared_ptr;
    pub mod unique_ptr;
    pub use shared_ptr::Libcxx;
}
pub mod gcc {
    pub mod shared_ptr;
    pub mod unique_ptr;
    pub use shared_ptr::Libstdcxx;
}
pub mod msvc {
    pub mod shared_ptr;
    pub mod unique_ptr;
    pub use shared_ptr::MsvcStl;
}
pub mod native;
#[cfg(feature = "cpp-probe")]
pub mod probe;
pub mod shim;

pub use generic::{
    layout::{ check_placeholders, CppLayout, LayoutMismatch, LayoutProperty, PointerAbi },
    simple::{ PointerKind, SimpleSharedPtr, SimpleUniquePtr, SimpleWeakPtr }
};
pub use shim::ShimConfig;
