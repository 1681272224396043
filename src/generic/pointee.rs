/// Same size as a pointer.
#[repr(C)]
pub struct WordSized(pub usize);

// simple_ptr_probe_large
#[repr(C)]
pub struct LargeAggregate {
    pub bytes: [u8; 4096]
}

#[repr(C, align(64))]
pub struct OverAligned {
    pub lane: [u8; 64]
}

/// Stands in for a C++ type that is only forward declared, like most of `lldb_private::*`
/// behind the `lldb::SB*` API.
// . size = 0
// . align = 1
// . !Send, !Sync
#[repr(C, packed)]
pub struct Opaque {
    _private: [*const u8; 0]
}
