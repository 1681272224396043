use crate::shim::{ ShimConfig, HEADER_NAME };
use bindgen::{ BindgenError, Bindings, Builder };

/// Add the shim header, clang arguments and allowlist to an existing builder.
pub fn configure(builder: Builder, config: &ShimConfig) -> Builder {
    log::debug!("shim header {} with {} includes, standard {}", HEADER_NAME, config.includes.len(), config.cxx_std);
    let mut builder = builder
        .header_contents(HEADER_NAME, &config.header())
        .enable_cxx_namespaces()
        .clang_args(config.clang_args());
    for pattern in config.allowlist() {
        log::trace!("allowlist type {}", pattern);
        builder = builder.allowlist_type(pattern);
    }
    for pattern in &config.allowlist_functions {
        log::trace!("allowlist function {}", pattern);
        builder = builder.allowlist_function(pattern);
    }
    builder
}

pub fn generate(config: &ShimConfig) -> Result<Bindings, BindgenError> {
    configure(Builder::default(), config).generate()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::error::Error;

    type TestReturn = Result<(), Box<dyn Error>>;

    // Stand-in for <memory> so the test doesn't depend on the host's standard library
    const FAKE_MEMORY: &str = "namespace std { template<class T> class shared_ptr { T* p; long* c; long* d; }; }";

    #[test]
    fn shared_ptr_is_replaced() -> TestReturn {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = ShimConfig { includes: vec![], ..ShimConfig::new() }
            .probe_layouts(false)
            .declare(FAKE_MEMORY)
            .declare("std::shared_ptr<int> make_handle();")
            .allowlist_function("make_handle");
        let bindings = generate(&config)?.to_string();
        assert!(bindings.contains("make_handle"), "Declared function should be generated");
        assert!(bindings.contains("pub count"), "shared_ptr should take the placeholder's fields");
        assert!(!bindings.contains("pub d:"), "shared_ptr's own fields should be gone");
        Ok(())
    }
}
