#[cfg(feature = "cpp-probe")]
#[path = "src/shim/header.rs"]
#[allow(dead_code)]
mod header;

use std::error::Error;

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error building the layout probe: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cpp-probe"))]
fn try_main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}

#[cfg(feature = "cpp-probe")]
fn try_main() -> Result<(), Box<dyn Error>> {
    use std::{ env, fs, path::PathBuf };

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/shim/header.rs");
    println!("cargo:rerun-if-changed=cpp/layout_probe.cpp");
    println!("cargo:rerun-if-env-changed={}", header::ENV_CXX_STD);
    println!("cargo:rerun-if-env-changed={}", header::ENV_INCLUDE_DIRS);

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let contents = header::render_header(header::DEFAULT_INCLUDES, header::PROBE_TYPES, &[]);
    fs::write(out_dir.join(header::HEADER_NAME), contents)?;

    let cxx_std = env::var(header::ENV_CXX_STD)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| header::DEFAULT_CXX_STD.to_string());
    let include_dirs: Vec<PathBuf> = match env::var_os(header::ENV_INCLUDE_DIRS) {
        Some(dirs) => env::split_paths(&dirs).filter(|p| !p.as_os_str().is_empty()).collect(),
        None => vec![]
    };

    let mut build = cc::Build::new();
    build.cpp(true)
        .file("cpp/layout_probe.cpp")
        .include(&out_dir)
        .includes(&include_dirs);
    let is_msvc = build.get_compiler().is_like_msvc();
    let std_flag = match is_msvc {
        true => format!("/std:{}", cxx_std.trim()),
        false => format!("-std={}", cxx_std.trim())
    };
    build.flag_if_supported(&std_flag);
    // Same standard library as native::Native
    if cfg!(feature = "libcxx") && !is_msvc {
        build.flag_if_supported("-stdlib=libc++").cpp_link_stdlib("c++");
    }
    build.try_compile("simple_ptr_probe")?;
    Ok(())
}
