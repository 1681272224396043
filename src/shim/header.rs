// Also compiled into build.rs through #[path], std only

pub const HEADER_NAME: &str = "simple_ptr_shim.h";
pub const DEFAULT_CXX_STD: &str = "c++14";
pub const DEFAULT_INCLUDES: &[&str] = &["<memory>"];

/// `-std=` value, e.g. `c++17`
pub const ENV_CXX_STD: &str = "SIMPLE_PTR_CXX_STD";
/// Extra include directories, separated like `PATH`
pub const ENV_INCLUDE_DIRS: &str = "SIMPLE_PTR_INCLUDE_DIRS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// `T*`, address of the pointee
    Pointee,
    /// `void*`, address of the reference count block
    ControlBlock
}

impl FieldRole {
    pub fn cpp_type(self) -> &'static str {
        match self {
            Self::Pointee => "T*",
            Self::ControlBlock => "void*"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShimField {
    pub name: &'static str,
    pub role: FieldRole
}

/// One "replace `replaces` with `placeholder`" entry, in declaration order of the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: &'static str,
    pub replaces: &'static str,
    pub fields: &'static [ShimField]
}

impl Substitution {
    pub fn has_control_block(&self) -> bool {
        self.fields.iter().any(|f| f.role == FieldRole::ControlBlock)
    }
}

const POINTEE: ShimField = ShimField { name: "ptr", role: FieldRole::Pointee };
const CONTROL_BLOCK: ShimField = ShimField { name: "count", role: FieldRole::ControlBlock };

pub const SHARED_PTR: Substitution = Substitution {
    placeholder: "simple_shared_ptr",
    replaces: "std::shared_ptr",
    fields: &[POINTEE, CONTROL_BLOCK]
};

pub const UNIQUE_PTR: Substitution = Substitution {
    placeholder: "simple_unique_ptr",
    replaces: "std::unique_ptr",
    fields: &[POINTEE]
};

pub const WEAK_PTR: Substitution = Substitution {
    placeholder: "simple_weak_ptr",
    replaces: "std::weak_ptr",
    fields: &[POINTEE, CONTROL_BLOCK]
};

pub const SUBSTITUTIONS: [Substitution; 3] = [SHARED_PTR, UNIQUE_PTR, WEAK_PTR];

/// Pointee type the header instantiates every placeholder with before asserting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeType {
    pub name: &'static str,
    pub declaration: Option<&'static str>
}

pub const PROBE_TYPES: &[ProbeType] = &[
    ProbeType { name: "int", declaration: None },
    ProbeType { name: "void*", declaration: None },
    ProbeType {
        name: "simple_ptr_probe_large",
        declaration: Some("struct simple_ptr_probe_large { unsigned char bytes[4096]; };")
    },
    // shared_ptr, weak_ptr and unique_ptr may all be instantiated on an incomplete type
    ProbeType {
        name: "simple_ptr_probe_incomplete",
        declaration: Some("struct simple_ptr_probe_incomplete;")
    },
];

pub fn render_header(includes: &[&str], probes: &[ProbeType], declarations: &[&str]) -> String {
    let mut out = String::from("// Generated by simple-ptr, do not edit.\n");
    out.push_str("// https://github.com/rust-lang/rust-bindgen/issues/1509\n");
    out.push_str("#pragma once\n");
    for include in includes {
        out.push_str(&format!("#include {}\n", include));
    }
    for sub in SUBSTITUTIONS.iter() {
        out.push_str(&placeholder_declaration(sub));
    }
    if !probes.is_empty() {
        out.push('\n');
        for decl in probes.iter().filter_map(|p| p.declaration) {
            out.push_str(decl);
            out.push('\n');
        }
        for probe in probes {
            out.push('\n');
            for sub in SUBSTITUTIONS.iter() {
                out.push_str(&layout_assertions(sub, probe.name));
            }
        }
    }
    if !declarations.is_empty() {
        out.push('\n');
        for decl in declarations {
            out.push_str(decl);
            out.push('\n');
        }
    }
    out
}

fn placeholder_declaration(sub: &Substitution) -> String {
    let fields: String = sub.fields.iter()
        .map(|field| format!("  {} {};\n", field.role.cpp_type(), field.name))
        .collect();
    format!("\n/// <div rustbindgen replaces=\"{r}\"></div>\ntemplate<typename T>\nclass {p} {{\n public:\n{fields}}};\n",
        r = sub.replaces, p = sub.placeholder, fields = fields)
}

fn layout_assertions(sub: &Substitution, pointee: &str) -> String {
    [("sizeof", "size"), ("alignof", "alignment")].iter()
        .map(|(op, property)| format!(
            "static_assert({op}({p}<{t}>) == {op}({r}<{t}>), \"{p}<{t}>: {property} differs from {r}<{t}>\");\n",
            op = op, p = sub.placeholder, r = sub.replaces, t = pointee, property = property))
        .collect()
}
