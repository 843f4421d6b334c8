//! Decompilation configuration (§3 ambient stack "Configuration").
//!
//! Grounded on the teacher's explicit `Config`-struct-threaded-through-
//! `Context` pattern (see `DESIGN.md`'s "Global state" design note) rather
//! than the original C++ implementation's process-wide singleton
//! (`options.cpp`). Every field here corresponds to one of the CLI flags
//! spec.md §6 lists for context even though this workspace doesn't parse
//! a command line itself.

/// How the renderer writes one level of nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndentStyle {
    Spaces(u8),
    Tabs,
}

impl IndentStyle {
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n as usize),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(4)
    }
}

/// Whether well-known numeric constants (`Integer.MAX_VALUE`, `Math.PI`,
/// ...) may substitute for their literal value (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstantMode {
    #[default]
    Auto,
    Minimal,
    Never,
}

/// Whether `int`/`long` literals render in hex or decimal (§4 "Hex /
/// decimal literal rendering mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexMode {
    Always,
    #[default]
    Auto,
    Never,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Stop the whole class on the first method-level decompilation
    /// failure instead of rendering a `// Exception while decompiling
    /// method: ...` comment and continuing (§7 "tolerant mode").
    pub fail_on_error: bool,
    pub indent: IndentStyle,
    pub use_constants: ConstantMode,
    pub hex: HexMode,
    /// Render `new T[]{...}` instead of `new T[n]{...}` with explicit
    /// assignments when every length slot is zero/absent (§4.6, §4.9).
    pub short_array_init: bool,
    /// Render `invokevirtual Integer.intValue()` / `invokestatic
    /// Integer.valueOf(int)` idioms as plain primitive/boxing casts
    /// rather than literal method calls (§4.6).
    pub cast_wrappers: bool,
    /// Allow `cast_wrappers`' boxing direction (`valueOf`) specifically;
    /// unboxing (`*Value()`) is always recognized regardless.
    pub auto_box: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fail_on_error: false,
            indent: IndentStyle::default(),
            use_constants: ConstantMode::default(),
            hex: HexMode::default(),
            short_array_init: true,
            cast_wrappers: true,
            auto_box: true,
        }
    }
}
