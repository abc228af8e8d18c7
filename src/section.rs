use std::fmt;

use gimli::SectionId;

use crate::common::{Error, Result};

/// The sections a backtrace symbolizer needs, in the order accessors are
/// generated for them.
pub const DEFAULT_SECTIONS: [SectionName; 10] = [
    SectionName::from_static("abbrev"),
    SectionName::from_static("addr"),
    SectionName::from_static("aranges"),
    SectionName::from_static("info"),
    SectionName::from_static("line"),
    SectionName::from_static("line_str"),
    SectionName::from_static("ranges"),
    SectionName::from_static("rnglists"),
    SectionName::from_static("str"),
    SectionName::from_static("str_offsets"),
];

/// `.debug_*` sections that have a reader type in `gimli`, and the name of
/// that type.
const GIMLI_SECTIONS: &[(SectionId, &str)] = &[
    (SectionId::DebugAbbrev, "DebugAbbrev"),
    (SectionId::DebugAddr, "DebugAddr"),
    (SectionId::DebugAranges, "DebugAranges"),
    (SectionId::DebugFrame, "DebugFrame"),
    (SectionId::DebugInfo, "DebugInfo"),
    (SectionId::DebugLine, "DebugLine"),
    (SectionId::DebugLineStr, "DebugLineStr"),
    (SectionId::DebugLoc, "DebugLoc"),
    (SectionId::DebugLocLists, "DebugLocLists"),
    (SectionId::DebugPubNames, "DebugPubNames"),
    (SectionId::DebugPubTypes, "DebugPubTypes"),
    (SectionId::DebugRanges, "DebugRanges"),
    (SectionId::DebugRngLists, "DebugRngLists"),
    (SectionId::DebugStr, "DebugStr"),
    (SectionId::DebugStrOffsets, "DebugStrOffsets"),
    (SectionId::DebugTypes, "DebugTypes"),
];

/// Sections `gimli::Dwarf::load` asks its loader for.
const DWARF_LOAD_SECTIONS: &[SectionId] = &[
    SectionId::DebugAbbrev,
    SectionId::DebugAddr,
    SectionId::DebugAranges,
    SectionId::DebugInfo,
    SectionId::DebugLine,
    SectionId::DebugLineStr,
    SectionId::DebugLoc,
    SectionId::DebugLocLists,
    SectionId::DebugRanges,
    SectionId::DebugRngLists,
    SectionId::DebugStr,
    SectionId::DebugStrOffsets,
    SectionId::DebugTypes,
];

/// Strict and reserved keywords, which cannot name a function.
const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

const ELF_PREFIX: &str = ".debug_";

fn is_identifier_fragment(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s != "_"
        && !s.bytes().next().map_or(false, |b| b.is_ascii_digit())
        && !KEYWORDS.contains(&s)
}

/// The short name of a DWARF section, without the `.debug_` prefix.
///
/// Every name derived from it (boundary symbols, accessor functions) is a
/// plain string concatenation, so the identifier is restricted to ASCII
/// alphanumerics and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionName(std::borrow::Cow<'static, str>);

impl SectionName {
    const fn from_static(name: &'static str) -> Self {
        SectionName(std::borrow::Cow::Borrowed(name))
    }

    /// Create a section name from an identifier supplied at runtime.
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyIdentifier);
        }
        if !is_identifier_fragment(&name) {
            return Err(Error::InvalidIdentifier(name));
        }
        Ok(SectionName(name.into()))
    }

    /// Parse the short name out of an ELF section name such as `.debug_info`.
    ///
    /// Returns `None` for sections that are not `.debug_*` sections, or whose
    /// suffix is not a valid identifier.
    pub fn from_elf_name(name: &str) -> Option<Self> {
        name.strip_prefix(ELF_PREFIX)
            .and_then(|short| SectionName::new(short).ok())
    }

    /// The identifier itself.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ELF name of the section this identifier stands for.
    pub fn elf_name(&self) -> String {
        format!("{}{}", ELF_PREFIX, self.0)
    }

    /// The `gimli` section with the same ELF name, if there is one with a
    /// reader type.
    pub fn section_id(&self) -> Option<SectionId> {
        let elf_name = self.elf_name();
        GIMLI_SECTIONS
            .iter()
            .map(|&(id, _)| id)
            .find(|id| id.name() == elf_name)
    }

    /// The name of the `gimli` type wrapping this section, such as
    /// `DebugInfo`.
    pub fn gimli_type(&self) -> Option<&'static str> {
        let id = self.section_id()?;
        GIMLI_SECTIONS
            .iter()
            .find(|&&(known, _)| known == id)
            .map(|&(_, ty)| ty)
    }

    /// The `gimli` section id, if `gimli::Dwarf::load` requests this section.
    pub fn dwarf_section_id(&self) -> Option<SectionId> {
        self.section_id().filter(|id| DWARF_LOAD_SECTIONS.contains(id))
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The string conventions used to derive symbol and function names from a
/// section identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    /// Prepended to the identifier for both boundary symbols.
    pub symbol_prefix: String,
    /// Prepended to the identifier for accessor functions.
    pub fn_prefix: String,
    /// Appended to the identifier for accessor functions.
    pub fn_suffix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Naming {
            symbol_prefix: "_rvbt_".to_string(),
            fn_prefix: "_".to_string(),
            fn_suffix: "_section".to_string(),
        }
    }
}

impl Naming {
    /// The symbol the linker defines at the first byte of the section.
    pub fn start_symbol(&self, section: &SectionName) -> String {
        format!("{}{}_start", self.symbol_prefix, section)
    }

    /// The symbol the linker defines one past the last byte of the section.
    pub fn end_symbol(&self, section: &SectionName) -> String {
        format!("{}{}_end", self.symbol_prefix, section)
    }

    /// The name of the generated accessor function.
    pub fn accessor(&self, section: &SectionName) -> String {
        format!("{}{}{}", self.fn_prefix, section, self.fn_suffix)
    }

    /// The name of the generated `Dwarf` loader.
    pub fn loader(&self) -> String {
        format!("{}load_dwarf", self.fn_prefix)
    }

    /// Check that every name derived from `section` is a Rust identifier
    /// other than a keyword or `_`.
    pub fn validate(&self, section: &SectionName) -> Result<()> {
        for fragment in [&self.symbol_prefix, &self.fn_prefix, &self.fn_suffix] {
            if !is_identifier_fragment(fragment) {
                return Err(Error::InvalidIdentifier(fragment.clone()));
            }
        }
        for name in [
            self.start_symbol(section),
            self.end_symbol(section),
            self.accessor(section),
        ] {
            if !is_identifier(&name) {
                return Err(Error::InvalidIdentifier(name));
            }
        }
        Ok(())
    }

    /// The name of the output section holding `section` in a linker script.
    pub fn output_section(&self, section: &SectionName) -> String {
        format!(".{}{}", self.symbol_prefix.trim_start_matches('_'), section)
    }
}
