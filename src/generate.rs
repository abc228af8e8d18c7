use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use gimli::RunTimeEndian;
use tracing::{debug, warn};

use crate::common::{Error, Result};
use crate::linker;
use crate::section::{Naming, SectionName, DEFAULT_SECTIONS};

/// The type returned by each generated accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrapper {
    /// A bare `EndianSlice`.
    #[default]
    Slice,
    /// The typed `gimli` section (`DebugInfo`, `DebugAbbrev`, ...) wrapping an
    /// `EndianSlice`.
    Section,
}

/// Generates Rust source for accessor functions over linker-delimited DWARF
/// sections.
///
/// The default generator emits one accessor per entry of
/// [`DEFAULT_SECTIONS`], returning little-endian `EndianSlice`s:
///
/// ```
/// let code = debug_section_gen::Generator::new()
///     .sections(vec![debug_section_gen::SectionName::new("info")?])
///     .generate_to_string()?;
/// assert!(code.starts_with("fn _info_section() -> EndianSlice<'static, LittleEndian> {"));
/// # Ok::<(), debug_section_gen::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Generator {
    sections: Vec<SectionName>,
    naming: Naming,
    endian: RunTimeEndian,
    wrapper: Wrapper,
    externs: bool,
    unsafe_extern: bool,
    imports: bool,
    loader: bool,
}

impl Default for Generator {
    fn default() -> Self {
        Generator {
            sections: DEFAULT_SECTIONS.to_vec(),
            naming: Naming::default(),
            endian: RunTimeEndian::Little,
            wrapper: Wrapper::Slice,
            externs: false,
            unsafe_extern: false,
            imports: false,
            loader: false,
        }
    }
}

impl Generator {
    /// Create a generator for the default sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list of sections. Accessors are emitted in this order.
    pub fn sections(mut self, sections: Vec<SectionName>) -> Self {
        self.sections = sections;
        self
    }

    /// Set the naming conventions for symbols and functions.
    pub fn naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    /// Set the byte order tagged onto every slice.
    pub fn endian(mut self, endian: RunTimeEndian) -> Self {
        self.endian = endian;
        self
    }

    /// Set the type returned by accessors.
    pub fn wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// Also emit the `extern "C"` declarations of the boundary symbols.
    pub fn externs(mut self, externs: bool) -> Self {
        self.externs = externs;
        self
    }

    /// Spell the extern block `unsafe extern "C"`, as edition 2024 requires.
    pub fn unsafe_extern(mut self, unsafe_extern: bool) -> Self {
        self.unsafe_extern = unsafe_extern;
        self
    }

    /// Also emit the `use` declarations the accessors rely on.
    pub fn imports(mut self, imports: bool) -> Self {
        self.imports = imports;
        self
    }

    /// Also emit a function loading a `gimli::Dwarf` from the accessors.
    pub fn loader(mut self, loader: bool) -> Self {
        self.loader = loader;
        self
    }

    /// The sections accessors will be generated for.
    #[inline]
    pub fn section_list(&self) -> &[SectionName] {
        &self.sections
    }

    /// The naming conventions in use.
    #[inline]
    pub fn naming_conventions(&self) -> &Naming {
        &self.naming
    }

    /// Check that the configuration produces code that can compile.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let loader = self.naming.loader();
        for section in &self.sections {
            self.naming.validate(section)?;
            if !seen.insert(section.as_str()) {
                return Err(Error::DuplicateSection(section.to_string()));
            }
            if self.loader && self.naming.accessor(section) == loader {
                return Err(Error::NameCollision(loader));
            }
            if self.wrapper == Wrapper::Section && section.gimli_type().is_none() {
                return Err(Error::UnknownSection(section.to_string()));
            }
        }
        Ok(())
    }

    /// Write every enabled part of the output: imports, extern block,
    /// accessors and loader, separated by blank lines.
    ///
    /// An empty section list writes nothing.
    pub fn generate<W: Write>(&self, w: &mut W) -> Result<()> {
        self.validate()?;
        if self.sections.is_empty() {
            debug!("no sections to generate");
            return Ok(());
        }
        if self.imports {
            self.write_imports(w)?;
            writeln!(w)?;
        }
        if self.externs {
            self.write_externs(w)?;
            writeln!(w)?;
        }
        self.write_accessors(w)?;
        if self.loader {
            writeln!(w)?;
            self.write_loader(w)?;
        }
        Ok(())
    }

    /// Generate into a string.
    pub fn generate_to_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.generate(&mut buf)?;
        // Only `str` fragments are written.
        String::from_utf8(buf).map_err(|_| Error::Io)
    }

    /// Generate into a file, such as one under `OUT_DIR` in a build script.
    ///
    /// The file is left untouched if generation fails.
    pub fn generate_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut buf = Vec::new();
        self.generate(&mut buf)?;
        fs::write(path, buf)?;
        Ok(())
    }

    /// Write one accessor per section, in order, separated by blank lines.
    pub fn write_accessors<W: Write>(&self, w: &mut W) -> Result<()> {
        for (i, section) in self.sections.iter().enumerate() {
            if i != 0 {
                writeln!(w)?;
            }
            self.write_accessor(w, section)?;
        }
        Ok(())
    }

    /// Write the accessor for a single section.
    pub fn write_accessor<W: Write>(&self, w: &mut W, section: &SectionName) -> Result<()> {
        debug!(section = %section, "emitting accessor");
        let reader = self.reader_type();
        let slice = format!("EndianSlice::new(bytes, {})", self.endian_type());
        let (ret, value) = match self.wrapper {
            Wrapper::Slice => (reader, slice),
            Wrapper::Section => {
                let ty = section
                    .gimli_type()
                    .ok_or_else(|| Error::UnknownSection(section.to_string()))?;
                (format!("{}<{}>", ty, reader), format!("{}::from({})", ty, slice))
            }
        };
        writeln!(w, "fn {}() -> {} {{", self.naming.accessor(section), ret)?;
        writeln!(
            w,
            "    let start = {} as *const () as usize;",
            self.naming.start_symbol(section)
        )?;
        writeln!(
            w,
            "    let end = {} as *const () as usize;",
            self.naming.end_symbol(section)
        )?;
        writeln!(
            w,
            "    let bytes = unsafe {{ slice::from_raw_parts(start as *const u8, end - start) }};"
        )?;
        writeln!(w, "    {}", value)?;
        writeln!(w, "}}")?;
        Ok(())
    }

    /// Write the `extern "C"` block declaring every boundary symbol.
    pub fn write_externs<W: Write>(&self, w: &mut W) -> Result<()> {
        let keyword = if self.unsafe_extern {
            "unsafe extern"
        } else {
            "extern"
        };
        writeln!(w, "{} \"C\" {{", keyword)?;
        for section in &self.sections {
            writeln!(w, "    fn {}();", self.naming.start_symbol(section))?;
            writeln!(w, "    fn {}();", self.naming.end_symbol(section))?;
        }
        writeln!(w, "}}")?;
        Ok(())
    }

    /// Write the `use` declarations needed by the accessors.
    pub fn write_imports<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut names = vec!["EndianSlice", self.endian_type()];
        if self.wrapper == Wrapper::Section {
            names.extend(self.sections.iter().filter_map(SectionName::gimli_type));
        }
        names.sort_unstable();
        names.dedup();
        writeln!(w, "use core::slice;")?;
        writeln!(w)?;
        writeln!(w, "use gimli::{{{}}};", names.join(", "))?;
        Ok(())
    }

    /// Write a function that loads a `gimli::Dwarf` whose sections come from
    /// the generated accessors.
    ///
    /// Only sections `Dwarf::load` requests get an arm; the rest are logged
    /// and left out. `Dwarf::load` gets an empty slice for every section
    /// that has no accessor.
    pub fn write_loader<W: Write>(&self, w: &mut W) -> Result<()> {
        let reader = self.reader_type();
        let empty = format!("EndianSlice::new(&[], {})", self.endian_type());
        writeln!(
            w,
            "fn {}() -> gimli::Dwarf<{}> {{",
            self.naming.loader(),
            reader
        )?;
        writeln!(
            w,
            "    let load_section = |id: gimli::SectionId| -> core::result::Result<{}, core::convert::Infallible> {{",
            reader
        )?;
        writeln!(w, "        Ok(match id {{")?;
        for section in &self.sections {
            let id = match section.dwarf_section_id() {
                Some(id) => id,
                None => {
                    warn!(section = %section, "not loaded by gimli::Dwarf, leaving it out of the loader");
                    continue;
                }
            };
            let accessor = self.naming.accessor(section);
            let value = match self.wrapper {
                Wrapper::Slice => format!("{}()", accessor),
                Wrapper::Section => format!("*gimli::Section::reader(&{}())", accessor),
            };
            writeln!(w, "            gimli::SectionId::{:?} => {},", id, value)?;
        }
        writeln!(w, "            _ => {},", empty)?;
        writeln!(w, "        }})")?;
        writeln!(w, "    }};")?;
        writeln!(w, "    match gimli::Dwarf::load(load_section) {{")?;
        writeln!(w, "        Ok(dwarf) => dwarf,")?;
        writeln!(w, "        Err(never) => match never {{}},")?;
        writeln!(w, "    }}")?;
        writeln!(w, "}}")?;
        Ok(())
    }

    /// Write the linker script fragment defining the boundary symbols the
    /// accessors reference.
    pub fn write_linker_script<W: Write>(&self, w: &mut W) -> Result<()> {
        self.validate()?;
        linker::write_linker_script(w, &self.naming, &self.sections)
    }

    fn endian_type(&self) -> &'static str {
        match self.endian {
            RunTimeEndian::Little => "LittleEndian",
            RunTimeEndian::Big => "BigEndian",
        }
    }

    fn reader_type(&self) -> String {
        format!("EndianSlice<'static, {}>", self.endian_type())
    }
}
