//! Linker script fragments defining the section boundary symbols.
//!
//! The generated accessors only reference `<prefix><name>_start` and
//! `<prefix><name>_end`; something has to define them. With GNU ld (and
//! lld) that is an output section per DWARF section, placed inside the
//! `SECTIONS` command of the image's linker script so that the debug
//! information is loaded into memory alongside the code.

use std::io::Write;

use tracing::debug;

use crate::common::Result;
use crate::section::{Naming, SectionName};

/// Alignment of each output section, in bytes.
pub const SECTION_ALIGN: u32 = 8;

/// Write one output section per entry of `sections`, in order.
///
/// Nothing is written for an empty list.
pub fn write_linker_script<W: Write>(
    w: &mut W,
    naming: &Naming,
    sections: &[SectionName],
) -> Result<()> {
    for section in sections {
        debug!(section = %section, "emitting linker script section");
        writeln!(
            w,
            "{} : ALIGN({}) {{",
            naming.output_section(section),
            SECTION_ALIGN
        )?;
        writeln!(w, "    {} = .;", naming.start_symbol(section))?;
        writeln!(w, "    KEEP(*({}))", section.elf_name())?;
        writeln!(w, "    {} = .;", naming.end_symbol(section))?;
        writeln!(w, "}}")?;
    }
    Ok(())
}
