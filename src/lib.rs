//! Generate `gimli` accessors for DWARF sections that a program carries in its
//! own image.
//!
//! A bare-metal program that wants to symbolize its own backtraces has to keep
//! its `.debug_*` sections in memory. The linker script places each of them in
//! an output section delimited by two symbols, and the program needs one small
//! function per section that turns those two addresses into an
//! [`EndianSlice`](https://docs.rs/gimli/*/gimli/read/struct.EndianSlice.html).
//! This crate writes those functions.
//!
//! ## Example Usage
//!
//! From a build script:
//!
//! ```rust,no_run
//! # fn example() -> Result<(), debug_section_gen::Error> {
//! let out_dir = std::path::PathBuf::from(std::env::var_os("OUT_DIR").unwrap());
//! debug_section_gen::Generator::new()
//!     .externs(true)
//!     .imports(true)
//!     .loader(true)
//!     .generate_to_file(out_dir.join("debug_sections.rs"))?;
//! # Ok(())
//! # }
//! ```
//!
//! and then `include!(concat!(env!("OUT_DIR"), "/debug_sections.rs"));` in the
//! program. The matching linker script fragment comes from
//! [`Generator::write_linker_script`].
//!
//! ## Generated Code
//!
//! For the section `abbrev` with the default [`Naming`], the accessor is:
//!
//! ```rust,ignore
//! fn _abbrev_section() -> EndianSlice<'static, LittleEndian> {
//!     let start = _rvbt_abbrev_start as *const () as usize;
//!     let end = _rvbt_abbrev_end as *const () as usize;
//!     let bytes = unsafe { slice::from_raw_parts(start as *const u8, end - start) };
//!     EndianSlice::new(bytes, LittleEndian)
//! }
//! ```
//!
//! The `unsafe` block is sound only if the linker defines both symbols around
//! memory that stays mapped and unmodified for the life of the program.
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
// Allow clippy lints when building without clippy.
#![allow(unknown_lints)]

mod common;
pub use crate::common::*;

mod section;
pub use crate::section::*;

mod generate;
pub use crate::generate::*;

pub mod linker;
