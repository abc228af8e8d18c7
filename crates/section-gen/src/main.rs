//! Print accessors for linker-delimited DWARF sections.
//!
//! With no options, prints one `EndianSlice` accessor for each of the default
//! sections:
//! ```sh
//! $ section-gen > src/debug_sections.rs
//! $ section-gen --module --linker-script debug_sections.ld -o src/debug_sections.rs
//! ```
use debug_section_gen::{Generator, Naming, SectionName, Wrapper, DEFAULT_SECTIONS};
use object::Object;
use regex::Regex;
use std::env;
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::process;
use std::result;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug)]
enum Error {
    Generate(debug_section_gen::Error),
    Object(object::read::Error),
    Regex(regex::Error),
    Io(io::Error),
    Usage(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> result::Result<(), fmt::Error> {
        match *self {
            Error::Generate(ref err) => fmt::Display::fmt(err, f),
            Error::Object(ref err) => write!(f, "An object error occurred while reading: {}", err),
            Error::Regex(ref err) => write!(f, "Invalid regular expression: {}", err),
            Error::Io(ref err) => write!(f, "An I/O error occurred: {}", err),
            Error::Usage(msg) => f.write_str(msg),
        }
    }
}

impl From<debug_section_gen::Error> for Error {
    fn from(err: debug_section_gen::Error) -> Self {
        Error::Generate(err)
    }
}

impl From<object::read::Error> for Error {
    fn from(err: object::read::Error) -> Self {
        Error::Object(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

type Result<T> = result::Result<T, Error>;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries the generated code.
    let fmt_layer = tracing_fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn options() -> getopts::Options {
    let mut opts = getopts::Options::new();
    opts.optopt(
        "s",
        "sections",
        "comma separated section identifiers (default: the ten sections a symbolizer needs)",
        "LIST",
    );
    opts.optopt(
        "u",
        "match",
        "only generate sections whose identifier matches a regex",
        "REGEX",
    );
    opts.optopt(
        "",
        "object",
        "only generate sections present in an object file, and use its byte order",
        "PATH",
    );
    opts.optopt("", "prefix", "prefix of the boundary symbols (default: _rvbt_)", "PREFIX");
    opts.optopt("", "fn-prefix", "prefix of the accessor functions (default: _)", "PREFIX");
    opts.optopt(
        "",
        "fn-suffix",
        "suffix of the accessor functions (default: _section)",
        "SUFFIX",
    );
    opts.optflag("", "big-endian", "tag the slices as big endian");
    opts.optflag("", "little-endian", "tag the slices as little endian");
    opts.optflag("", "typed", "return gimli section types instead of bare slices");
    opts.optflag("", "externs", "declare the boundary symbols");
    opts.optflag("", "unsafe-extern", "declare the boundary symbols in an `unsafe extern` block");
    opts.optflag("", "imports", "print the `use` declarations the accessors need");
    opts.optflag("", "loader", "print a function loading a gimli::Dwarf from the accessors");
    opts.optflag("", "module", "same as --imports --externs --loader");
    opts.optopt(
        "",
        "linker-script",
        "also write the linker script fragment defining the boundary symbols",
        "PATH",
    );
    opts.optopt("o", "output", "write the generated code to a file instead of stdout", "PATH");
    opts.optflag("h", "help", "print this help");
    opts
}

fn print_usage(opts: &getopts::Options) -> ! {
    let brief = format!("Usage: {} <options>", program_name());
    write!(&mut io::stderr(), "{}", opts.usage(&brief)).ok();
    process::exit(1);
}

fn program_name() -> String {
    env::args().next().unwrap_or_else(|| "section-gen".to_string())
}

fn main() {
    init_tracing();

    let opts = options();
    let matches = match opts.parse(env::args().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            writeln!(&mut io::stderr(), "{}\n", e).ok();
            print_usage(&opts);
        }
    };
    if matches.opt_present("h") {
        let brief = format!("Usage: {} <options>", program_name());
        print!("{}", opts.usage(&brief));
        return;
    }
    if !matches.free.is_empty() {
        print_usage(&opts);
    }

    if let Err(err) = run(&matches) {
        eprintln!("{}: {}", program_name(), err);
        process::exit(1);
    }
}

fn parse_sections(list: &str) -> Result<Vec<SectionName>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    let sections = list
        .split(',')
        .map(|name| SectionName::new(name.trim()))
        .collect::<debug_section_gen::Result<Vec<_>>>()?;
    Ok(sections)
}

/// Keeps the `sections` present in the object, and returns its byte order.
///
/// Lookup goes through `section_by_name`, which also finds the Mach-O
/// `__debug_*` spelling of each name.
fn object_sections(
    path: &str,
    sections: &mut Vec<SectionName>,
) -> Result<gimli::RunTimeEndian> {
    let file = fs::File::open(path)?;
    let mmap = unsafe { memmap2::Mmap::map(&file) }?;
    let object = object::File::parse(&*mmap)?;
    let endian = if object.is_little_endian() {
        gimli::RunTimeEndian::Little
    } else {
        gimli::RunTimeEndian::Big
    };
    sections.retain(|section| {
        let present = object.section_by_name(&section.elf_name()).is_some();
        if present {
            debug!(section = %section, "found in {}", path);
        }
        present
    });
    Ok(endian)
}

fn run(matches: &getopts::Matches) -> Result<()> {
    let mut sections = match matches.opt_str("sections") {
        Some(list) => parse_sections(&list)?,
        None => DEFAULT_SECTIONS.to_vec(),
    };

    if let Some(pattern) = matches.opt_str("match") {
        let regex = Regex::new(&pattern)?;
        sections.retain(|section| regex.is_match(section.as_str()));
    }

    let mut endian = None;
    if let Some(path) = matches.opt_str("object") {
        endian = Some(object_sections(&path, &mut sections)?);
    }

    match (
        matches.opt_present("big-endian"),
        matches.opt_present("little-endian"),
    ) {
        (true, true) => {
            return Err(Error::Usage(
                "--big-endian and --little-endian are mutually exclusive",
            ))
        }
        (true, false) => endian = Some(gimli::RunTimeEndian::Big),
        (false, true) => endian = Some(gimli::RunTimeEndian::Little),
        (false, false) => {}
    }

    let mut naming = Naming::default();
    if let Some(prefix) = matches.opt_str("prefix") {
        naming.symbol_prefix = prefix;
    }
    if let Some(prefix) = matches.opt_str("fn-prefix") {
        naming.fn_prefix = prefix;
    }
    if let Some(suffix) = matches.opt_str("fn-suffix") {
        naming.fn_suffix = suffix;
    }

    let module = matches.opt_present("module");
    let unsafe_extern = matches.opt_present("unsafe-extern");
    let generator = Generator::new()
        .sections(sections)
        .naming(naming)
        .endian(endian.unwrap_or(gimli::RunTimeEndian::Little))
        .wrapper(if matches.opt_present("typed") {
            Wrapper::Section
        } else {
            Wrapper::Slice
        })
        .externs(module || unsafe_extern || matches.opt_present("externs"))
        .unsafe_extern(unsafe_extern)
        .imports(module || matches.opt_present("imports"))
        .loader(module || matches.opt_present("loader"));
    info!(
        sections = generator.section_list().len(),
        "generating section accessors"
    );

    match matches.opt_str("output") {
        Some(path) => {
            generator.generate_to_file(&path)?;
            info!("wrote {}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut w = BufWriter::new(stdout.lock());
            generator.generate(&mut w)?;
            w.flush()?;
        }
    }

    if let Some(path) = matches.opt_str("linker-script") {
        let mut w = BufWriter::new(fs::File::create(&path)?);
        generator.write_linker_script(&mut w)?;
        w.flush()?;
        info!("wrote {}", path);
    }
    Ok(())
}
