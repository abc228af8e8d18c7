use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn section_gen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_section-gen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Should run section-gen")
}

fn stdout(output: &Output) -> &str {
    assert!(
        output.status.success(),
        "section-gen failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    std::str::from_utf8(&output.stdout).unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    let mut path = env::temp_dir();
    path.push(format!("section-gen-{}-{}", std::process::id(), name));
    path
}

fn write_object(
    name: &str,
    format: object::BinaryFormat,
    endian: object::Endianness,
    sections: &[&str],
) -> PathBuf {
    let architecture = match (format, endian) {
        (object::BinaryFormat::MachO, _) => object::Architecture::Aarch64,
        (_, object::Endianness::Little) => object::Architecture::X86_64,
        (_, object::Endianness::Big) => object::Architecture::PowerPc64,
    };
    let segment: &[u8] = match format {
        object::BinaryFormat::MachO => b"__DWARF",
        _ => b"",
    };
    let mut obj = object::write::Object::new(format, architecture, endian);
    for section in sections {
        let id = obj.add_section(
            segment.to_vec(),
            section.as_bytes().to_vec(),
            object::SectionKind::Debug,
        );
        obj.append_section_data(id, &[0; 4], 1);
    }
    let path = temp_path(name);
    fs::write(&path, obj.write().unwrap()).unwrap();
    path
}

#[test]
fn test_default_output_matches_library() {
    let output = section_gen(&[]);
    let expected = debug_section_gen::Generator::new()
        .generate_to_string()
        .unwrap();
    assert_eq!(stdout(&output), expected);
    assert!(output.stderr.is_empty());
}

#[test]
fn test_empty_section_list() {
    let output = section_gen(&["--sections", "", "--module"]);
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_sections_and_match() {
    let output = section_gen(&["-s", "abbrev,info,str_offsets,str", "-u", "^str"]);
    let out = stdout(&output);
    let first = out.find("fn _str_offsets_section()").unwrap();
    let second = out.find("fn _str_section()").unwrap();
    assert!(first < second);
    assert!(!out.contains("_abbrev_section"));
    assert!(!out.contains("_info_section"));
}

#[test]
fn test_object_filters_sections_and_sets_endian() {
    let path = write_object(
        "big.o",
        object::BinaryFormat::Elf,
        object::Endianness::Big,
        &[".debug_str", ".debug_frame", ".debug_info"],
    );
    let output = section_gen(&["--object", path.to_str().unwrap()]);
    let out = stdout(&output).to_string();
    fs::remove_file(&path).ok();

    let info = out.find("fn _info_section() -> EndianSlice<'static, BigEndian>").unwrap();
    let strings = out.find("fn _str_section() -> EndianSlice<'static, BigEndian>").unwrap();
    assert!(info < strings);
    // Not in the default list.
    assert!(!out.contains("_frame_section"));
    assert_eq!(out.lines().filter(|line| line.starts_with("fn ")).count(), 2);
}

#[test]
fn test_object_macho_sections() {
    let path = write_object(
        "dwarf.macho.o",
        object::BinaryFormat::MachO,
        object::Endianness::Little,
        &["__debug_info", "__debug_abbrev", "__debug_frame"],
    );
    let output = section_gen(&["--object", path.to_str().unwrap()]);
    let out = stdout(&output).to_string();
    fs::remove_file(&path).ok();

    let abbrev = out
        .find("fn _abbrev_section() -> EndianSlice<'static, LittleEndian>")
        .unwrap();
    let info = out
        .find("fn _info_section() -> EndianSlice<'static, LittleEndian>")
        .unwrap();
    assert!(abbrev < info);
    assert_eq!(out.lines().filter(|line| line.starts_with("fn ")).count(), 2);
}

#[test]
fn test_object_endian_overridden() {
    let path = write_object(
        "little.o",
        object::BinaryFormat::Elf,
        object::Endianness::Little,
        &[".debug_line"],
    );
    let output = section_gen(&[
        "--object",
        path.to_str().unwrap(),
        "--big-endian",
        "--typed",
    ]);
    let out = stdout(&output).to_string();
    fs::remove_file(&path).ok();
    assert_eq!(
        out,
        "\
fn _line_section() -> DebugLine<EndianSlice<'static, BigEndian>> {
    let start = _rvbt_line_start as *const () as usize;
    let end = _rvbt_line_end as *const () as usize;
    let bytes = unsafe { slice::from_raw_parts(start as *const u8, end - start) };
    DebugLine::from(EndianSlice::new(bytes, BigEndian))
}
"
    );
}

#[test]
fn test_output_and_linker_script_files() {
    let code_path = temp_path("sections.rs");
    let script_path = temp_path("sections.ld");
    let output = section_gen(&[
        "-s",
        "info",
        "--module",
        "-o",
        code_path.to_str().unwrap(),
        "--linker-script",
        script_path.to_str().unwrap(),
    ]);
    assert_eq!(stdout(&output), "");
    let code = fs::read_to_string(&code_path).unwrap();
    let script = fs::read_to_string(&script_path).unwrap();
    fs::remove_file(&code_path).ok();
    fs::remove_file(&script_path).ok();

    assert!(code.starts_with("use core::slice;\n"));
    assert!(code.contains("extern \"C\" {\n    fn _rvbt_info_start();\n    fn _rvbt_info_end();\n}\n"));
    assert!(code.contains("fn _load_dwarf()"));
    assert_eq!(
        script,
        "\
.rvbt_info : ALIGN(8) {
    _rvbt_info_start = .;
    KEEP(*(.debug_info))
    _rvbt_info_end = .;
}
"
    );
}

#[test]
fn test_naming_flags() {
    let output = section_gen(&[
        "-s",
        "info",
        "--prefix",
        "__",
        "--fn-prefix",
        "debug_",
        "--fn-suffix",
        "",
        "--unsafe-extern",
    ]);
    let out = stdout(&output);
    assert!(out.starts_with("unsafe extern \"C\" {\n    fn __info_start();\n"));
    assert!(out.contains("fn debug_info() -> EndianSlice<'static, LittleEndian> {\n"));
}

#[test]
fn test_errors() {
    for args in [
        &["--no-such-flag"][..],
        &["stray"][..],
        &["-s", "info,debug-str"][..],
        &["-s", "info,info"][..],
        &["-s", "sup", "--typed"][..],
        &["-s", "match", "--fn-prefix", "", "--fn-suffix", ""][..],
        &["-s", "load", "--fn-prefix", "", "--fn-suffix", "_dwarf", "--loader"][..],
        &["-u", "("][..],
        &["--big-endian", "--little-endian"][..],
        &["--object", "/nonexistent/section-gen.o"][..],
    ] {
        let output = section_gen(args);
        assert_eq!(output.status.code(), Some(1), "args: {:?}", args);
        assert!(output.stdout.is_empty(), "args: {:?}", args);
        assert!(!output.stderr.is_empty(), "args: {:?}", args);
    }
}

#[test]
fn test_help() {
    let output = section_gen(&["--help"]);
    let out = stdout(&output);
    assert!(out.starts_with("Usage: "));
    assert!(out.contains("--linker-script"));
}
