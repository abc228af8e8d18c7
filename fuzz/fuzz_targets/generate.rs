#![no_main]

use debug_section_gen::{Generator, SectionName, Wrapper};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let list = match std::str::from_utf8(data) {
        Ok(list) => list,
        Err(_) => return,
    };
    let sections = match list
        .split(',')
        .map(SectionName::new)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(sections) => sections,
        Err(_) => return,
    };
    let generator = Generator::new()
        .sections(sections.clone())
        .imports(true)
        .externs(true)
        .loader(true);

    for wrapper in [Wrapper::Slice, Wrapper::Section] {
        let generator = generator.clone().wrapper(wrapper);
        if let Ok(code) = generator.generate_to_string() {
            let naming = generator.naming_conventions();
            for section in &sections {
                assert!(code.contains(&format!("fn {}()", naming.accessor(section))));
                assert!(code.contains(&naming.start_symbol(section)));
                assert!(code.contains(&naming.end_symbol(section)));
            }
        }
    }
});
