#![no_main]

use csv_line_core::{
    generate_line, Grammar, GrammarConfigBuilder, LineBreak, Parser,
};
use libfuzzer_sys::fuzz_target;

const GRAMMARS: [Grammar; 4] = [
    Grammar::Strict,
    Grammar::Relaxed,
    Grammar::CEscaped,
    Grammar::CEscapedRelaxed,
];
const LINE_BREAKS: [LineBreak; 3] =
    [LineBreak::LF, LineBreak::CR, LineBreak::CRLF];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let (&knobs, line) = (&data[0], &data[1..]);
    let config = match GrammarConfigBuilder::new()
        .grammar(GRAMMARS[usize::from(knobs & 0b11)])
        .line_break(LINE_BREAKS[usize::from((knobs >> 2) % 3)])
        .build()
    {
        Ok(config) => config,
        Err(_) => return,
    };
    let parser = Parser::new(&config);
    for &resume in &[false, true] {
        if let Ok(res) = parser.parse(line, resume) {
            assert!(!res.row.is_empty());
            // Whatever parses must generate.
            let _ = generate_line(&res.row, &config, knobs & 0x80 != 0)
                .expect("generating a parsed row");
        }
    }
});
