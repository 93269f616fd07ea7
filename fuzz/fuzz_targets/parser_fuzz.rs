//! Fuzz test for the term parser.
//!
//! Parsing should never panic, regardless of input — only return `Ok` or a
//! `ParseError` with valid location info.

#![no_main]

use kernel_term::{parse_all, Lexer, Parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match parse_all(input) {
            Ok(_terms) => {}
            Err(err) => {
                assert!(err.line >= 1, "error line should be >= 1");
                assert!(err.column >= 1, "error column should be >= 1");
                assert!(!err.message.is_empty(), "error message should not be empty");
            }
        }

        // Lexer -> parser pipeline exercised separately, same invariant:
        // never panics regardless of the token stream.
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();
        let mut parser = Parser::new(tokens);
        let _ = parser.parse_all();
    }
});
