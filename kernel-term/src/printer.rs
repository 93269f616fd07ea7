//! KIF printing, kept as its own module rather than relying solely on
//! `Term`'s `Display` impl, matching `caliber-dsl::pretty_printer`'s
//! convention of a dedicated printer module.

use kernel_core::Term;

/// Prints a term as single-line KIF text. Equivalent to `term.to_string()`;
/// exists as the named counterpart to `parse_term` for call sites that want
/// print/parse symmetry without reaching for `Display` directly.
pub fn print_term(term: &Term) -> String {
    term.to_string()
}

/// Prints a sequence of top-level terms as a KIF document, one term per
/// line, suitable for round-tripping through `parser::parse_all`.
pub fn print_document(terms: &[Term]) -> String {
    terms.iter().map(Term::to_string).collect::<Vec<_>>().join("\n")
}
