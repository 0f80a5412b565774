//! Maps human-friendly query terms to the keyword fragments the fitting
//! tool actually uses in its parameter store.

/// Alias groups and the canonical fragment each collapses to.
const SYNONYM_GROUPS: [(&[&str], &str); 4] = [
    (&["t", "temp", "temperature"], "kt"),
    (&["norm", "normalisation"], "norm"),
    (&["break", "ebreak", "e_break"], "break"),
    (&["photonindex", "phoindx", "index"], "phoindx"),
];

/// Resolves query terms into a deduplicated, order-preserving fragment
/// list. Recognized aliases collapse to their canonical fragment;
/// everything else passes through lower-cased. Never fails: an unknown
/// term simply becomes a literal search fragment.
pub fn resolve_terms<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut fragments: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let lowered = term.as_ref().to_ascii_lowercase();
        let fragment = SYNONYM_GROUPS
            .iter()
            .find(|(aliases, _)| aliases.contains(&lowered.as_str()))
            .map_or(lowered, |(_, canonical)| (*canonical).to_string());
        if !fragments.contains(&fragment) {
            fragments.push(fragment);
        }
    }
    fragments
}
