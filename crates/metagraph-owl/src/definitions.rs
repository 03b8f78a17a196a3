//! Generated class definitions.

/// Hand-written definitions for top-level ontology classes.
pub const SPECIAL_DEFINITIONS: &[(&str, &str)] = &[
    ("Business concept", "A business-level entity or event represented in data."),
    (
        "Financial concept",
        "A business concept related to financial activity represented in data.",
    ),
    (
        "Auth & verification concept",
        "A business concept related to authentication, verification, and user security.",
    ),
    (
        "Person / identity concept",
        "A business concept representing users, identity attributes, or profiles.",
    ),
    ("Data asset", "An asset that represents stored, managed, or governed data."),
    (
        "Governance asset",
        "A governance artifact (e.g., policy, rule, standard) used to manage data and compliance.",
    ),
    (
        "Physical data asset",
        "A physical data object (e.g., dataset, table, file) that stores data.",
    ),
    (
        "Semantic asset",
        "A semantic definition (e.g., business term, metric) that provides shared meaning for data.",
    ),
    (
        "Process",
        "A repeatable operational or technical activity that produces, transforms, or manages data.",
    ),
];

pub fn generate_definition(label: &str) -> String {
    SPECIAL_DEFINITIONS
        .iter()
        .find(|(special, _)| *special == label)
        .map(|(_, definition)| definition.to_string())
        .unwrap_or_else(|| format!("A {label} concept represented in the ontology."))
}

/// Fragment after `#`, else the last non-empty path segment.
pub fn local_name(iri: &str) -> &str {
    if let Some((_, fragment)) = iri.rsplit_once('#') {
        return fragment;
    }
    let trimmed = iri.trim_end_matches('/');
    trimmed.rsplit_once('/').map_or(trimmed, |(_, last)| last)
}
