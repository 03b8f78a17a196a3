//! Ordered classification rule tables.
//!
//! Every heuristic that used to be an inline substring check lives here as
//! data. Order matters: lookups walk a table front to back and stop at the
//! first hit.

use crate::model::{DataType, Domain};

/// `keyword` found (case-insensitively) in a name yields `label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRule<T> {
    pub keyword: &'static str,
    pub label: T,
}

impl<T: Copy> KeywordRule<T> {
    pub const fn new(keyword: &'static str, label: T) -> Self {
        Self { keyword, label }
    }
}

/// Domain keywords; `financial` is checked before `account`.
pub const DOMAIN_RULES: &[KeywordRule<Domain>] = &[
    KeywordRule::new("financial", Domain::Finance),
    KeywordRule::new("account", Domain::Account),
];

pub const DEFAULT_DOMAIN: Domain = Domain::General;

/// Marker that flags an enriched physical table.
pub const ENRICHED_MARKER: &str = "enriched";

/// Substring a column name must carry to take part in key heuristics.
pub const ID_MARKER: &str = "id";

/// Source type tokens, matched against the lowercased base token.
pub const TYPE_TOKENS: &[(&str, DataType)] = &[
    ("bigint", DataType::Integer),
    ("int", DataType::Integer),
    ("integer", DataType::Integer),
    ("smallint", DataType::Integer),
    ("tinyint", DataType::Integer),
    ("long", DataType::Integer),
    ("varchar", DataType::String),
    ("nvarchar", DataType::String),
    ("char", DataType::String),
    ("text", DataType::String),
    ("string", DataType::String),
    ("decimal", DataType::Decimal),
    ("numeric", DataType::Decimal),
    ("number", DataType::Decimal),
    ("float", DataType::Decimal),
    ("double", DataType::Decimal),
    ("timestamp", DataType::Datetime),
    ("timestamp_ntz", DataType::Datetime),
    ("timestamp_tz", DataType::Datetime),
    ("timestamptz", DataType::Datetime),
    ("datetime", DataType::Datetime),
    ("date", DataType::Date),
];

pub const DEFAULT_DATA_TYPE: DataType = DataType::String;

/// First rule whose keyword occurs in `name`, ignoring case.
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], name: &str) -> Option<T> {
    let lower = name.to_lowercase();
    rules
        .iter()
        .find(|rule| lower.contains(&rule.keyword.to_lowercase()))
        .map(|rule| rule.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rule_wins_over_later_ones() {
        // Both keywords present: precedence follows table order.
        assert_eq!(
            first_match(DOMAIN_RULES, "foundation.financial.ledger_account_balances"),
            Some(Domain::Finance)
        );

        let reversed = [
            KeywordRule::new("account", Domain::Account),
            KeywordRule::new("financial", Domain::Finance),
        ];
        assert_eq!(
            first_match(&reversed, "foundation.financial.ledger_account_balances"),
            Some(Domain::Account)
        );
    }

    #[test]
    fn no_rule_matches() {
        assert_eq!(first_match(DOMAIN_RULES, "marketing.campaigns"), None);
    }

    #[test]
    fn labels_may_borrow_from_local_data() {
        let owners = vec![String::from("treasury"), String::from("support")];
        let rules = [
            KeywordRule::new("ledger", owners[0].as_str()),
            KeywordRule::new("ticket", owners[1].as_str()),
        ];
        assert_eq!(first_match(&rules, "ops.TICKET_queue"), Some("support"));
        assert_eq!(first_match(&rules, "ops.calls"), None);
    }

    #[test]
    fn type_tokens_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for (token, _) in TYPE_TOKENS {
            assert_eq!(*token, token.to_lowercase());
            assert!(seen.insert(*token), "duplicate token {token}");
        }
    }
}
