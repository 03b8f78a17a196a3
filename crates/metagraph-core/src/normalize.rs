//! Name and type normalization.
//!
//! Every function here is total: unknown or odd input degrades to a safe
//! canonical value instead of failing the run. Name normalizers are
//! idempotent.

use std::sync::LazyLock;

use inflector::Inflector;
use regex::Regex;

use crate::model::{DataType, Domain, TableType};
use crate::rules::{
    first_match, KeywordRule, DEFAULT_DATA_TYPE, DEFAULT_DOMAIN, DOMAIN_RULES, ENRICHED_MARKER,
    ID_MARKER, TYPE_TOKENS,
};

static VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_v\d+").unwrap());
static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-]+").unwrap());
static CAMEL_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static REPEATED_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").unwrap());

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '[', ']'];

/// Canonical business-concept name for a physical table identifier.
///
/// `foundation.financial.deposits_v4` and
/// `"foundation"."financial"."deposits_enriched_v1"` both become `deposits`.
pub fn normalize_table_name(physical_name: &str) -> String {
    let unquoted: String = physical_name
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect();
    let lower = unquoted.to_lowercase();
    let segment = lower
        .rsplit('.')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("");

    strip_variant_suffixes(segment)
}

/// Remove version and enriched suffixes until nothing changes, so that a
/// removal exposing another suffix (`x_v_enriched1` -> `x_v1`) is handled too.
fn strip_variant_suffixes(name: &str) -> String {
    let enriched = format!("_{ENRICHED_MARKER}");
    let mut current = name.trim().to_string();
    loop {
        let next = VERSION_SUFFIX
            .replace_all(&current, "")
            .replace(&enriched, "")
            .trim()
            .to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Lower snake case column name (`userId`, `User ID`, `user__id` -> `user_id`).
pub fn normalize_column_name(raw_name: &str) -> String {
    let name = raw_name.trim();
    let name = SEPARATOR_RUN.replace_all(name, "_");
    let name = CAMEL_WORD.replace_all(&name, "${1}_${2}");
    let name = CAMEL_BOUNDARY.replace_all(&name, "${1}_${2}");
    let name = name.to_lowercase();
    REPEATED_UNDERSCORE.replace_all(&name, "_").into_owned()
}

/// Map a source type token onto the canonical type set.
///
/// Matching is on the lowercased base token, so `VARCHAR(255)` and
/// `timestamp with time zone` resolve like `varchar` and `timestamp`.
pub fn normalize_data_type(raw_type: &str) -> DataType {
    let lower = raw_type.trim().to_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("");

    TYPE_TOKENS
        .iter()
        .find(|(token, _)| *token == base)
        .map(|(_, data_type)| *data_type)
        .unwrap_or(DEFAULT_DATA_TYPE)
}

pub fn classify_table_type(physical_name: &str) -> TableType {
    if physical_name.to_lowercase().contains(ENRICHED_MARKER) {
        TableType::Enriched
    } else {
        TableType::Raw
    }
}

pub fn assign_domain(physical_name: &str) -> Domain {
    assign_domain_with(DOMAIN_RULES, physical_name)
}

/// Same as [`assign_domain`] with a caller-supplied, ordered rule table.
pub fn assign_domain_with(rules: &[KeywordRule<Domain>], physical_name: &str) -> Domain {
    first_match(rules, physical_name).unwrap_or(DEFAULT_DOMAIN)
}

/// Self-referential key heuristic: the column carries `id` and the table's
/// own name, either as written or in singular form (`deposit_id` on
/// `deposits`).
pub fn is_self_key(column_name: &str, table_name: &str) -> bool {
    if table_name.is_empty() || !column_name.contains(ID_MARKER) {
        return false;
    }
    if column_name.contains(table_name) {
        return true;
    }
    let singular = singular_form(table_name);
    !singular.is_empty() && column_name.contains(&singular)
}

/// Singularize the last `_` segment only: `ledger_lines` -> `ledger_line`.
fn singular_form(table_name: &str) -> String {
    match table_name.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", last.to_singular()),
        None => table_name.to_singular(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_strips_prefix_version_and_enriched() {
        assert_eq!(normalize_table_name("foundation.financial.deposits_v4"), "deposits");
        assert_eq!(
            normalize_table_name("foundation.financial.deposits_enriched_v1"),
            "deposits"
        );
        assert_eq!(
            normalize_table_name("FOUNDATION.FINANCIAL.LEDGER_LINES_ENRICHED_V1"),
            "ledger_lines"
        );
        assert_eq!(
            normalize_table_name(r#""foundation_views"."financial"."withdrawals_v4""#),
            "withdrawals"
        );
        assert_eq!(
            normalize_table_name("foundation.account.verified_user_details"),
            "verified_user_details"
        );
    }

    #[test]
    fn table_name_variants_unify() {
        assert_eq!(
            normalize_table_name("foundation.financial.deposits_v4"),
            normalize_table_name("foundation.financial.deposits_enriched_v1")
        );
    }

    #[test]
    fn table_name_handles_exposed_suffixes() {
        let once = normalize_table_name("x_v_enriched1");
        assert_eq!(once, "x");
        assert_eq!(normalize_table_name(&once), once);
    }

    #[test]
    fn table_name_edge_inputs() {
        assert_eq!(normalize_table_name(""), "");
        assert_eq!(normalize_table_name("..."), "");
        assert_eq!(normalize_table_name("schema.orders."), "orders");
        assert_eq!(normalize_table_name("  [dbo].[Orders_v12]  "), "orders");
    }

    #[test]
    fn column_name_snake_cases() {
        assert_eq!(normalize_column_name("userId"), "user_id");
        assert_eq!(normalize_column_name("UserID"), "user_id");
        assert_eq!(normalize_column_name("  ledger_line_id "), "ledger_line_id");
        assert_eq!(normalize_column_name("getHTTPResponse"), "get_http_response");
        assert_eq!(normalize_column_name("User_Id"), "user_id");
        assert_eq!(normalize_column_name("as of date"), "as_of_date");
        assert_eq!(normalize_column_name("device--type"), "device_type");
    }

    #[test]
    fn column_name_is_idempotent_on_samples() {
        for raw in ["userId", "AccountID", "as-of Date", "already_snake", "X"] {
            let once = normalize_column_name(raw);
            assert_eq!(normalize_column_name(&once), once, "input {raw}");
        }
    }

    #[test]
    fn data_type_known_tokens() {
        assert_eq!(normalize_data_type("bigint"), DataType::Integer);
        assert_eq!(normalize_data_type("INT"), DataType::Integer);
        assert_eq!(normalize_data_type("varchar"), DataType::String);
        assert_eq!(normalize_data_type("VARCHAR(255)"), DataType::String);
        assert_eq!(normalize_data_type("decimal(18,2)"), DataType::Decimal);
        assert_eq!(normalize_data_type("timestamp"), DataType::Datetime);
        assert_eq!(normalize_data_type("timestamp with time zone"), DataType::Datetime);
        assert_eq!(normalize_data_type("Date"), DataType::Date);
    }

    #[test]
    fn data_type_unknown_defaults_to_string() {
        assert_eq!(normalize_data_type("geography"), DataType::String);
        assert_eq!(normalize_data_type(""), DataType::String);
        assert_eq!(normalize_data_type("   "), DataType::String);
    }

    #[test]
    fn table_type_classification() {
        assert_eq!(
            classify_table_type("foundation.financial.deposits_enriched_v1"),
            TableType::Enriched
        );
        assert_eq!(classify_table_type("X.ENRICHED_ORDERS"), TableType::Enriched);
        assert_eq!(classify_table_type("foundation.financial.deposits_v4"), TableType::Raw);
    }

    #[test]
    fn domain_assignment() {
        assert_eq!(assign_domain("foundation.financial.deposits_v4"), Domain::Finance);
        assert_eq!(
            assign_domain("foundation.account.verified_user_details"),
            Domain::Account
        );
        assert_eq!(assign_domain("marketing.campaigns"), Domain::General);
        assert_eq!(
            assign_domain("foundation.financial.ledger_account_balances_v1"),
            Domain::Finance
        );
    }

    #[test]
    fn domain_assignment_with_custom_rules() {
        let rules = [KeywordRule::new("campaign", Domain::Account)];
        assert_eq!(assign_domain_with(&rules, "marketing.campaigns"), Domain::Account);
        assert_eq!(assign_domain_with(&[], "foundation.financial.x"), Domain::General);
    }

    #[test]
    fn self_key_heuristic() {
        assert!(is_self_key("deposit_id", "deposits"));
        assert!(!is_self_key("user_id", "deposits"));
        assert!(is_self_key("ledger_line_id", "ledger_lines"));
        assert!(is_self_key("withdrawal_id", "withdrawals"));
        assert!(!is_self_key("deposit_date", "deposits"));
        assert!(!is_self_key("user_id", ""));
    }
}
