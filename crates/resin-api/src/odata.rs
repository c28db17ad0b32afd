//! OData query helpers.
//!
//! The resin API speaks OData: collection lookups are filtered with
//! `$filter=<field> eq <literal>`. Literals that read as booleans or numbers
//! go out bare; everything else is single-quoted with embedded quotes doubled.

use std::borrow::Cow;

/// Build an equality filter expression, e.g. `uuid eq 'abc'`.
pub fn filter_eq(field: &str, value: &str) -> String {
    format!("{field} eq {}", literal(value))
}

/// Build an equality filter against a string column. Always quoted, so a
/// value like `4920753` still compares as text.
pub fn filter_eq_str(field: &str, value: &str) -> String {
    format!("{field} eq {}", quoted(value))
}

/// Render `value` as an OData literal.
pub fn literal(value: &str) -> Cow<'_, str> {
    if is_bare(value) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(quoted(value))
    }
}

fn quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn is_bare(value: &str) -> bool {
    matches!(value, "true" | "false")
        || value.parse::<i64>().is_ok()
        || value.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_quoted() {
        assert_eq!(
            filter_eq("uuid", "49b2a76b7f188c1d"),
            "uuid eq '49b2a76b7f188c1d'"
        );
        assert_eq!(literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn scalars_are_bare() {
        assert_eq!(filter_eq("id", "42"), "id eq 42");
        assert_eq!(filter_eq("is_online", "true"), "is_online eq true");
        assert_eq!(literal("1.5"), "1.5");
    }

    #[test]
    fn string_columns_always_quote() {
        assert_eq!(filter_eq_str("uuid", "4920753"), "uuid eq '4920753'");
        assert_eq!(filter_eq_str("uuid", "12e3"), "uuid eq '12e3'");
        assert_eq!(filter_eq_str("uuid", "it's"), "uuid eq 'it''s'");
    }

    #[test]
    fn non_finite_floats_are_strings() {
        assert_eq!(literal("inf"), "'inf'");
        assert_eq!(literal("NaN"), "'NaN'");
    }
}
