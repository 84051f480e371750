// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Normalization of names and values into tokens that are safe to use as
//! directory names and as unquoted CSV fields.

use std::borrow::Cow;

/// Replacement for every character that is unsafe in the current context.
pub const REPLACEMENT: char = '_';

/// Characters rejected by common file systems on top of path separators and whitespace.
const DISALLOWED_IN_PATH: &[char] = &[':', '*', '?', '"', '<', '>', '|', '='];

fn is_unsafe_in_path(c: char) -> bool {
    std::path::is_separator(c)
        || c == '/'
        || c == '\\'
        || c.is_whitespace()
        || c.is_control()
        || DISALLOWED_IN_PATH.contains(&c)
}

fn replace_if(value: &str, pred: impl Fn(char) -> bool) -> Cow<'_, str> {
    if value.chars().any(&pred) {
        Cow::Owned(
            value
                .chars()
                .map(|c| if pred(c) { REPLACEMENT } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}

/// Sanitize a table name or partition value so it forms exactly one path component.
pub fn sanitize_path_token(value: &str) -> Cow<'_, str> {
    replace_if(value, is_unsafe_in_path)
}

/// Sanitize a column name or cell value so it never splits a field or a record.
///
/// Distinct names can collapse into the same token (`a,b` and `a_b`). Such columns
/// stay separate fields, so the header then repeats the token.
pub fn sanitize_field(value: &str, delimiter: char) -> Cow<'_, str> {
    replace_if(value, |c| c == delimiter || c == '\n' || c == '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_token_untouched() {
        assert!(matches!(
            sanitize_path_token("Feature1"),
            Cow::Borrowed("Feature1")
        ));
        assert_eq!(sanitize_path_token("N-A.v2"), "N-A.v2");
    }

    #[test]
    fn test_path_token_replaced() {
        assert_eq!(sanitize_path_token("a/b\\c d"), "a_b_c_d");
        assert_eq!(sanitize_path_token("x:y*z?"), "x_y_z_");
        assert_eq!(sanitize_path_token("k=v|w"), "k_v_w");
        assert_eq!(sanitize_path_token("tab\there"), "tab_here");
    }

    #[test]
    fn test_field_only_touches_delimiter_and_newlines() {
        assert_eq!(sanitize_field("a,b\nc\r\nd", ','), "a_b_c__d");
        assert_eq!(sanitize_field("N/A with space", ','), "N/A with space");
        assert_eq!(sanitize_field("a,b|c", '|'), "a,b_c");
    }
}
