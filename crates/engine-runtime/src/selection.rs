//! Shell-style table selection.
//!
//! Patterns support `*`, `?` and bracket classes (`[abc]`, `[a-z]`, `[!0-9]`).
//! Matching is case-sensitive. An unterminated `[` matches itself.

/// Keeps the tables matching any `include` pattern (all tables when `include`
/// is absent), then drops those matching any `exclude` pattern. Source order
/// is preserved and duplicates are removed.
pub fn select_tables(
    tables: &[String],
    include: Option<&[String]>,
    exclude: Option<&[String]>,
) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();

    for table in tables {
        let included = include.is_none_or(|patterns| matches_any(patterns, table));
        let excluded = exclude.is_some_and(|patterns| matches_any(patterns, table));

        if included && !excluded && !selected.contains(table) {
            selected.push(table.clone());
        }
    }

    selected
}

fn matches_any(patterns: &[String], name: &str) -> bool {
    patterns.iter().any(|p| glob_match(p, name))
}

pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` and the name index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, n));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    n += 1;
                    continue;
                }
                '[' => match match_class(&pattern, p, name[n]) {
                    Some((true, next)) => {
                        p = next;
                        n += 1;
                        continue;
                    }
                    Some((false, _)) => {}
                    None if name[n] == '[' => {
                        p += 1;
                        n += 1;
                        continue;
                    }
                    None => {}
                },
                c if c == name[n] => {
                    p += 1;
                    n += 1;
                    continue;
                }
                _ => {}
            }
        }

        match backtrack {
            Some((star, absorbed)) => {
                p = star + 1;
                n = absorbed + 1;
                backtrack = Some((star, absorbed + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Matches `ch` against the class opening at `start`. Returns whether it
/// matched and the index after the closing `]`, or `None` if unterminated.
fn match_class(pattern: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = matches!(pattern.get(i), Some('!'));
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;

    loop {
        let c = *pattern.get(i)?;
        if c == ']' && !first {
            return Some((matched != negate, i + 1));
        }

        if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|&e| e != ']') {
            let end = pattern[i + 2];
            matched |= c <= ch && ch <= end;
            i += 3;
        } else {
            matched |= c == ch;
            i += 1;
        }
        first = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_include_then_exclude() {
        let tables = names(&["users", "user_logs", "orders", "order_items"]);
        let include = names(&["user*"]);
        let exclude = names(&["*_logs"]);

        let selected = select_tables(&tables, Some(&include), Some(&exclude));
        assert_eq!(selected, names(&["users"]));
    }

    #[test]
    fn test_no_include_keeps_everything_not_excluded() {
        let tables = names(&["users", "user_logs", "orders"]);
        let exclude = names(&["order?"]);

        assert_eq!(
            select_tables(&tables, None, Some(&exclude)),
            names(&["users", "user_logs"])
        );
        assert_eq!(select_tables(&tables, None, None), tables);
    }

    #[test]
    fn test_overlapping_includes_do_not_duplicate() {
        let tables = names(&["users", "orders"]);
        let include = names(&["u*", "*s"]);

        assert_eq!(
            select_tables(&tables, Some(&include), None),
            names(&["users", "orders"])
        );
    }

    #[test]
    fn test_glob_wildcards() {
        assert!(glob_match("*", ""));
        assert!(glob_match("user*", "users"));
        assert!(glob_match("*_logs", "user_logs"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
        assert!(glob_match("t?ble", "table"));
        assert!(!glob_match("t?ble", "tble"));
        assert!(!glob_match("Users", "users"));
    }

    #[test]
    fn test_glob_classes() {
        assert!(glob_match("log_[0-9]", "log_7"));
        assert!(!glob_match("log_[0-9]", "log_x"));
        assert!(glob_match("log_[!0-9]", "log_x"));
        assert!(glob_match("[]]x", "]x"));
        assert!(glob_match("[a-]", "-"));
        assert!(glob_match("data[", "data["));
    }
}
