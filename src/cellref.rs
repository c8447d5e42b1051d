use std::sync::OnceLock;

use regex::Regex;

fn a1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]{1,7})$").expect("valid regex"))
}

/// 0 -> A, 25 -> Z, 26 -> AA ...
pub fn column_name(col: usize) -> String {
    let mut n = col + 1;
    let mut name = String::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    name
}

pub fn parse_column(name: &str) -> Option<usize> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut n = 0usize;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

pub fn to_a1(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Parses `"G2"` (or `"$G$2"`) into `(row, col)` = `(1, 6)`.
pub fn parse_a1(reference: &str) -> Option<(usize, usize)> {
    let caps = a1_pattern().captures(reference.trim())?;
    let col = parse_column(caps.get(1)?.as_str())?;
    let row: usize = caps.get(2)?.as_str().parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(6), "G");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn parse_column_inverts_column_name() {
        for col in [0, 9, 10, 25, 26, 51, 700, 702] {
            assert_eq!(parse_column(&column_name(col)), Some(col));
        }
        assert_eq!(parse_column("k"), Some(10));
        assert_eq!(parse_column(""), None);
        assert_eq!(parse_column("A1"), None);
    }

    #[test]
    fn a1_references() {
        assert_eq!(to_a1(1, 6), "G2");
        assert_eq!(parse_a1("G2"), Some((1, 6)));
        assert_eq!(parse_a1("$K$5"), Some((4, 10)));
        assert_eq!(parse_a1(" c10 "), Some((9, 2)));
        assert_eq!(parse_a1("A0"), None);
        assert_eq!(parse_a1("12"), None);
        assert_eq!(parse_a1("G"), None);
    }
}
