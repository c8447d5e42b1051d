use crate::grid::CellValue;

// drops binary float noise: 0.07 * 100.0 == 7.000000000000001
const SCALE_PRECISION: f64 = 1e9;

/// Fractions in `(0, 1)` become whole-number percentages; anything else
/// (zero, negative, NaN, already >= 1) is returned unchanged.
pub fn normalize_percentage(value: f64) -> f64 {
    if value > 0.0 && value < 1.0 {
        let scaled = value * 100.0;
        let rounded = (scaled * SCALE_PRECISION).round() / SCALE_PRECISION;
        // tiny fractions would round to zero; keep them exact instead
        if rounded == 0.0 { scaled } else { rounded }
    } else {
        value
    }
}

// numeric text counts as a number
pub fn percentage_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        CellValue::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_become_whole_percentages() {
        assert_eq!(normalize_percentage(0.1), 10.0);
        assert_eq!(normalize_percentage(0.3), 30.0);
        assert_eq!(normalize_percentage(0.02), 2.0);
        assert_eq!(normalize_percentage(0.07), 7.0);
        assert_eq!(normalize_percentage(0.7), 70.0);
        assert_eq!(normalize_percentage(0.125), 12.5);
    }

    #[test]
    fn whole_percentages_are_left_alone() {
        assert_eq!(normalize_percentage(1.0), 1.0);
        assert_eq!(normalize_percentage(10.0), 10.0);
        assert_eq!(normalize_percentage(70.0), 70.0);
        assert_eq!(normalize_percentage(0.0), 0.0);
        assert_eq!(normalize_percentage(-0.5), -0.5);
        assert!(normalize_percentage(f64::NAN).is_nan());
    }

    #[test]
    fn idempotent() {
        for v in [0.1, 0.02, 0.3, 0.999, 1.0, 10.0, 70.0, 0.0] {
            let once = normalize_percentage(v);
            assert_eq!(normalize_percentage(once), once, "value {v}");
        }
    }

    #[test]
    fn tiny_fractions_never_become_zero() {
        assert_eq!(normalize_percentage(1e-13), 1e-13 * 100.0);
        assert!(normalize_percentage(4e-12) > 0.0);
        assert_eq!(normalize_percentage(5e-9), 5e-7);
    }

    #[test]
    fn numeric_text_counts_as_number() {
        assert_eq!(percentage_number(&CellValue::Number(0.1)), Some(0.1));
        assert_eq!(percentage_number(&CellValue::Text(" 0.25 ".into())), Some(0.25));
        assert_eq!(percentage_number(&CellValue::Text("10%".into())), None);
        assert_eq!(percentage_number(&CellValue::Text("NaN".into())), None);
        assert_eq!(percentage_number(&CellValue::Empty), None);
    }
}
