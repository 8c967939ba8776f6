// BRL money formatting (pt-BR conventions: "." groups thousands, "," is the decimal mark)

const SCALES: &[(f64, &str)] = &[(1e12, "tri"), (1e9, "bi"), (1e6, "mi"), (1e3, "mil")];

/// Compact currency label for cards, e.g. "R$ 1,5 mi", "R$ 250 mil", "R$ 900"
///
/// Values below 100 in their scale keep two significant digits; larger ones
/// round to a whole number.
pub fn format_brl_compact(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let mut scale_idx = SCALES.iter().position(|(factor, _)| abs >= *factor);
    let mut scaled = round_compact(match scale_idx {
        Some(idx) => abs / SCALES[idx].0,
        None => abs,
    });

    // 999_999 rounds to "1000 mil", which should read "1 mi"
    if scaled >= 1000.0 {
        let next = match scale_idx {
            None => Some(SCALES.len() - 1),
            Some(0) => None,
            Some(idx) => Some(idx - 1),
        };
        if let Some(next_idx) = next {
            scale_idx = Some(next_idx);
            scaled = round_compact(abs / SCALES[next_idx].0);
        }
    }

    let number = format_decimal_trimmed(scaled);
    match scale_idx {
        Some(idx) => format!("{}R$ {} {}", sign, number, SCALES[idx].1),
        None => format!("{}R$ {}", sign, number),
    }
}

/// Full currency label with cents, e.g. "R$ 1.500.000,00"
pub fn format_brl(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents_total = (value.abs() * 100.0).round() as u64;
    let units = cents_total / 100;
    let cents = cents_total % 100;
    format!("{}R$ {},{:02}", sign, group_thousands(units), cents)
}

fn round_compact(value: f64) -> f64 {
    if value < 10.0 {
        (value * 10.0).round() / 10.0
    } else {
        value.round()
    }
}

fn format_decimal_trimmed(value: f64) -> String {
    if value.fract() == 0.0 {
        group_thousands(value as u64)
    } else {
        format!("{:.1}", value).replace('.', ",")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_small_values() {
        assert_eq!(format_brl_compact(0.0), "R$ 0");
        assert_eq!(format_brl_compact(900.0), "R$ 900");
        assert_eq!(format_brl_compact(1.5), "R$ 1,5");
    }

    #[test]
    fn test_compact_scales() {
        assert_eq!(format_brl_compact(1_500.0), "R$ 1,5 mil");
        assert_eq!(format_brl_compact(12_345.0), "R$ 12 mil");
        assert_eq!(format_brl_compact(250_000.0), "R$ 250 mil");
        assert_eq!(format_brl_compact(1_500_000.0), "R$ 1,5 mi");
        assert_eq!(format_brl_compact(2_000_000_000.0), "R$ 2 bi");
    }

    #[test]
    fn test_compact_rounds_into_next_scale() {
        assert_eq!(format_brl_compact(999_999.0), "R$ 1 mi");
        assert_eq!(format_brl_compact(999.9), "R$ 1 mil");
    }

    #[test]
    fn test_compact_negative() {
        assert_eq!(format_brl_compact(-2_500.0), "-R$ 2,5 mil");
    }

    #[test]
    fn test_full_format() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(950.5), "R$ 950,50");
        assert_eq!(format_brl(1_500_000.0), "R$ 1.500.000,00");
        assert_eq!(format_brl(-1234.567), "-R$ 1.234,57");
    }
}
