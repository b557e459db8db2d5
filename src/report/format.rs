//! Number formatting for the rendered dashboard (pt-BR conventions).

/// Format a value as Brazilian reais, e.g. `R$ 1.234,56`.
///
/// Cents are held in a `u64`, so magnitudes past `u64::MAX` cents saturate
/// and NaN formats as `R$ 0,00`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}R$ {},{:02}",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

/// Format an integer with `.` as the thousands separator.
pub fn format_count(value: usize) -> String {
    group_thousands(value as u64)
}

/// Format a fraction as a percentage with one decimal, e.g. `42,5%`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0).replace('.', ",")
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
