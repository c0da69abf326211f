use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_string(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

pub fn fit_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

pub fn mean_1dp<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| round_1dp(sum / count as f64))
}

pub fn round_1dp(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn percent_1dp(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_1dp(100.0 * part as f64 / whole as f64)
    }
}
