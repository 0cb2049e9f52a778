//! Display formatting shared by the dashboard, the CLI and CSV export

use unicode_width::UnicodeWidthChar;

/// `1234567` → `1 234 567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// `$12.35`
pub fn format_cost(value: f64) -> String {
    format!("${:.2}", value)
}

/// Per-request cost, which is usually a fraction of a cent
pub fn format_request_cost(value: f64) -> String {
    format!("${:.4}", value)
}

/// Average latency card value; a dash when the service has no data
pub fn format_latency(value: Option<f64>) -> String {
    match value {
        Some(seconds) if seconds > 0.0 => format!("{:.1}s", seconds),
        _ => "—".to_string(),
    }
}

/// Number of table pages, never less than one
pub fn page_count(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(u64::from(limit)).max(1)
}

/// Truncate to `max_width` terminal columns, ending with `…` when cut
pub fn truncate_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1 000");
        assert_eq!(group_thousands(1234567), "1 234 567");
    }

    #[test]
    fn test_costs() {
        assert_eq!(format_cost(12.346), "$12.35");
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_request_cost(0.00126), "$0.0013");
    }

    #[test]
    fn test_latency() {
        assert_eq!(format_latency(Some(1.26)), "1.3s");
        assert_eq!(format_latency(None), "—");
        assert_eq!(format_latency(Some(0.0)), "—");
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(5, 0), 1);
    }

    #[test]
    fn test_truncate_width() {
        assert_eq!(truncate_width("short", 10), "short");
        assert_eq!(truncate_width("abcdefgh", 5), "abcd…");
        assert_eq!(truncate_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_width("abc", 0), "");
    }
}
