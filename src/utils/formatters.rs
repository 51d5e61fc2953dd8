// Formatting utilities for log lines

/// Format duration in minutes to human readable (e.g., "2h 30m")
pub fn format_duration(minutes: f64) -> String {
    let total_secs = (minutes.max(0.0) * 60.0).round() as i64;
    let minutes = total_secs / 60;

    if minutes == 0 {
        format!("{}s", total_secs)
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let mins = minutes % 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}

/// Format points with two decimals
pub fn format_points(points: f64) -> String {
    format!("{:.2}", points)
}

/// Shorten a wallet address for logs (e.g., "0x1234...abcd")
pub fn mask_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        address.to_string()
    } else {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
