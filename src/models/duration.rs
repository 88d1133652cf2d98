use regex::Regex;
use std::sync::OnceLock;

/// Parse duration string like "30s", "2h", "30m", "1d" into seconds
pub fn parse_duration(duration_str: &str) -> Result<i64, String> {
    static DURATION_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = DURATION_REGEX
        .get_or_init(|| Regex::new(r"^(\d+)([smhd])$").expect("Invalid duration regex"));

    let caps = re.captures(duration_str).ok_or_else(|| {
        format!(
            "Invalid duration format: {}. Expected format: <number><s|m|h|d>",
            duration_str
        )
    })?;

    let number: i64 = caps[1]
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", &caps[1]))?;

    let unit = &caps[2];

    let seconds = match unit {
        "s" => number,
        "m" => number * 60,
        "h" => number * 60 * 60,
        "d" => number * 60 * 60 * 24,
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    if seconds <= 0 {
        return Err("Duration must be greater than 0".to_string());
    }

    Ok(seconds)
}
