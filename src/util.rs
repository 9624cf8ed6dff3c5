pub fn format_bytes(bytes: u64) -> String {
    let mut bytes = bytes as f64;
    let mut suffix = "B";

    for next in ["KiB", "MiB", "GiB", "TiB"] {
        if bytes <= 1024.0 {
            break;
        }
        bytes /= 1024.0;
        suffix = next;
    }

    format!("{:.2} {}", bytes, suffix)
}

/// Formats seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MiB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(212.4), "3:32");
        assert_eq!(format_duration(3723.0), "1:02:03");
        assert_eq!(format_duration(-5.0), "0:00");
    }
}
