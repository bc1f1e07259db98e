const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];

/// Formats a byte count as a three-wide integer magnitude and a unit.
///
/// The magnitude is divided by 1024 until it falls within (-1024, 1024) and
/// is then truncated, not rounded: `1_500_000` is `"  1 MB"`.
pub fn human_readable_size(bytes: i64) -> String {
    let mut num = bytes as f64;
    for unit in UNITS {
        if num > -1024.0 && num < 1024.0 {
            return format!("{:>3} {}", num.trunc() as i64, unit);
        }
        num /= 1024.0;
    }
    format!("{:>3} TB", num.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sizes_are_bytes() {
        assert_eq!(human_readable_size(0), "  0 bytes");
        assert_eq!(human_readable_size(32), " 32 bytes");
        assert_eq!(human_readable_size(1023), "1023 bytes");
    }

    #[test]
    fn unit_boundaries() {
        assert_eq!(human_readable_size(1024), "  1 KB");
        assert_eq!(human_readable_size(1024 * 1024), "  1 MB");
        assert_eq!(human_readable_size(1024 * 1024 * 1024), "  1 GB");
        assert_eq!(human_readable_size(1024_i64.pow(4)), "  1 TB");
        assert_eq!(human_readable_size(5 * 1024_i64.pow(5)), "5120 TB");
    }

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(human_readable_size(1_500_000), "  1 MB");
        assert_eq!(human_readable_size(2047), "  1 KB");
    }

    #[test]
    fn negative_sizes() {
        assert_eq!(human_readable_size(-32), "-32 bytes");
        assert_eq!(human_readable_size(-2048), " -2 KB");
    }
}
