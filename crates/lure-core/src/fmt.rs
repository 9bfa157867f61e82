//! Human-readable counter values for the text report.

use crate::counters::is_byte_volume;

const SI_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Format byte count as a decimal (SI) size.
///
/// `"512 B"`, `"6.0 kB"`, `"268 MB"`: one decimal below 10 of a unit,
/// none above.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1000 && exp < SI_UNITS.len() - 1 {
        scaled /= 1000;
        exp += 1;
    }

    let value = bytes as f64 / 1000f64.powi(exp as i32);
    let rounded = (value * 10.0 + 0.5).floor() / 10.0;
    if rounded < 10.0 {
        format!("{:.1} {}", rounded, SI_UNITS[exp])
    } else {
        format!("{:.0} {}", rounded, SI_UNITS[exp])
    }
}

/// Display form of one counter rate: sizes for byte-volume counters, plain
/// integers for everything else.
pub fn format_counter(name: &str, value: u64) -> String {
    if is_byte_volume(name) {
        format_bytes(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(9), "9 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(6000), "6.0 kB");
        assert_eq!(format_bytes(1_234_567), "1.2 MB");
        assert_eq!(format_bytes(268_435_456), "268 MB");
        assert_eq!(format_bytes(16_777_216), "17 MB");
        assert_eq!(format_bytes(u64::MAX), "18 EB");
    }

    #[test]
    fn test_format_counter() {
        assert_eq!(format_counter("read_bytes", 6000), "6.0 kB");
        assert_eq!(format_counter("open", 6000), "6000");
        assert_eq!(format_counter("write_bytes", 0), "0 B");
    }
}
