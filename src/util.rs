const KIB: u64 = 1_024;
const MIB: u64 = 1_024 * 1_024;

pub fn format_bytes(bytes: u64) -> String {
    const GIB: f64 = 1_024.0 * 1_024.0 * 1_024.0;

    let b = bytes as f64;
    if b >= GIB {
        format!("{:.1} GB", b / GIB)
    } else if bytes >= MIB {
        format!("{:.1} MB", b / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", b / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Whole kilobytes, rounded down.
pub fn to_kb(bytes: u64) -> u64 {
    bytes / KIB
}

/// Megabytes rounded to nearest, ties to even.
pub fn to_mb(bytes: u64) -> u64 {
    let whole = bytes / MIB;
    let rem = bytes % MIB;
    let half = MIB / 2;

    if rem > half || (rem == half && whole % 2 == 1) {
        whole + 1
    } else {
        whole
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kb_rounds_down() {
        assert_eq!(to_kb(0), 0);
        assert_eq!(to_kb(1_023), 0);
        assert_eq!(to_kb(2_047), 1);
        assert_eq!(to_kb(716_800 * 1_024), 716_800);
    }

    #[test]
    fn mb_rounds_to_nearest() {
        assert_eq!(to_mb(700 * MIB), 700);
        assert_eq!(to_mb(700 * MIB + MIB / 2 + 1), 701);
        assert_eq!(to_mb(700 * MIB + MIB / 2 - 1), 700);
    }

    #[test]
    fn mb_ties_go_to_even() {
        assert_eq!(to_mb(MIB / 2), 0);
        assert_eq!(to_mb(MIB + MIB / 2), 2);
        assert_eq!(to_mb(2 * MIB + MIB / 2), 2);
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2_048), "2.0 KB");
        assert_eq!(format_bytes(700 * MIB), "700.0 MB");
        assert_eq!(format_bytes(3 * 1_024 * MIB), "3.0 GB");
    }
}
