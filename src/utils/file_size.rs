pub struct FileSizeUtils;

impl FileSizeUtils {
    /// Decimal (base-1000) size label with two decimals. Sizes never drop below KB.
    pub fn format_size(size: u64) -> String {
        const UNITS: [(u64, &str); 3] = [
            (1_000, "KB"),
            (1_000_000, "MB"),
            (1_000_000_000, "GB"),
        ];

        let (divisor, unit) = if size < 1_000_000 {
            UNITS[0]
        } else if size < 1_000_000_000 {
            UNITS[1]
        } else {
            UNITS[2]
        };

        // Ties round up, not to even.
        let value = (size as f64 / divisor as f64 * 100.0).round() / 100.0;
        format!("{:.2} {}", value, unit)
    }
}
