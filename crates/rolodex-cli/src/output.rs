//! Formatted output helpers for CLI commands.

/// Formats a byte count into a human-readable string (e.g., "1.5 KiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;

    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Shortens a hex digest to its first 12 characters for table output.
#[must_use]
pub fn short_digest(hex: &str) -> &str {
    hex.get(..12).unwrap_or(hex)
}
