// ---------------------------------------------------------------------------
// Display-facing formatting helpers
// ---------------------------------------------------------------------------

/// Render the row-count summary shown above the table:
/// `"Filtered rows: {filtered} / {total}"` while a filter narrows the view,
/// `"Total rows: {total}"` otherwise. Counts are thousands-separated.
pub fn format_row_count(total_rows: usize, filtered_rows: Option<usize>) -> String {
    match filtered_rows {
        Some(filtered) if filtered != total_rows => {
            format!(
                "Filtered rows: {} / {}",
                thousands(filtered),
                thousands(total_rows)
            )
        }
        _ => format!("Total rows: {}", thousands(total_rows)),
    }
}

/// Group digits in threes: `1234567` → `"1,234,567"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Human-readable file size, e.g. `"1.50 MB"`.
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} TB")
}
