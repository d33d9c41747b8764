//! Resource quantity parsing and age rendering
//!
//! The control plane reports memory as quantity strings with binary-unit
//! suffixes ("512Mi", "16Gi") and CPU as bare core counts. Parsing here is
//! deliberately forgiving: anything unparsable yields zero (or None for
//! cores) so a single odd value never takes down a collection pass.

use chrono::{DateTime, Duration, Utc};

const BINARY_SUFFIXES: [(&str, u64); 4] = [
    ("Ki", 1 << 10),
    ("Mi", 1 << 20),
    ("Gi", 1 << 30),
    ("Ti", 1u64 << 40),
];

/// Parse a memory quantity string into bytes.
///
/// Recognizes the binary suffixes Ki/Mi/Gi/Ti; a bare integer passes through
/// as bytes. Never fails: empty or garbage input yields 0.
pub fn parse_memory(quantity: &str) -> u64 {
    let quantity = quantity.trim();
    if quantity.is_empty() {
        return 0;
    }
    for (suffix, scale) in BINARY_SUFFIXES {
        if let Some(digits) = quantity.strip_suffix(suffix) {
            return digits
                .parse::<u64>()
                .map(|n| n.saturating_mul(scale))
                .unwrap_or(0);
        }
    }
    quantity.parse().unwrap_or(0)
}

/// Parse a CPU quantity as a whole core count.
pub fn parse_cores(quantity: &str) -> Option<u32> {
    quantity.trim().parse().ok()
}

/// Render a resource age as its coarsest whole unit: days, then hours, then
/// minutes (which may be zero). A missing creation time renders "Unknown".
pub fn format_age(creation: Option<DateTime<Utc>>) -> String {
    age_between(creation, Utc::now())
}

fn age_between(creation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = creation else {
        return "Unknown".to_string();
    };
    // Clock skew can put creation in the future; clamp to zero
    let elapsed = (now - created).max(Duration::zero());

    if elapsed.num_days() >= 1 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() >= 1 {
        format!("{}h", elapsed.num_hours())
    } else {
        format!("{}m", elapsed.num_minutes())
    }
}
