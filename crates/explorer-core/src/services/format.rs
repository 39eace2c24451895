//! Display formatting shared by the snapshot builders.

const GWEI_PER_ETH: f64 = 1_000_000_000.0;

#[must_use]
pub fn format_yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

/// Gwei amount as ETH with two decimals, e.g. `"32.00 ETH"`.
#[must_use]
pub fn format_balance(gwei: u64) -> String {
    format!("{:.2} ETH", gwei_to_eth(gwei))
}

/// Participation fraction as a percentage with two decimals.
#[must_use]
pub fn format_participation_rate(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Label for a block status code.
#[must_use]
pub fn format_block_status(status: &str) -> String {
    match status {
        "0" => "Scheduled",
        "1" => "Proposed",
        "2" => "Missed",
        "3" => "Orphaned",
        _ => "Unknown",
    }
    .to_string()
}

/// Validator index, followed by the registered name in parentheses when there is one.
#[must_use]
pub fn format_validator(index: u64, name: &str) -> String {
    if name.is_empty() {
        index.to_string()
    } else {
        format!("{index} ({name})")
    }
}

/// Lowercase hex without a `0x` prefix.
#[must_use]
pub fn format_root(root: &[u8]) -> String {
    hex::encode(root)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn gwei_to_eth(gwei: u64) -> f64 {
    gwei as f64 / GWEI_PER_ETH
}
