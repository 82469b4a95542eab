// Rate-limit bookkeeping.
//
// Providers report the remaining request quota in a response header. The value
// is informational: it is recorded per account and exposed for reporting, no
// request is delayed or refused because of it.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Converts a raw header value to an integer with truncating numeric
/// semantics: decimal, exponent and `0x` hex forms are honoured (surrounding
/// whitespace ignored), fractions are truncated toward zero and the result
/// wraps into the 32-bit signed range. Absent, empty or non-numeric input
/// yields 0.
pub fn remaining_from_header(value: Option<&str>) -> i32 {
    let Some(raw) = value else {
        return 0;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }

    let number = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).map(|n| n as f64).ok(),
        None if is_decimal_literal(trimmed) => trimmed.parse::<f64>().ok(),
        None => None,
    };

    match number {
        Some(n) => wrap_to_i32(n),
        None => 0,
    }
}

// `f64::from_str` also accepts "inf" and "NaN", which are not numeric here.
fn is_decimal_literal(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn wrap_to_i32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let truncated = n.trunc();
    let modulo = truncated.rem_euclid(4_294_967_296.0);
    if modulo >= 2_147_483_648.0 {
        (modulo - 4_294_967_296.0) as i32
    } else {
        modulo as i32
    }
}

/// Last observed budget for one account.
struct Budget {
    remaining: i64,
    observed_at: Instant,
}

/// Per-account remaining-request tracker.
///
/// Accounts start at `default_remaining`. An observation older than
/// `reset_after` is treated as expired and the default is reported again.
/// State is in-memory only.
pub struct RateLimitTracker {
    budgets: DashMap<String, Budget>,
    default_remaining: i64,
    reset_after: Duration,
}

impl RateLimitTracker {
    pub fn new(default_remaining: i64, reset_after: Duration) -> Self {
        Self {
            budgets: DashMap::new(),
            default_remaining,
            reset_after,
        }
    }

    /// Records the remaining count reported for `account`.
    pub fn record(&self, account: &str, remaining: i64) {
        self.budgets.insert(
            account.to_string(),
            Budget {
                remaining,
                observed_at: Instant::now(),
            },
        );
    }

    /// Remaining requests for `account`.
    pub fn remaining(&self, account: &str) -> i64 {
        match self.budgets.get(account) {
            Some(budget) if budget.observed_at.elapsed() < self.reset_after => budget.remaining,
            _ => self.default_remaining,
        }
    }
}
