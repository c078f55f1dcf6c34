// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rupiah as the id-ID locale renders it with no fraction digits,
/// e.g. `Rp 1.500.000` (the space is U+00A0) or `-Rp 200.000`.
///
/// Negative amounts keep their sign even when they round to zero
/// (`-0.4` renders as `-Rp 0`).
pub fn format_idr(amount: &Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    format!("{}Rp\u{a0}{}", sign, group_thousands(&digits, '.'))
}

fn group_thousands(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Signed month-over-month change: `+50%`, `-33%`, `0%`.
pub fn format_percentage(pct: i32) -> String {
    if pct > 0 {
        format!("+{}%", pct)
    } else {
        format!("{}%", pct)
    }
}
