//! Number formatting for report output.

/// Thousands separators, no fractional part.
pub fn format_with_commas(number: f64) -> String {
    let digits = format!("{:.0}", number.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if number < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compact magnitude form: 1.2K, 3.4M, 5.6B.
pub fn format_large_number(number: f64) -> String {
    if number.abs() >= 1_000_000_000.0 {
        format!("{:.1}B", number / 1_000_000_000.0)
    } else if number.abs() >= 1_000_000.0 {
        format!("{:.1}M", number / 1_000_000.0)
    } else if number.abs() >= 1_000.0 {
        format!("{:.1}K", number / 1_000.0)
    } else {
        format!("{:.0}", number)
    }
}

/// Ordinal rank: 1st, 2nd, 3rd, 11th, 21st, ...
pub fn format_rank(rank: u64) -> String {
    let suffix = match rank % 10 {
        1 if rank % 100 != 11 => "st",
        2 if rank % 100 != 12 => "nd",
        3 if rank % 100 != 13 => "rd",
        _ => "th",
    };
    format!("{}{}", format_with_commas(rank as f64), suffix)
}

/// BTC amount at satoshi precision with trailing zeros trimmed.
pub fn format_btc(amount: f64) -> String {
    let fixed = format!("{:.8}", amount);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} BTC", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commas() {
        assert_eq!(format_with_commas(0.0), "0");
        assert_eq!(format_with_commas(999.0), "999");
        assert_eq!(format_with_commas(1_000.0), "1,000");
        assert_eq!(format_with_commas(40_000_000.0), "40,000,000");
    }

    #[test]
    fn test_large_number_suffixes() {
        assert_eq!(format_large_number(950.0), "950");
        assert_eq!(format_large_number(1_500.0), "1.5K");
        assert_eq!(format_large_number(2_400_000.0), "2.4M");
        assert_eq!(format_large_number(1_300_000_000.0), "1.3B");
    }

    #[test]
    fn test_rank_suffixes() {
        assert_eq!(format_rank(1), "1st");
        assert_eq!(format_rank(2), "2nd");
        assert_eq!(format_rank(3), "3rd");
        assert_eq!(format_rank(11), "11th");
        assert_eq!(format_rank(12), "12th");
        assert_eq!(format_rank(13), "13th");
        assert_eq!(format_rank(21), "21st");
        assert_eq!(format_rank(1_042), "1,042nd");
    }

    #[test]
    fn test_btc_formatting() {
        assert_eq!(format_btc(0.5), "0.5 BTC");
        assert_eq!(format_btc(0.00000001), "0.00000001 BTC");
        assert_eq!(format_btc(21.0), "21 BTC");
    }
}
