//! Timeout string parsing: "30s", "2m", "1h30m", "90" (bare seconds).

use crate::error::AgentError;

/// Parse a user-supplied timeout into whole seconds.
///
/// Accepts `h`/`m`/`s` suffixed segments in descending order ("2h3m10s")
/// or a bare integer meaning seconds. An empty string is the caller's
/// "no timeout" sentinel and is rejected here; callers check for it first.
/// Upper bound on a single experiment's timeout: one year in seconds.
/// Anything larger is a typo, and keeps expiry arithmetic far from
/// integer limits.
const MAX_TIMEOUT_SECS: u64 = 365 * 24 * 3600;

pub fn parse_timeout_secs(s: &str) -> Result<u64, AgentError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AgentError::Validation("timeout is empty".into()));
    }

    if let Ok(n) = s.parse::<u64>() {
        return check_bound(s, n);
    }

    let mut total: u64 = 0;
    let mut num = String::new();
    let mut seen_unit = false;

    for c in s.chars() {
        if c.is_ascii_digit() {
            num.push(c);
            continue;
        }
        let factor = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => {
                return Err(AgentError::Validation(format!(
                    "invalid timeout [{s}]: unexpected character '{c}'"
                )))
            }
        };
        if num.is_empty() {
            return Err(AgentError::Validation(format!(
                "invalid timeout [{s}]: unit '{c}' without a number"
            )));
        }
        let n: u64 = num
            .parse()
            .map_err(|e| AgentError::Validation(format!("invalid timeout [{s}]: {e}")))?;
        total = n
            .checked_mul(factor)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| AgentError::Validation(format!("timeout [{s}] overflows")))?;
        num.clear();
        seen_unit = true;
    }

    if !num.is_empty() || !seen_unit {
        return Err(AgentError::Validation(format!(
            "invalid timeout [{s}]: trailing number without unit"
        )));
    }

    check_bound(s, total)
}

fn check_bound(s: &str, secs: u64) -> Result<u64, AgentError> {
    if secs > MAX_TIMEOUT_SECS {
        return Err(AgentError::Validation(format!(
            "timeout [{s}] exceeds the one year maximum"
        )));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_segments() {
        assert_eq!(parse_timeout_secs("30s").unwrap(), 30);
        assert_eq!(parse_timeout_secs("2m").unwrap(), 120);
        assert_eq!(parse_timeout_secs("1h30m").unwrap(), 5400);
        assert_eq!(parse_timeout_secs("2h3m10s").unwrap(), 7390);
    }

    #[test]
    fn parses_bare_seconds() {
        assert_eq!(parse_timeout_secs("90").unwrap(), 90);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timeout_secs("").is_err());
        assert!(parse_timeout_secs("s").is_err());
        assert!(parse_timeout_secs("10x").is_err());
        assert!(parse_timeout_secs("3m5").is_err());
    }

    #[test]
    fn rejects_absurd_durations() {
        // u64-overflowing segment multiply
        assert!(parse_timeout_secs("99999999999999999999h").is_err());
        assert!(parse_timeout_secs("9999999999999999999h").is_err());
        // parseable but beyond the one year bound
        assert!(parse_timeout_secs("9000h").is_err());
        assert!(parse_timeout_secs("99999999999").is_err());
        // the bound itself is accepted
        assert_eq!(parse_timeout_secs("8760h").unwrap(), 365 * 24 * 3600);
    }
}
