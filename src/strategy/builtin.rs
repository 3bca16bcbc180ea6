//! Built-in masking strategies
//!
//! Every function here is pure and deterministic, operates on Unicode scalar
//! values rather than bytes, and never fails: malformed input degrades to a
//! full mask instead of raising.

use crate::params::StrategyParams;
use crate::strategy::StrategyDefinition;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Built-in strategy ids.
pub mod ids {
    /// Window mask: keep `visible_prefix`/`visible_suffix`, mask the rest
    pub const FIXED: &str = "fixed";
    /// Keep the local part's first character and the domain
    pub const EMAIL: &str = "email";
    /// Keep the last four digits, preserve formatting
    pub const PHONE: &str = "phone";
    /// Keep the last four digits, preserve grouping separators
    pub const CARD: &str = "card";
    /// Keep first and last character
    pub const NAME: &str = "name";
    /// Replace a number with its bucket label, e.g. `27` -> `20-29`
    pub const NUMERIC_RANGE: &str = "numeric_range";
    /// Mask capture-group spans, or substitute a replacement template
    pub const REGEX: &str = "regex";
    /// Mask the third IPv4 octet / final IPv6 segment
    pub const IP: &str = "ip";
    /// Mask the trailing four characters
    pub const BANK_ACCOUNT: &str = "bank_account";
    /// Keep the birthdate digits of a resident registration number
    pub const RRN: &str = "rrn";
    /// Mask unit-level numbers in an address
    pub const ADDRESS: &str = "address";
    /// Mask the trailing four characters of a passport number
    pub const PASSPORT: &str = "passport";
    /// Mask the serial digits of a driver's license number
    pub const DRIVERS_LICENSE: &str = "drivers_license";
    /// Keep the first five digits of a business registration number
    pub const BUSINESS_REGISTRATION: &str = "business_registration";
}

/// All built-in strategy definitions, in registration order.
pub(crate) fn all() -> Vec<StrategyDefinition> {
    vec![
        StrategyDefinition::new(ids::FIXED, fixed),
        StrategyDefinition::new(ids::EMAIL, email),
        StrategyDefinition::new(ids::PHONE, phone),
        StrategyDefinition::new(ids::CARD, card),
        StrategyDefinition::new(ids::NAME, name),
        StrategyDefinition::new(ids::NUMERIC_RANGE, numeric_range)
            .with_validator(validate_numeric_range),
        StrategyDefinition::new(ids::REGEX, regex_mask).with_validator(validate_regex),
        StrategyDefinition::new(ids::IP, ip),
        StrategyDefinition::new(ids::BANK_ACCOUNT, bank_account),
        StrategyDefinition::new(ids::RRN, rrn),
        StrategyDefinition::new(ids::ADDRESS, address),
        StrategyDefinition::new(ids::PASSPORT, passport),
        StrategyDefinition::new(ids::DRIVERS_LICENSE, drivers_license),
        StrategyDefinition::new(ids::BUSINESS_REGISTRATION, business_registration),
    ]
}

/// Mask every character with `mask_char`, preserving visible length.
fn full_mask(value: &str, mask_char: char) -> String {
    mask_char.to_string().repeat(value.chars().count())
}

/// Keep the first `visible_prefix` and last `visible_suffix` characters and
/// mask everything between. A value no longer than the visible window is
/// masked entirely.
pub fn fixed(value: &str, params: &StrategyParams) -> String {
    let chars: Vec<char> = value.chars().collect();
    let visible = params.visible_prefix + params.visible_suffix;
    if chars.len() <= visible {
        return full_mask(value, params.mask_char);
    }

    let mut out = String::with_capacity(value.len());
    out.extend(&chars[..params.visible_prefix]);
    for _ in 0..chars.len() - visible {
        out.push(params.mask_char);
    }
    out.extend(&chars[chars.len() - params.visible_suffix..]);
    out
}

/// Keep the local part's first character and the full domain; mask the rest
/// of the local part one mask char per character.
///
/// `john.doe@x.com` -> `j*******@x.com`. A one-character local part is
/// masked entirely; a value without `@`, or with an empty local part, is
/// masked entirely.
pub fn email(value: &str, params: &StrategyParams) -> String {
    let Some(at) = value.find('@') else {
        return full_mask(value, params.mask_char);
    };
    let (local, rest) = value.split_at(at);
    if local.is_empty() {
        return full_mask(value, params.mask_char);
    }
    let count = local.chars().count();
    if count == 1 {
        return format!("{}{rest}", full_mask(local, params.mask_char));
    }

    let first = local.chars().next().unwrap_or(params.mask_char);
    let mut out = String::with_capacity(value.len());
    out.push(first);
    for _ in 0..count - 1 {
        out.push(params.mask_char);
    }
    out.push_str(rest);
    out
}

/// Mask all digits except the trailing `keep`, leaving non-digit formatting
/// characters in place. With `keep` or fewer digits, every digit is masked.
fn mask_digits_keep_last(value: &str, keep: usize, mask_char: char) -> String {
    let digit_total = value.chars().filter(char::is_ascii_digit).count();
    let cutoff = if digit_total <= keep {
        digit_total
    } else {
        digit_total - keep
    };

    let mut seen = 0;
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen <= cutoff {
                    mask_char
                } else {
                    c
                }
            } else {
                c
            }
        })
        .collect()
}

/// Keep the last four digits of a phone number.
///
/// `010-1234-5678` -> `***-****-5678`. Format-agnostic: any digit sequence
/// works, separators and `+` prefixes are preserved positionally.
pub fn phone(value: &str, params: &StrategyParams) -> String {
    mask_digits_keep_last(value, 4, params.mask_char)
}

/// Keep the last four digits of a card number, preserving grouping.
///
/// `4111-1111-1111-1234` -> `****-****-****-1234`.
pub fn card(value: &str, params: &StrategyParams) -> String {
    mask_digits_keep_last(value, 4, params.mask_char)
}

/// Keep the first and last character of a name and mask the middle.
///
/// Two characters keep only the first; a single character is masked.
pub fn name(value: &str, params: &StrategyParams) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => String::new(),
        1 => params.mask_char.to_string(),
        2 => format!("{}{}", chars[0], params.mask_char),
        n => {
            let mut out = String::with_capacity(value.len());
            out.push(chars[0]);
            for _ in 0..n - 2 {
                out.push(params.mask_char);
            }
            out.push(chars[n - 1]);
            out
        }
    }
}

/// Replace a numeric value with its bucket label for `bucket_width`.
///
/// `27` with width 10 -> `20-29`. Non-numeric input, non-finite values, and
/// magnitudes whose bucket bounds don't fit an `i64` degrade to a full mask.
pub fn numeric_range(value: &str, params: &StrategyParams) -> String {
    let width = params.bucket_width.clamp(1, i64::MAX as u64) as i64;
    let Ok(n) = value.trim().parse::<f64>() else {
        return full_mask(value, params.mask_char);
    };
    if !n.is_finite() {
        return full_mask(value, params.mask_char);
    }
    let n = n.floor();
    if n < i64::MIN as f64 || n >= i64::MAX as f64 {
        return full_mask(value, params.mask_char);
    }
    let bucket = (n as i64).div_euclid(width);
    match bucket.checked_mul(width) {
        Some(low) => match low.checked_add(width - 1) {
            Some(high) => format!("{low}-{high}"),
            None => full_mask(value, params.mask_char),
        },
        None => full_mask(value, params.mask_char),
    }
}

/// Apply the `pattern` parameter: with a `replacement` template, substitute
/// every match (`${n}` capture references supported); without one, mask only
/// the captured span(s), or the whole match when the pattern has no groups.
///
/// A missing or invalid pattern degrades to a full mask; well-formedness is
/// checked at resolution time by [`validate_regex`].
pub fn regex_mask(value: &str, params: &StrategyParams) -> String {
    let Some(pattern) = params.pattern.as_deref() else {
        return full_mask(value, params.mask_char);
    };
    let Some(regex) = compiled(pattern) else {
        return full_mask(value, params.mask_char);
    };

    if let Some(replacement) = params.replacement.as_deref() {
        return regex.replace_all(value, replacement).into_owned();
    }

    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for caps in regex.captures_iter(value) {
        let spans: Vec<(usize, usize)> = if caps.len() > 1 {
            (1..caps.len())
                .filter_map(|i| caps.get(i))
                .map(|m| (m.start(), m.end()))
                .collect()
        } else {
            caps.get(0)
                .map(|m| vec![(m.start(), m.end())])
                .unwrap_or_default()
        };

        for (start, end) in spans {
            if start < last {
                continue;
            }
            out.push_str(&value[last..start]);
            for _ in value[start..end].chars() {
                out.push(params.mask_char);
            }
            last = end;
        }
    }
    out.push_str(&value[last..]);
    out
}

/// Mask the third octet of an IPv4 address or the final segment of an IPv6
/// address; anything else is masked entirely.
///
/// `192.168.0.1` -> `192.168.***.1`
pub fn ip(value: &str, params: &StrategyParams) -> String {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    let ipv4 = IPV4.get_or_init(|| {
        Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("valid IPv4 pattern")
    });

    if let Some(caps) = ipv4.captures(value) {
        let mask = params.mask_char.to_string().repeat(3);
        return format!("{}.{}.{}.{}", &caps[1], &caps[2], mask, &caps[4]);
    }

    if let Some(last_colon) = value.rfind(':') {
        if last_colon + 1 < value.len() {
            let mask = params.mask_char.to_string().repeat(4);
            return format!("{}{}", &value[..last_colon + 1], mask);
        }
    }

    full_mask(value, params.mask_char)
}

/// Mask the trailing four characters of an account number; four characters
/// or fewer are masked entirely.
///
/// `123-456-7890` -> `123-456-****`
pub fn bank_account(value: &str, params: &StrategyParams) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return full_mask(value, params.mask_char);
    }

    let mut out = String::with_capacity(value.len());
    out.extend(&chars[..chars.len() - 4]);
    for _ in 0..4 {
        out.push(params.mask_char);
    }
    out
}

/// Mask all digits after the leading `keep`, leaving non-digit formatting
/// characters in place.
fn mask_digits_keep_first(value: &str, keep: usize, mask_char: char) -> String {
    let mut seen = 0;
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen <= keep {
                    c
                } else {
                    mask_char
                }
            } else {
                c
            }
        })
        .collect()
}

/// Keep the six-digit birthdate of a resident registration number and mask
/// the trailing seven digits, preserving the hyphen.
///
/// `850209-1234567` -> `850209-*******`. Anything without exactly 13 digits
/// is masked entirely.
pub fn rrn(value: &str, params: &StrategyParams) -> String {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if digits != 13 {
        return full_mask(value, params.mask_char);
    }
    mask_digits_keep_first(value, 6, params.mask_char)
}

/// Mask the numeric parts of an address that carry unit-level detail
/// (building, unit, lot, floor), keeping the rest readable.
///
/// `서울시 성북구 101동 1204호` -> `서울시 성북구 ***동 ****호`. An address
/// with no detail numbers passes through unchanged.
pub fn address(value: &str, params: &StrategyParams) -> String {
    static DETAIL: OnceLock<Regex> = OnceLock::new();
    let detail = DETAIL.get_or_init(|| {
        Regex::new(r"(\d+)(\s*(?:동|호|번지|층|가|읍|면))").expect("valid address pattern")
    });

    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for caps in detail.captures_iter(value) {
        if let Some(m) = caps.get(1) {
            out.push_str(&value[last..m.start()]);
            for _ in m.as_str().chars() {
                out.push(params.mask_char);
            }
            last = m.end();
        }
    }
    out.push_str(&value[last..]);
    out
}

/// Mask the last four characters of a passport number.
///
/// `M12345678` -> `M1234****`. Shorter than eight characters is masked
/// entirely.
pub fn passport(value: &str, params: &StrategyParams) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 8 {
        return full_mask(value, params.mask_char);
    }

    let mut out = String::with_capacity(value.len());
    out.extend(&chars[..chars.len() - 4]);
    for _ in 0..4 {
        out.push(params.mask_char);
    }
    out
}

/// Mask the six-digit serial of a driver's license number, keeping the
/// region, year, and check digits.
///
/// `서울-12-345678-10` -> `서울-12-******-10`. Unrecognized formats are
/// masked entirely.
pub fn drivers_license(value: &str, params: &StrategyParams) -> String {
    static LICENSE: OnceLock<Regex> = OnceLock::new();
    let license = LICENSE.get_or_init(|| {
        Regex::new(r"^([가-힣]{2}|\d{2})[-\s]?(\d{2})[-\s]?(\d{6})[-\s]?(\d{2})$")
            .expect("valid license pattern")
    });

    let Some(caps) = license.captures(value) else {
        return full_mask(value, params.mask_char);
    };
    let separator = if value.contains('-') {
        "-"
    } else if value.contains(' ') {
        " "
    } else {
        ""
    };
    let serial = params.mask_char.to_string().repeat(6);
    format!(
        "{}{sep}{}{sep}{serial}{sep}{}",
        &caps[1],
        &caps[2],
        &caps[4],
        sep = separator
    )
}

/// Keep the first five digits of a business registration number and mask the
/// trailing five, preserving hyphens.
///
/// `123-45-67890` -> `123-45-*****`. Anything without exactly 10 digits is
/// masked entirely.
pub fn business_registration(value: &str, params: &StrategyParams) -> String {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if digits != 10 {
        return full_mask(value, params.mask_char);
    }
    mask_digits_keep_first(value, 5, params.mask_char)
}

/// Validate `numeric_range` parameters.
fn validate_numeric_range(params: &StrategyParams) -> Result<(), String> {
    if params.bucket_width == 0 {
        return Err("bucket_width must be at least 1".to_string());
    }
    Ok(())
}

/// Validate `regex` parameters: the pattern must compile, and a replacement
/// template must not reference capture groups the pattern doesn't have.
fn validate_regex(params: &StrategyParams) -> Result<(), String> {
    let Some(pattern) = params.pattern.as_deref() else {
        return Err("regex strategy requires a 'pattern' parameter".to_string());
    };
    let regex =
        Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;

    if let Some(replacement) = params.replacement.as_deref() {
        static GROUP_REF: OnceLock<Regex> = OnceLock::new();
        let group_ref = GROUP_REF
            .get_or_init(|| Regex::new(r"\$\{?(\d+)\}?").expect("valid group-ref pattern"));

        let groups = regex.captures_len() - 1;
        for caps in group_ref.captures_iter(replacement) {
            let referenced: usize = caps[1].parse().unwrap_or(0);
            if referenced > groups {
                return Err(format!(
                    "replacement references group ${referenced} but pattern has {groups} group(s)"
                ));
            }
        }
    }
    Ok(())
}

/// Process-wide cache of compiled strategy patterns. Failed compilations are
/// cached too, so a bad pattern that slipped past resolution degrades every
/// call the same way without recompiling.
fn compiled(pattern: &str) -> Option<Regex> {
    static CACHE: OnceLock<RwLock<HashMap<String, Option<Regex>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    {
        let guard = cache.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = guard.get(pattern) {
            return entry.clone();
        }
    }

    let entry = Regex::new(pattern).ok();
    let mut guard = cache.write().unwrap_or_else(PoisonError::into_inner);
    guard
        .entry(pattern.to_string())
        .or_insert(entry)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn params() -> StrategyParams {
        StrategyParams::default()
    }

    #[test_case("secret", 0, 0 => "******"; "default masks everything")]
    #[test_case("secret", 1, 1 => "s****t"; "window keeps first and last")]
    #[test_case("secret", 2, 0 => "se****"; "prefix only")]
    #[test_case("ab", 2, 2 => "**"; "short value fully masked")]
    #[test_case("ab", 1, 1 => "**"; "window equal to length fully masked")]
    fn test_fixed(value: &str, prefix: usize, suffix: usize) -> String {
        fixed(value, &params().with_visible(prefix, suffix))
    }

    #[test_case("john.doe@x.com" => "j*******@x.com")]
    #[test_case("john.doe@example.com" => "j*******@example.com")]
    #[test_case("a@b.com" => "*@b.com"; "one char local fully masked")]
    #[test_case("not-an-email" => "************"; "no at sign fully masked")]
    #[test_case("@x.com" => "******"; "empty local fully masked")]
    fn test_email(value: &str) -> String {
        email(value, &params())
    }

    #[test_case("010-1234-5678" => "***-****-5678")]
    #[test_case("+1 (555) 123-4567" => "+* (***) ***-4567")]
    #[test_case("5678" => "****"; "exactly four digits fully masked")]
    #[test_case("123" => "***"; "short number fully masked")]
    fn test_phone(value: &str) -> String {
        phone(value, &params())
    }

    #[test_case("4111-1111-1111-1234" => "****-****-****-1234"; "dash separated")]
    #[test_case("4111 1111 1111 1234" => "**** **** **** 1234"; "space separated")]
    #[test_case("4111111111111234" => "************1234"; "unseparated")]
    fn test_card(value: &str) -> String {
        card(value, &params())
    }

    #[test_case("Alice" => "A***e")]
    #[test_case("홍길동" => "홍*동"; "multibyte name")]
    #[test_case("Bo" => "B*")]
    #[test_case("X" => "*")]
    fn test_name(value: &str) -> String {
        name(value, &params())
    }

    #[test]
    fn test_numeric_range_buckets() {
        assert_eq!(numeric_range("27", &params()), "20-29");
        assert_eq!(numeric_range("30", &params()), "30-39");
        assert_eq!(numeric_range("7", &params().with_bucket_width(5)), "5-9");
        assert_eq!(numeric_range("27.9", &params()), "20-29");
    }

    #[test]
    fn test_numeric_range_non_numeric_degrades() {
        assert_eq!(numeric_range("abc", &params()), "***");
    }

    #[test]
    fn test_numeric_range_extreme_magnitudes_degrade() {
        assert_eq!(numeric_range("1e300", &params()), "*****");
        assert_eq!(numeric_range("-1e300", &params()), "******");
        assert_eq!(numeric_range("inf", &params()), "***");
        assert_eq!(numeric_range("NaN", &params()), "***");
        assert_eq!(
            numeric_range("9223372036854775807", &params()),
            "*******************"
        );
    }

    #[test]
    fn test_regex_masks_capture_spans() {
        let p = params().with_pattern(r"(\d{3})-(\d{2})");
        assert_eq!(regex_mask("123-45", &p), "***-**");
    }

    #[test]
    fn test_regex_masks_whole_match_without_groups() {
        let p = params().with_pattern(r"\d+");
        assert_eq!(regex_mask("abc123def", &p), "abc***def");
    }

    #[test]
    fn test_regex_replacement_template() {
        let p = params()
            .with_pattern(r"(\d{3})-\d{3}-(\d{4})")
            .with_replacement("${1}-***-${2}");
        assert_eq!(regex_mask("555-123-4567", &p), "555-***-4567");
    }

    #[test]
    fn test_regex_without_pattern_degrades() {
        assert_eq!(regex_mask("abcd", &params()), "****");
    }

    #[test_case("192.168.0.1" => "192.168.***.1")]
    #[test_case("2001:db8::1" => "2001:db8::****")]
    #[test_case("not-ip" => "******"; "unparseable fully masked")]
    fn test_ip(value: &str) -> String {
        ip(value, &params())
    }

    #[test_case("123-456-7890" => "123-456-****")]
    #[test_case("1234" => "****"; "short account fully masked")]
    fn test_bank_account(value: &str) -> String {
        bank_account(value, &params())
    }

    #[test_case("850209-1234567" => "850209-*******"; "hyphenated")]
    #[test_case("8502091234567" => "850209*******"; "unseparated")]
    #[test_case("850209-123" => "**********"; "too few digits fully masked")]
    fn test_rrn(value: &str) -> String {
        rrn(value, &params())
    }

    #[test]
    fn test_address_masks_detail_numbers() {
        assert_eq!(
            address("서울시 성북구 101동 1204호", &params()),
            "서울시 성북구 ***동 ****호"
        );
        assert_eq!(address("12번지 3층", &params()), "**번지 *층");
        assert_eq!(address("대전광역시 중구", &params()), "대전광역시 중구");
    }

    #[test_case("M12345678" => "M1234****")]
    #[test_case("M123456" => "*******"; "short passport fully masked")]
    fn test_passport(value: &str) -> String {
        passport(value, &params())
    }

    #[test_case("서울-12-345678-10" => "서울-12-******-10"; "region prefix")]
    #[test_case("11-22-334455-66" => "11-22-******-66"; "numeric prefix")]
    #[test_case("112233445566" => "1122******66"; "unseparated")]
    #[test_case("totally wrong" => "*************"; "unrecognized fully masked")]
    fn test_drivers_license(value: &str) -> String {
        drivers_license(value, &params())
    }

    #[test_case("123-45-67890" => "123-45-*****"; "hyphenated")]
    #[test_case("1234567890" => "12345*****"; "unseparated")]
    #[test_case("123-45" => "******"; "too few digits fully masked")]
    fn test_business_registration(value: &str) -> String {
        business_registration(value, &params())
    }

    #[test]
    fn test_mask_char_parameter() {
        let p = params().with_mask_char('#');
        assert_eq!(fixed("abc", &p), "###");
        assert_eq!(phone("010-1234-5678", &p), "###-####-5678");
    }

    #[test]
    fn test_validate_regex() {
        assert!(validate_regex(&params()).is_err());
        assert!(validate_regex(&params().with_pattern("(")).is_err());
        assert!(validate_regex(&params().with_pattern(r"\d+")).is_ok());

        let over_referenced = params()
            .with_pattern(r"(\d+)")
            .with_replacement("${2}");
        assert!(validate_regex(&over_referenced).is_err());

        let valid_ref = params()
            .with_pattern(r"(\d+)")
            .with_replacement("${1}");
        assert!(validate_regex(&valid_ref).is_ok());
    }

    #[test]
    fn test_validate_numeric_range() {
        assert!(validate_numeric_range(&params()).is_ok());
        assert!(validate_numeric_range(&params().with_bucket_width(0)).is_err());
    }

    #[test]
    fn test_determinism() {
        let p = params();
        assert_eq!(email("john.doe@x.com", &p), email("john.doe@x.com", &p));
        assert_eq!(card("4111-1111-1111-1234", &p), card("4111-1111-1111-1234", &p));
    }
}
