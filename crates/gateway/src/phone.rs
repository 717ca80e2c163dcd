//! Phone number normalization to the network's addressing scheme.

/// Default regional prefix applied to local numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "88";

/// Length of a local mobile number written without its country code.
const LOCAL_NUMBER_LEN: usize = 11;

/// Strips every non-digit and applies the regional prefix rule.
///
/// - A number starting with `0` gets `country_code` prepended (`017..` → `88017..`).
/// - An 11-digit number that does not already start with `country_code` gets it prepended.
/// - Anything else is returned as digits only.
///
/// The result is always all ASCII digits, possibly empty.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
	let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

	if digits.starts_with('0') || (digits.len() == LOCAL_NUMBER_LEN && !digits.starts_with(country_code)) {
		format!("{country_code}{digits}")
	} else {
		digits
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_formatting_characters() {
		assert_eq!(normalize_phone("+880 1712-345678", DEFAULT_COUNTRY_CODE), "8801712345678");
		assert_eq!(normalize_phone("(880) 171.234.5678", DEFAULT_COUNTRY_CODE), "8801712345678");
	}

	#[test]
	fn leading_zero_gets_country_code() {
		assert_eq!(normalize_phone("01712345678", DEFAULT_COUNTRY_CODE), "8801712345678");
		assert_eq!(normalize_phone("0171", DEFAULT_COUNTRY_CODE), "880171");
	}

	#[test]
	fn eleven_digits_without_prefix_get_country_code() {
		assert_eq!(normalize_phone("17123456789", DEFAULT_COUNTRY_CODE), "8817123456789");
	}

	#[test]
	fn eleven_digits_already_prefixed_are_kept() {
		assert_eq!(normalize_phone("88123456789", DEFAULT_COUNTRY_CODE), "88123456789");
	}

	#[test]
	fn other_lengths_pass_through() {
		assert_eq!(normalize_phone("+44 20 7946 0958", DEFAULT_COUNTRY_CODE), "442079460958");
		assert_eq!(normalize_phone("12345", DEFAULT_COUNTRY_CODE), "12345");
	}

	#[test]
	fn custom_country_code() {
		assert_eq!(normalize_phone("0612345678", "31"), "310612345678");
		assert_eq!(normalize_phone("61234567890", "31"), "3161234567890");
	}

	#[test]
	fn result_is_always_digits() {
		for raw in ["", "abc", "+1 (555) 010-9999", "☎ 017-1234-5678", "０１２"] {
			let normalized = normalize_phone(raw, DEFAULT_COUNTRY_CODE);
			assert!(normalized.chars().all(|c| c.is_ascii_digit()), "{raw:?} -> {normalized:?}");
		}
		assert_eq!(normalize_phone("abc", DEFAULT_COUNTRY_CODE), "");
	}
}
