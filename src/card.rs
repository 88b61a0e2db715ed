//! Card number validation and brand detection.
//!
//! Used by checkout form validation. Card numbers never reach the payment
//! provider through this server (the provider hosts its own collection
//! surface), so these checks are advisory only.

#[cfg(test)]
#[path = "card_test.rs"]
mod tests;

/// Card network detected from a number's leading digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Amex => "amex",
            Self::Discover => "discover",
            Self::Unknown => "unknown",
        }
    }
}

/// Strip spaces and dashes. Returns `None` if anything else non-numeric remains.
fn digits_of(input: &str) -> Option<Vec<u8>> {
    let mut digits = Vec::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            ' ' | '-' => {}
            '0'..='9' => digits.push(ch as u8 - b'0'),
            _ => return None,
        }
    }
    Some(digits)
}

/// Luhn check over the card number. Spaces and dashes are ignored;
/// any other non-digit character fails validation.
#[must_use]
pub fn validate_card_number(input: &str) -> bool {
    let Some(digits) = digits_of(input) else {
        return false;
    };
    if digits.len() < 12 || digits.len() > 19 {
        return false;
    }

    let mut sum = 0u32;
    for (i, &digit) in digits.iter().rev().enumerate() {
        let mut value = u32::from(digit);
        if i % 2 == 1 {
            value *= 2;
            if value > 9 {
                value -= 9;
            }
        }
        sum += value;
    }
    sum % 10 == 0
}

/// Detect the card network from the number's prefix.
///
/// Detection is prefix-only: it does not imply the number passes Luhn.
#[must_use]
pub fn detect_brand(input: &str) -> CardBrand {
    let Some(digits) = digits_of(input) else {
        return CardBrand::Unknown;
    };
    if digits.is_empty() {
        return CardBrand::Unknown;
    }

    let prefix2 = if digits.len() >= 2 { digits[0] * 10 + digits[1] } else { digits[0] };
    let prefix4 = if digits.len() >= 4 {
        u32::from(digits[0]) * 1000 + u32::from(digits[1]) * 100 + u32::from(digits[2]) * 10 + u32::from(digits[3])
    } else {
        0
    };

    if digits[0] == 4 {
        CardBrand::Visa
    } else if (51..=55).contains(&prefix2) {
        CardBrand::Mastercard
    } else if prefix2 == 34 || prefix2 == 37 {
        CardBrand::Amex
    } else if prefix4 == 6011 || prefix2 == 65 {
        CardBrand::Discover
    } else {
        CardBrand::Unknown
    }
}
