use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating buyer phone numbers
    /// Digits with optional leading "+" and single spaces, hyphens, dots or parentheses
    /// - Valid: "555-0100", "+62 812 3456 7890", "(021) 555.0100", "08123456789"
    /// - Invalid: "call me", "555--0100", "+", "12", "555-0100 ext"
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?\(?[0-9]{1,5}\)?(?:[ .\-]?\(?[0-9]{2,5}\)?)+$").unwrap();
}
