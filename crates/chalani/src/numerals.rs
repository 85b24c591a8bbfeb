//! Devanagari digit transcoding. Dispatch letters circulate with Nepali
//! numerals; the database keeps ASCII digits so uniqueness checks and
//! ordering behave, and responses render Devanagari again.

/// Replace Devanagari digits with their ASCII equivalents. Everything else
/// passes through unchanged.
pub fn to_ascii_digits(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '०' => '0',
            '१' => '1',
            '२' => '2',
            '३' => '3',
            '४' => '4',
            '५' => '5',
            '६' => '6',
            '७' => '7',
            '८' => '8',
            '९' => '9',
            other => other,
        })
        .collect()
}

/// Replace ASCII digits with Devanagari digits. Everything else passes
/// through unchanged.
pub fn to_devanagari_digits(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '0' => '०',
            '1' => '१',
            '2' => '२',
            '3' => '३',
            '4' => '४',
            '5' => '५',
            '6' => '६',
            '7' => '७',
            '8' => '८',
            '9' => '९',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_digits_become_ascii() {
        assert_eq!(to_ascii_digits("२०८१/८२"), "2081/82");
        assert_eq!(to_ascii_digits("च.नं. ४५"), "च.नं. 45");
    }

    #[test]
    fn ascii_digits_become_devanagari() {
        assert_eq!(to_devanagari_digits("2081/82"), "२०८१/८२");
        assert_eq!(to_devanagari_digits("no digits"), "no digits");
    }

    #[test]
    fn transcoding_round_trips_digit_strings() {
        let original = "9841234567";
        assert_eq!(to_ascii_digits(&to_devanagari_digits(original)), original);
    }
}
