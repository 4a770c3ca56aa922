//! Header renaming to snake_case.

/// Convert an arbitrary column header to snake_case.
///
/// Punctuation becomes a separator, camelCase boundaries (lowercase or digit
/// followed by an ASCII capital) split words, and everything is lowercased.
pub fn to_snake_case(header: &str) -> String {
    let cleaned: String = header
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut spaced = String::with_capacity(collapsed.len() + 8);
    let mut prev: Option<char> = None;
    for c in collapsed.chars() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            spaced.push(' ');
        }
        spaced.push(c);
        prev = Some(c);
    }

    spaced
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(|part| collapse_underscores(&part.to_lowercase()))
        .collect::<Vec<_>>()
        .join("_")
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_underscore = false;
    for c in s.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_and_case() {
        assert_eq!(to_snake_case("Facility ID"), "facility_id");
        assert_eq!(to_snake_case("  Measure   Start Date "), "measure_start_date");
        assert_eq!(to_snake_case("ZIP Code"), "zip_code");
    }

    #[test]
    fn camel_and_pascal() {
        assert_eq!(to_snake_case("hospitalOverallRating"), "hospital_overall_rating");
        assert_eq!(to_snake_case("HospitalType"), "hospital_type");
        assert_eq!(to_snake_case("Score2Value"), "score2_value");
    }

    #[test]
    fn punctuation_is_a_separator() {
        assert_eq!(to_snake_case("Footnote (Mortality)"), "footnote_mortality");
        assert_eq!(to_snake_case("Rate%/Denominator"), "rate_denominator");
        assert_eq!(to_snake_case("already_snake__case"), "already_snake_case");
    }

    #[test]
    fn byte_order_mark_and_empty() {
        assert_eq!(to_snake_case("\u{feff}Provider Name"), "provider_name");
        assert_eq!(to_snake_case(""), "");
        assert_eq!(to_snake_case("---"), "");
    }
}
