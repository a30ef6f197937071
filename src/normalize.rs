//! Rewriting loosely formatted input into the dialect the parser expects.

use crate::config::Conjunction;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static THOUSANDS_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d),(\d{3})(\D|$)").expect("valid regex literal")
});
static LETTER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z]+").expect("valid regex literal"));

/// Normalize a line of input, treating `and` as a system separator.
pub fn normalize(text: &str) -> String {
    normalize_with(text, Conjunction::default())
}

/// Normalize a line of input.
///
/// The rules are applied repeatedly until the text stops changing, so
/// normalizing an already normalized line is a no-op.
pub fn normalize_with(text: &str, conjunction: Conjunction) -> String {
    let mut current = single_pass(text, conjunction);

    loop {
        let next = single_pass(&current, conjunction);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn single_pass(text: &str, conjunction: Conjunction) -> String {
    let text = text.to_lowercase();
    let text = strip_thousands_separators(&text);

    let text = text
        .replace(" and ", conjunction.separator())
        .replace('^', "**")
        .replace("+/-", "±")
        .replace('%', "/100")
        .replace(" of ", "*")
        .replace("=<", "<=")
        .replace("=>", ">=");

    imaginary_unit(&text)
}

fn strip_thousands_separators(text: &str) -> String {
    let mut current = text.to_string();

    // matches can't overlap, so "1,000,000" takes more than one go
    loop {
        let next = THOUSANDS_SEPARATOR
            .replace_all(&current, "$1$2$3")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// A standalone `i` is the imaginary unit. Longer words like `sin` or `pi`
/// are left alone.
fn imaginary_unit(text: &str) -> String {
    LETTER_RUN
        .replace_all(text, |caps: &Captures<'_>| match &caps[0] {
            "i" => String::from("I"),
            other => other.to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    macro_rules! normalize_test {
        ($name:ident, $src:expr => $should_be:expr) => {
            #[test]
            fn $name() {
                let got = normalize($src);

                assert_eq!(got, $should_be);
            }
        };
        ($name:ident, $src:expr, $conjunction:expr => $should_be:expr) => {
            #[test]
            fn $name() {
                let got = normalize_with($src, $conjunction);

                assert_eq!(got, $should_be);
            }
        };
    }

    normalize_test!(lowercase, "2X + Y" => "2x + y");
    normalize_test!(thousands, "900 + 1,000 = x" => "900 + 1000 = x");
    normalize_test!(millions, "1,000,000" => "1000000");
    normalize_test!(value_lists_keep_their_commas, "x = 4, -4" => "x = 4, -4");
    normalize_test!(long_digit_runs_are_not_thousands, "1,2345" => "1,2345");
    normalize_test!(and_joins_a_system, "x = 4 and y = 4" => "x = 4;y = 4");
    normalize_test!(and_joins_a_list, "4 and -4", Conjunction::Comma => "4,-4");
    normalize_test!(powers, "x^2" => "x**2");
    normalize_test!(plus_or_minus, "x = +/- 4" => "x = ± 4");
    normalize_test!(percentages, "5% of 30" => "5/100*30");
    normalize_test!(backwards_comparisons, "x =< 3; y => 2" => "x <= 3; y >= 2");
    normalize_test!(imaginary_unit_alone, "2i + 3" => "2I + 3");
    normalize_test!(words_containing_i_are_untouched, "sin(pi) + xi" => "sin(pi) + xi");
    normalize_test!(uppercase_imaginary_unit, "3 + 4I" => "3 + 4I");
    normalize_test!(empty, "" => "");

    proptest! {
        #[test]
        fn normalizing_is_idempotent(s in "[a-zA-Z0-9 ,;=<>^%+/()*.-]{0,40}") {
            let once = normalize(&s);
            let twice = normalize(&once);

            prop_assert_eq!(twice, once);
        }

        #[test]
        fn idempotent_with_comma_conjunction(s in "[0-9 andofi,;=<>]{0,40}") {
            let once = normalize_with(&s, Conjunction::Comma);
            let twice = normalize_with(&once, Conjunction::Comma);

            prop_assert_eq!(twice, once);
        }
    }
}
