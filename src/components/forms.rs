//! Text-field helpers shared by the editors: list fields are entered one item
//! per line, comprehension items as `question | option; option | answer`.

use crate::backend::error::{AppError, AppResult};
use crate::backend::models::ComprehensionItem;

pub fn lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn optional_u32(text: &str) -> AppResult<Option<u32>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("'{}' is not a whole number", text)))
}

pub fn optional_f64(text: &str) -> AppResult<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(AppError::Validation(format!("'{}' is not a valid amount", text))),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn parse_comprehension(text: &str) -> AppResult<Vec<ComprehensionItem>> {
    lines(text)
        .into_iter()
        .enumerate()
        .map(|(n, line)| {
            let parts: Vec<&str> = line.split('|').map(str::trim).collect();
            let &[question, options, answer] = parts.as_slice() else {
                return Err(AppError::Validation(format!(
                    "line {}: expected 'question | options | answer'",
                    n + 1
                )));
            };
            let options: Vec<String> = options
                .split(';')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !options.iter().any(|o| o == answer) {
                return Err(AppError::Validation(format!(
                    "line {}: answer '{}' is not one of the options",
                    n + 1,
                    answer
                )));
            }
            Ok(ComprehensionItem {
                question: question.to_string(),
                options,
                answer: answer.to_string(),
            })
        })
        .collect()
}

pub fn format_comprehension(items: &[ComprehensionItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} | {} | {}", item.question, item.options.join("; "), item.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_skip_blank() {
        assert_eq!(lines("  a \n\n b\n"), vec!["a", "b"]);
        assert!(lines("   \n").is_empty());
        assert_eq!(comma_list("x, y,,z "), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(optional_u32(" 75 ").unwrap(), Some(75));
        assert_eq!(optional_u32("").unwrap(), None);
        assert!(optional_u32("ten").is_err());
        assert_eq!(optional_f64("1500.5").unwrap(), Some(1500.5));
        assert!(optional_f64("-1").is_err());
    }

    #[test]
    fn test_comprehension_parse_and_format() {
        let text = "Main idea? | Trade; Travel | Trade\nTone? | Neutral; Angry | Neutral";
        let items = parse_comprehension(text).expect("Failed to parse");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].options, vec!["Trade", "Travel"]);
        assert_eq!(items[1].answer, "Neutral");
        assert_eq!(format_comprehension(&items), "Main idea? | Trade; Travel | Trade\nTone? | Neutral; Angry | Neutral");
    }

    #[test]
    fn test_comprehension_rejects_bad_lines() {
        assert!(parse_comprehension("just a question").is_err());
        assert!(parse_comprehension("Q | a; b | c").is_err());
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }
}
