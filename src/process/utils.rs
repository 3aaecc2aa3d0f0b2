/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Clean an optional CSV cell; blank cells become `None`.
pub fn clean_opt(raw: Option<&str>) -> Option<String> {
    raw.map(clean_str).filter(|s| !s.is_empty())
}

/// Mean of the non-null values; `None` when there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_space() {
        assert_eq!(clean_str("  \"Texas \" "), "Texas");
        assert_eq!(clean_str("Ohio"), "Ohio");
        assert_eq!(clean_str("\""), "\"");
    }

    #[test]
    fn clean_opt_blank_is_none() {
        assert_eq!(clean_opt(Some("   ")), None);
        assert_eq!(clean_opt(None), None);
        assert_eq!(clean_opt(Some(" CA ")), Some("CA".to_string()));
    }

    #[test]
    fn mean_skips_nulls() {
        assert_eq!(mean(vec![Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean(vec![None, None]), None);
        assert_eq!(mean(Vec::<Option<f64>>::new()), None);
    }
}
