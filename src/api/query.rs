//! Query-string filters for `GET /recommendations`
//!
//! Only one filter applies per request: parameters are checked in
//! [`FILTER_PRIORITY`] order and the first one with a non-empty value wins.
//! Combining filters is not supported.

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationFilter, RecommendationType},
};

type FilterParser = fn(&str) -> AppResult<RecommendationFilter>;

pub const FILTER_PRIORITY: [(&str, FilterParser); 5] = [
    ("name", parse_name),
    ("recommendation_in_stock", parse_in_stock),
    ("recommendation_type", parse_type),
    ("recommendation_name", parse_recommendation_name),
    ("recommendation_id", parse_recommendation_id),
];

/// Picks the filter for a request, or `None` to list everything
pub fn select_filter(params: &HashMap<String, String>) -> AppResult<Option<RecommendationFilter>> {
    for (param, parse) in FILTER_PRIORITY {
        match params.get(param) {
            Some(value) if !value.is_empty() => return parse(value).map(Some),
            _ => continue,
        }
    }
    Ok(None)
}

/// "true", "yes" and "1" (any case) are true; everything else is false
pub fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1")
}

fn parse_name(value: &str) -> AppResult<RecommendationFilter> {
    Ok(RecommendationFilter::Name(value.to_string()))
}

fn parse_in_stock(value: &str) -> AppResult<RecommendationFilter> {
    Ok(RecommendationFilter::InStock(parse_bool(value)))
}

fn parse_type(value: &str) -> AppResult<RecommendationFilter> {
    value
        .parse::<RecommendationType>()
        .map(RecommendationFilter::Type)
        .map_err(|e| AppError::BadRequest(format!("Invalid query parameter recommendation_type: {}", e)))
}

fn parse_recommendation_name(value: &str) -> AppResult<RecommendationFilter> {
    Ok(RecommendationFilter::RecommendationName(value.to_string()))
}

fn parse_recommendation_id(value: &str) -> AppResult<RecommendationFilter> {
    value
        .parse::<i32>()
        .map(RecommendationFilter::RecommendationId)
        .map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid query parameter recommendation_id: '{}' is not an integer",
                value
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("Yes", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("no", false)]
    #[case("", false)]
    #[case("truthy", false)]
    fn test_parse_bool(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_bool(raw), expected);
    }

    #[test]
    fn test_no_params_selects_nothing() {
        assert_eq!(select_filter(&HashMap::new()).unwrap(), None);
    }

    #[test]
    fn test_unrelated_params_are_ignored() {
        assert_eq!(select_filter(&params(&[("category", "dog")])).unwrap(), None);
    }

    #[test]
    fn test_name_wins_over_everything() {
        let filter = select_filter(&params(&[
            ("recommendation_id", "5"),
            ("recommendation_type", "UP_SELL"),
            ("recommendation_in_stock", "true"),
            ("name", "Laptop"),
        ]))
        .unwrap();
        assert_eq!(filter, Some(RecommendationFilter::Name("Laptop".to_string())));
    }

    #[test]
    fn test_in_stock_wins_over_type() {
        let filter = select_filter(&params(&[
            ("recommendation_type", "UP_SELL"),
            ("recommendation_in_stock", "yes"),
        ]))
        .unwrap();
        assert_eq!(filter, Some(RecommendationFilter::InStock(true)));
    }

    #[test]
    fn test_type_wins_over_recommendation_name_and_id() {
        let filter = select_filter(&params(&[
            ("recommendation_id", "5"),
            ("recommendation_name", "Bag"),
            ("recommendation_type", "ACCESSORY"),
        ]))
        .unwrap();
        assert_eq!(filter, Some(RecommendationFilter::Type(RecommendationType::Accessory)));
    }

    #[test]
    fn test_recommendation_name_wins_over_id() {
        let filter = select_filter(&params(&[("recommendation_id", "5"), ("recommendation_name", "Bag")])).unwrap();
        assert_eq!(filter, Some(RecommendationFilter::RecommendationName("Bag".to_string())));
    }

    #[test]
    fn test_empty_value_falls_through() {
        let filter = select_filter(&params(&[("name", ""), ("recommendation_id", "9")])).unwrap();
        assert_eq!(filter, Some(RecommendationFilter::RecommendationId(9)));
    }

    #[test]
    fn test_invalid_winning_value_is_rejected() {
        let err = select_filter(&params(&[("recommendation_type", "SIDEWAYS")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = select_filter(&params(&[("recommendation_id", "abc")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
