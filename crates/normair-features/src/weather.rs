//! Weather-Event Features
//!
//! The weather feed reports phenomena as free text such as `"pioggia nebbia"`.
//! Each distinct whitespace-separated token becomes a 0/1 indicator column.
//!
//! The token vocabulary is a value of its own: it can be derived from the
//! corpus at hand or carried over from a previous run, so that a model trained
//! on one corpus receives the same event columns at inference time.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of weather-event tokens that receive an indicator column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventVocabulary {
    tokens: BTreeSet<String>,
}

impl EventVocabulary {
    /// Create a vocabulary from explicit tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }

    /// Derive the vocabulary from every string value of `column`.
    ///
    /// Missing values and non-string columns contribute nothing; an absent
    /// column yields an empty vocabulary.
    pub fn from_frame(df: &DataFrame, column: &str) -> Result<Self> {
        let texts = phenomena_texts(df, column)?;
        Ok(Self::from_tokens(
            texts
                .iter()
                .flatten()
                .flat_map(|text| text.split_whitespace()),
        ))
    }

    /// Tokens in sorted order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `token` belongs to the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Build one indicator column per token.
    ///
    /// A row is flagged when its phenomena text contains the token as a
    /// substring; rows without text are 0.
    pub fn indicator_columns(&self, df: &DataFrame, column: &str) -> Result<Vec<Column>> {
        let texts = phenomena_texts(df, column)?;
        Ok(self
            .tokens()
            .map(|token| {
                let flags: Vec<i32> = texts
                    .iter()
                    .map(|text| i32::from(text.as_deref().is_some_and(|t| t.contains(token))))
                    .collect();
                Column::new(token.into(), flags)
            })
            .collect())
    }
}

/// Phenomena text per row; `None` for missing or non-string values.
fn phenomena_texts(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let Ok(values) = df.column(column) else {
        return Ok(vec![None; df.height()]);
    };
    if values.dtype() != &DataType::String {
        return Ok(vec![None; df.height()]);
    }
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PHENOMENA;

    fn frame(texts: &[Option<&str>]) -> DataFrame {
        DataFrame::new(vec![Column::new(PHENOMENA.into(), texts)]).unwrap()
    }

    #[test]
    fn test_vocabulary_from_corpus() {
        let df = frame(&[Some("pioggia nebbia"), None, Some("neve"), Some("pioggia")]);
        let vocab = EventVocabulary::from_frame(&df, PHENOMENA).unwrap();
        let tokens: Vec<&str> = vocab.tokens().collect();
        assert_eq!(tokens, vec!["nebbia", "neve", "pioggia"]);
    }

    #[test]
    fn test_indicator_semantics() {
        let df = frame(&[Some("pioggia nebbia"), None, Some("neve"), Some("")]);
        let vocab = EventVocabulary::from_tokens(["pioggia", "neve"]);
        let columns = vocab.indicator_columns(&df, PHENOMENA).unwrap();
        let out = DataFrame::new(columns).unwrap();

        let rain: Vec<i32> = out.column("pioggia").unwrap().i32().unwrap().into_no_null_iter().collect();
        let snow: Vec<i32> = out.column("neve").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(rain, vec![1, 0, 0, 0]);
        assert_eq!(snow, vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_substring_match_is_case_sensitive() {
        let df = frame(&[Some("temporale forte"), Some("Pioggia")]);
        let vocab = EventVocabulary::from_tokens(["forte", "pioggia"]);
        let out = DataFrame::new(vocab.indicator_columns(&df, PHENOMENA).unwrap()).unwrap();
        let strong: Vec<i32> = out.column("forte").unwrap().i32().unwrap().into_no_null_iter().collect();
        let rain: Vec<i32> = out.column("pioggia").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(strong, vec![1, 0]);
        assert_eq!(rain, vec![0, 0]);
    }

    #[test]
    fn test_missing_or_non_string_column() {
        let df = DataFrame::new(vec![Column::new("other".into(), [1i32, 2])]).unwrap();
        assert!(EventVocabulary::from_frame(&df, PHENOMENA).unwrap().is_empty());

        let numeric = DataFrame::new(vec![Column::new(PHENOMENA.into(), [1.0f64, 2.0])]).unwrap();
        let vocab = EventVocabulary::from_frame(&numeric, PHENOMENA).unwrap();
        assert!(vocab.is_empty());
    }
}
