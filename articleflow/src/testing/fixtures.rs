//! Article fixtures.

use crate::core::ArticleInput;

/// Body text used by [`article_input`].
pub const SAMPLE_CONTENT: &str = "The City Council approved the 2025 transit budget on Monday. \
The plan funds two new tram lines and extends night bus service. \
Opposition members argued the fare increase would hit commuters hardest.";

/// A valid article with id `a1`.
#[must_use]
pub fn article_input() -> ArticleInput {
    article_with_id("a1")
}

/// A valid article with the given id.
#[must_use]
pub fn article_with_id(id: &str) -> ArticleInput {
    ArticleInput::new(id, SAMPLE_CONTENT, format!("http://x/wire/{id}"), "wire")
}

/// `count` valid articles with ids `a1..=a{count}`.
#[must_use]
pub fn article_inputs(count: usize) -> Vec<ArticleInput> {
    (1..=count).map(|n| article_with_id(&format!("a{n}"))).collect()
}

/// An article whose content is blank.
#[must_use]
pub fn article_without_content(id: &str) -> ArticleInput {
    ArticleInput {
        content: "   ".to_string(),
        ..article_with_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_validate() {
        assert!(article_input().validate().is_ok());
        assert!(article_inputs(3).iter().all(|a| a.validate().is_ok()));
        assert!(article_without_content("a9").validate().is_err());
    }

    #[test]
    fn test_article_ids() {
        let ids: Vec<String> = article_inputs(3).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
    }
}
