//! SEO lint for generated articles.
//!
//! Regex-based checks over the markdown draft and its metadata. Each
//! violation subtracts a fixed weight from a score that starts at 100.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::models::{GeneratedArticle, SeoRequirements};

/// Meta title must land in this character range.
const META_TITLE_RANGE: (usize, usize) = (45, 60);
/// Meta description must land in this character range.
const META_DESCRIPTION_RANGE: (usize, usize) = (120, 160);
/// How much of the intro counts as "the first words" for keyword checks.
const INTRO_WORDS: usize = 150;

/// Individual lint checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoCheck {
    MetaTitleLength,
    MetaDescriptionLength,
    MissingH1,
    MultipleH1,
    ImageAltMissing,
    KeywordMissingFromTitle,
    KeywordMissingFromIntro,
    WordCountLow,
    WordCountHigh,
}

impl SeoCheck {
    /// Score deduction when the check fails.
    #[must_use]
    pub fn weight(self) -> u8 {
        match self {
            Self::MetaTitleLength | Self::MultipleH1 | Self::MissingH1 => 15,
            Self::MetaDescriptionLength
            | Self::ImageAltMissing
            | Self::KeywordMissingFromIntro => 10,
            Self::KeywordMissingFromTitle | Self::WordCountLow => 15,
            Self::WordCountHigh => 5,
        }
    }
}

/// A failed check with detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoViolation {
    pub check: SeoCheck,
    pub message: String,
}

/// Result of the SEO lint pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoAudit {
    /// Score in [0, 100].
    pub score: u8,
    pub violations: Vec<SeoViolation>,
}

impl SeoAudit {
    /// Whether the draft passed without violations.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

fn image_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap())
}

/// Count markdown H1 lines.
fn h1_count(markdown: &str) -> usize {
    markdown
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with("# ")
        })
        .count()
}

/// Run the lint over an article draft.
#[must_use]
pub fn audit(article: &GeneratedArticle, seo: &SeoRequirements) -> SeoAudit {
    let mut violations = Vec::new();

    let title_len = article.meta_title.chars().count();
    if title_len < META_TITLE_RANGE.0 || title_len > META_TITLE_RANGE.1 {
        violations.push(SeoViolation {
            check: SeoCheck::MetaTitleLength,
            message: format!(
                "meta title is {title_len} chars, expected {}-{}",
                META_TITLE_RANGE.0, META_TITLE_RANGE.1
            ),
        });
    }

    let description_len = article.meta_description.chars().count();
    if description_len < META_DESCRIPTION_RANGE.0 || description_len > META_DESCRIPTION_RANGE.1 {
        violations.push(SeoViolation {
            check: SeoCheck::MetaDescriptionLength,
            message: format!(
                "meta description is {description_len} chars, expected {}-{}",
                META_DESCRIPTION_RANGE.0, META_DESCRIPTION_RANGE.1
            ),
        });
    }

    match h1_count(&article.content_markdown) {
        0 => violations.push(SeoViolation {
            check: SeoCheck::MissingH1,
            message: "article has no H1 heading".to_string(),
        }),
        1 => {}
        n => violations.push(SeoViolation {
            check: SeoCheck::MultipleH1,
            message: format!("article has {n} H1 headings, expected exactly one"),
        }),
    }

    for capture in image_regex().captures_iter(&article.content_markdown) {
        if capture[1].trim().is_empty() {
            violations.push(SeoViolation {
                check: SeoCheck::ImageAltMissing,
                message: format!("image without alt text: {}", &capture[0]),
            });
        }
    }

    if !article.primary_keyword.is_empty() {
        let keyword = article.primary_keyword.to_lowercase();

        if !article.title.to_lowercase().contains(&keyword) {
            violations.push(SeoViolation {
                check: SeoCheck::KeywordMissingFromTitle,
                message: format!("primary keyword \"{}\" not in title", article.primary_keyword),
            });
        }

        let intro: String = article
            .content_markdown
            .split_whitespace()
            .take(INTRO_WORDS)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if !intro.contains(&keyword) {
            violations.push(SeoViolation {
                check: SeoCheck::KeywordMissingFromIntro,
                message: format!(
                    "primary keyword \"{}\" not in the first {INTRO_WORDS} words",
                    article.primary_keyword
                ),
            });
        }
    }

    if article.word_count < seo.min_words {
        violations.push(SeoViolation {
            check: SeoCheck::WordCountLow,
            message: format!(
                "word count {} below minimum {}",
                article.word_count, seo.min_words
            ),
        });
    } else if article.word_count > seo.max_words {
        violations.push(SeoViolation {
            check: SeoCheck::WordCountHigh,
            message: format!(
                "word count {} above maximum {}",
                article.word_count, seo.max_words
            ),
        });
    }

    let deductions: u32 = violations.iter().map(|v| u32::from(v.check.weight())).sum();
    let score = u8::try_from(100_u32.saturating_sub(deductions)).unwrap_or(0);

    SeoAudit { score, violations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::count_words;
    use chrono::Utc;

    fn article(content: &str, meta_title: &str, meta_description: &str) -> GeneratedArticle {
        GeneratedArticle {
            title: "Service Animals and the ADA: What Owners Must Know".to_string(),
            slug: "service-animals-ada".to_string(),
            content_markdown: content.to_string(),
            meta_title: meta_title.to_string(),
            meta_description: meta_description.to_string(),
            tags: Vec::new(),
            primary_keyword: "service animals".to_string(),
            word_count: count_words(content),
            seo: SeoAudit::default(),
            model: "test".to_string(),
            generated_at: Utc::now(),
        }
    }

    fn long_body() -> String {
        let intro = "# Heading\n\nservice animals intro paragraph. ";
        let filler = "More words about compliance. ".repeat(300);
        format!("{intro}{filler}")
    }

    fn good_meta_title() -> &'static str {
        // 52 chars, inside [45, 60]
        "Service Animals and the ADA: A Guide for Businesses"
    }

    fn good_meta_description() -> &'static str {
        // 132 chars, inside [120, 160]
        "Learn what the ADA requires for service animals, which questions \
         staff can ask, and how businesses stay compliant without guesswork."
    }

    #[test]
    fn test_clean_article_scores_100() {
        let report = audit(
            &article(&long_body(), good_meta_title(), good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report.is_clean(), "violations: {:?}", report.violations);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn test_meta_title_length_flagged() {
        let report = audit(
            &article(&long_body(), "Too short", good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report
            .violations
            .iter()
            .any(|v| v.check == SeoCheck::MetaTitleLength));

        let too_long = "This meta title keeps going well past the sixty character ceiling set by the lint";
        let report = audit(
            &article(&long_body(), too_long, good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report
            .violations
            .iter()
            .any(|v| v.check == SeoCheck::MetaTitleLength));
    }

    #[test]
    fn test_multiple_h1_flagged() {
        let body = format!("{}\n# Second H1\n", long_body());
        let report = audit(
            &article(&body, good_meta_title(), good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report
            .violations
            .iter()
            .any(|v| v.check == SeoCheck::MultipleH1));
    }

    #[test]
    fn test_missing_h1_flagged() {
        let body = format!(
            "service animals intro. {}",
            "More words about compliance. ".repeat(300)
        );
        let report = audit(
            &article(&body, good_meta_title(), good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report
            .violations
            .iter()
            .any(|v| v.check == SeoCheck::MissingH1));
    }

    #[test]
    fn test_empty_image_alt_flagged() {
        let body = format!("{}\n![](sign.png)\n![ramp photo](ramp.png)\n", long_body());
        let report = audit(
            &article(&body, good_meta_title(), good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        let alt_violations: Vec<_> = report
            .violations
            .iter()
            .filter(|v| v.check == SeoCheck::ImageAltMissing)
            .collect();
        assert_eq!(alt_violations.len(), 1);
    }

    #[test]
    fn test_word_count_bounds() {
        let short = "# T\n\nservice animals but far too short.";
        let report = audit(
            &article(short, good_meta_title(), good_meta_description()),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report
            .violations
            .iter()
            .any(|v| v.check == SeoCheck::WordCountLow));
    }

    #[test]
    fn test_score_never_underflows() {
        let report = audit(
            &article("![](a.png)\n![](b.png)\n![](c.png)", "x", "y"),
            &SeoRequirements::for_keyword("service animals"),
        );
        assert!(report.score <= 100);
    }
}
