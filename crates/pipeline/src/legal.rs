//! Legal fact checking for ADA content.
//!
//! A lookup table of canonical ADA facts, each with affirmation and
//! contradiction patterns. Claim-like sentences are matched against the
//! table; the accuracy score is a weighted count, nothing more.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Topics the fact table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactTopic {
    /// Staff may ask only the two screening questions.
    ServiceAnimalQuestions,
    /// No registration/certification requirement for service animals.
    ServiceAnimalRegistration,
    /// Only dogs (and sometimes miniature horses) qualify.
    ServiceAnimalSpecies,
    /// Title III covers places of public accommodation.
    Coverage,
    /// The ADA became law in 1990.
    Enactment,
    /// The disabled access tax credit exists for small businesses.
    TaxCredit,
    /// Web accessibility falls under Title III per case law.
    WebAccessibility,
}

/// Cue words that mark a sentence as a checkable claim.
const CLAIM_CUES: &[&str] = &[
    "must",
    "required",
    "require",
    "cannot",
    "may not",
    "allowed",
    "permitted",
    "prohibited",
    "exempt",
    "legally",
    "the ada",
    "under the ada",
    "the law",
];

struct FactEntry {
    topic: FactTopic,
    /// Canonical statement, used as the correction text.
    fact: &'static str,
    affirmations: &'static [&'static str],
    contradictions: &'static [&'static str],
}

static FACTS: &[FactEntry] = &[
    FactEntry {
        topic: FactTopic::ServiceAnimalQuestions,
        fact: "Staff may ask only two questions: whether the dog is a service animal required \
               because of a disability, and what work or task it has been trained to perform.",
        affirmations: &[r"(?i)\btwo questions\b"],
        contradictions: &[
            r"(?i)\b(any|unlimited) questions\b",
            r"(?i)ask\b[^.]*\b(for|about|to see)\b[^.]*\b(documentation|proof|papers|certification|id)\b",
        ],
    },
    FactEntry {
        topic: FactTopic::ServiceAnimalRegistration,
        fact: "The ADA does not require service animals to be registered, certified, or licensed, \
               and no official registry exists.",
        affirmations: &[
            r"(?i)\b(not|no|never)\b[^.]*\b(required|need|needed)\b[^.]*\bregist",
            r"(?i)does not require\b[^.]*\b(registration|certification)",
            r"(?i)no official registry",
        ],
        contradictions: &[
            r"(?i)\bmust be registered\b",
            r"(?i)\b(required|needs?|needed|have)\s+to\s+(be\s+)?register",
            r"(?i)\b(registration|certification) is (required|mandatory)\b",
        ],
    },
    FactEntry {
        topic: FactTopic::ServiceAnimalSpecies,
        fact: "Under the ADA, only dogs (and in limited cases miniature horses) qualify as \
               service animals.",
        affirmations: &[r"(?i)\bonly dogs\b", r"(?i)\bminiature horses?\b"],
        contradictions: &[
            r"(?i)\b(cats?|birds?|reptiles?)\b[^.]*\b(qualify|count) as service animals",
            r"(?i)\bany animal\b[^.]*\b(qualify|qualifies|can be|counts? as)\b",
        ],
    },
    FactEntry {
        topic: FactTopic::Coverage,
        fact: "Title III of the ADA applies to places of public accommodation, which includes \
               most private businesses open to the public.",
        affirmations: &[
            r"(?i)\bpublic accommodation",
            r"(?i)applies to\b[^.]*\bbusinesses\b",
        ],
        contradictions: &[
            r"(?i)\bonly applies to government\b",
            r"(?i)\bprivate businesses are exempt\b",
            r"(?i)does not apply to\b[^.]*\bbusinesses\b",
        ],
    },
    FactEntry {
        topic: FactTopic::Enactment,
        fact: "The Americans with Disabilities Act was signed into law in 1990.",
        affirmations: &[r"(?i)(signed into law|enacted|passed|became law)[^.]*\b1990\b"],
        contradictions: &[],
    },
    FactEntry {
        topic: FactTopic::TaxCredit,
        fact: "Eligible small businesses can claim the federal disabled access credit (IRS Form \
               8826) for accessibility expenditures.",
        affirmations: &[r"(?i)\btax credit\b", r"(?i)\bform 8826\b"],
        contradictions: &[r"(?i)\bno tax (credit|relief|incentive)s?\b"],
    },
    FactEntry {
        topic: FactTopic::WebAccessibility,
        fact: "Courts have applied ADA Title III to websites; WCAG 2.1 AA is the commonly \
               referenced standard.",
        affirmations: &[r"(?i)\bwcag\b"],
        contradictions: &[r"(?i)\bwebsites?\b[^.]*\b(not covered|exempt)\b"],
    },
];

struct CompiledFact {
    topic: FactTopic,
    fact: &'static str,
    affirmations: Vec<Regex>,
    contradictions: Vec<Regex>,
}

fn compiled_facts() -> &'static Vec<CompiledFact> {
    static COMPILED: OnceLock<Vec<CompiledFact>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        FACTS
            .iter()
            .map(|entry| CompiledFact {
                topic: entry.topic,
                fact: entry.fact,
                affirmations: entry
                    .affirmations
                    .iter()
                    .map(|p| Regex::new(p).unwrap())
                    .collect(),
                contradictions: entry
                    .contradictions
                    .iter()
                    .map(|p| Regex::new(p).unwrap())
                    .collect(),
            })
            .collect()
    })
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap())
}

fn enactment_cue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(signed into law|enacted|passed|became law)").unwrap()
    })
}

/// Verdict for a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Matches a canonical fact.
    Verified,
    /// Contradicts a canonical fact.
    Incorrect,
    /// Claim-like but not covered by the table.
    Unverified,
}

/// One checked claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimFinding {
    /// The sentence as found in the article.
    pub claim: String,
    pub verdict: Verdict,
    /// Topic that matched, when one did.
    pub topic: Option<FactTopic>,
    /// Canonical fact offered as the correction for incorrect claims.
    pub correction: Option<String>,
}

/// Full report over an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckReport {
    pub findings: Vec<ClaimFinding>,
    /// Weighted accuracy in [0, 1]: verified 1.0, unverified 0.5,
    /// incorrect 0.0.
    pub accuracy: f32,
    /// No incorrect claims and accuracy at or above the threshold.
    pub passed: bool,
    pub checked_at: DateTime<Utc>,
}

impl FactCheckReport {
    /// Claims flagged incorrect.
    #[must_use]
    pub fn incorrect_claims(&self) -> Vec<&ClaimFinding> {
        self.findings
            .iter()
            .filter(|f| f.verdict == Verdict::Incorrect)
            .collect()
    }
}

/// Checks article prose against the ADA fact table.
pub struct FactChecker {
    min_accuracy: f32,
}

impl FactChecker {
    /// Create a checker with the default accuracy threshold.
    #[must_use]
    pub fn new() -> Self {
        Self { min_accuracy: 0.8 }
    }

    /// Override the accuracy threshold.
    #[must_use]
    pub fn with_min_accuracy(mut self, min_accuracy: f32) -> Self {
        self.min_accuracy = min_accuracy;
        self
    }

    /// Check an article's markdown.
    #[must_use]
    pub fn check(&self, markdown: &str) -> FactCheckReport {
        let mut findings = Vec::new();

        for sentence in split_sentences(markdown) {
            if !is_claim(&sentence) {
                continue;
            }
            findings.push(check_claim(&sentence));
        }

        let accuracy = if findings.is_empty() {
            1.0
        } else {
            let weighted: f32 = findings
                .iter()
                .map(|f| match f.verdict {
                    Verdict::Verified => 1.0,
                    Verdict::Unverified => 0.5,
                    Verdict::Incorrect => 0.0,
                })
                .sum();
            #[allow(clippy::cast_precision_loss)]
            let total = findings.len() as f32;
            weighted / total
        };

        let has_incorrect = findings.iter().any(|f| f.verdict == Verdict::Incorrect);
        let passed = !has_incorrect && accuracy >= self.min_accuracy;

        tracing::info!(
            claims = findings.len(),
            accuracy,
            passed,
            "Fact check complete"
        );

        FactCheckReport {
            findings,
            accuracy,
            passed,
            checked_at: Utc::now(),
        }
    }
}

impl Default for FactChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Match one claim sentence against the fact table.
fn check_claim(sentence: &str) -> ClaimFinding {
    for fact in compiled_facts() {
        if fact.contradictions.iter().any(|re| re.is_match(sentence)) {
            return ClaimFinding {
                claim: sentence.to_string(),
                verdict: Verdict::Incorrect,
                topic: Some(fact.topic),
                correction: Some(fact.fact.to_string()),
            };
        }
    }

    // Enactment year is checked in code: a non-1990 year next to an
    // enactment cue contradicts the fact.
    if enactment_cue_regex().is_match(sentence) {
        if let Some(year) = year_regex().find(sentence) {
            if year.as_str() != "1990" {
                let correction = compiled_facts()
                    .iter()
                    .find(|f| f.topic == FactTopic::Enactment)
                    .map(|f| f.fact.to_string());
                return ClaimFinding {
                    claim: sentence.to_string(),
                    verdict: Verdict::Incorrect,
                    topic: Some(FactTopic::Enactment),
                    correction,
                };
            }
        }
    }

    for fact in compiled_facts() {
        if fact.affirmations.iter().any(|re| re.is_match(sentence)) {
            return ClaimFinding {
                claim: sentence.to_string(),
                verdict: Verdict::Verified,
                topic: Some(fact.topic),
                correction: None,
            };
        }
    }

    ClaimFinding {
        claim: sentence.to_string(),
        verdict: Verdict::Unverified,
        topic: None,
        correction: None,
    }
}

/// Whether a sentence contains a claim cue.
fn is_claim(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    CLAIM_CUES.iter().any(|cue| lower.contains(cue))
}

/// Split markdown into prose sentences, skipping headings, images, and
/// list markers.
fn split_sentences(markdown: &str) -> Vec<String> {
    static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SENTENCE_RE.get_or_init(|| Regex::new(r"[^.!?\n]+[.!?]?").unwrap());

    let mut sentences = Vec::new();
    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("![") {
            continue;
        }
        let prose = trimmed
            .trim_start_matches(['-', '*', '>'])
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
            .trim();

        for found in re.find_iter(prose) {
            let sentence = found.as_str().trim();
            if sentence.chars().filter(char::is_ascii_alphabetic).count() >= 3 {
                sentences.push(sentence.to_string());
            }
        }
    }
    sentences
}
