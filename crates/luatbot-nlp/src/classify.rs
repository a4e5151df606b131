//! Rule-based query admission.
//!
//! The classifier is a cost-control gate, not a semantic model: it runs
//! before any embedding or generation call and admits a query as soon as a
//! single domain rule matches (recall over precision — a false reject
//! denies service, a false accept costs one wasted retrieval+generation
//! call). It is purely functional over the rule table loaded at startup.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::types::{Classification, RejectReason};
use unicode_normalization::UnicodeNormalization;

/// Rule identifier recorded when a query is declined for not being
/// Vietnamese at all.
pub const RULE_NON_VIETNAMESE: &str = "khong-phai-tieng-viet";

/// One domain-term rule. The identifier is the keyword itself; the weight
/// (occurrence count in the indexed corpus) is kept for observability and
/// table maintenance, not for scoring — matching is a pure boolean OR.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub weight: u32,
    /// Space-spelled form of a compound rule ("xe_máy" → "xe máy"),
    /// matched against raw text that has not been segmented yet.
    spaced: String,
}

impl Rule {
    fn new(keyword: &str, weight: u32) -> Self {
        let id: String = keyword.trim().nfc().collect::<String>().to_lowercase();
        let spaced = id.replace('_', " ");
        Self { id, weight, spaced }
    }
}

/// Immutable domain rule table, loaded once at startup. Reloading means
/// building a new table and atomically swapping the `Arc` — never in-place
/// mutation visible mid-request.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Load from a rules file with `keyword: count` lines (bare `keyword`
    /// lines default to weight 1). Missing file or unparseable count is a
    /// fatal configuration error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LuatbotError::Config(format!("cannot read rule table {}: {e}", path.display()))
        })?;

        let mut rules = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.rsplit_once(':') {
                Some((keyword, count)) => {
                    let weight = count.trim().parse::<u32>().map_err(|_| {
                        LuatbotError::Config(format!(
                            "invalid rule line {} in {}: {line:?}",
                            lineno + 1,
                            path.display()
                        ))
                    })?;
                    rules.push(Rule::new(keyword, weight));
                }
                None => rules.push(Rule::new(line, 1)),
            }
        }
        if rules.is_empty() {
            return Err(LuatbotError::Config(format!(
                "rule table {} is empty",
                path.display()
            )));
        }
        tracing::info!(rules = rules.len(), "loaded domain rule table");
        Ok(Self { rules })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        Self {
            rules: entries
                .into_iter()
                .map(|(k, w)| Rule::new(k.as_ref(), w))
                .collect(),
        }
    }

    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_entries(keywords.into_iter().map(|k| (k, 1)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The admission classifier.
pub struct RuleClassifier {
    rules: Arc<RuleTable>,
}

impl RuleClassifier {
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    /// Classify a raw question, optionally aided by an already-extracted
    /// keyword set (token-set membership is checked first when supplied;
    /// pass an empty set when classifying before normalization).
    ///
    /// Matching semantics: case-insensitive after NFC normalization; a
    /// rule matches if it is a member of `keywords`, or if its underscore
    /// or space spelling occurs as a substring of the raw text. A single
    /// hit accepts. Queries with no hit and no Vietnamese script are
    /// declined as non-Vietnamese.
    pub fn classify(&self, raw: &str, keywords: &BTreeSet<String>) -> Classification {
        let text: String = raw.nfc().collect::<String>().to_lowercase();

        let matched: Vec<String> = self
            .rules
            .rules
            .iter()
            .filter(|rule| {
                keywords.contains(&rule.id)
                    || text.contains(&rule.spaced)
                    || text.contains(&rule.id)
            })
            .map(|rule| rule.id.clone())
            .collect();

        if !matched.is_empty() {
            tracing::debug!(rules = ?matched, "query accepted");
            return Classification::accepted(matched);
        }

        if !contains_vietnamese_script(&text) {
            tracing::debug!(rule = RULE_NON_VIETNAMESE, "query declined: not Vietnamese");
            return Classification::rejected(RejectReason::NonVietnamese);
        }

        tracing::debug!("query declined: no domain rule matched");
        Classification::rejected(RejectReason::OutOfDomain)
    }
}

/// Letters that only occur in Vietnamese orthography (base letters with
/// diacritics, precomposed by NFC). Conservative: plain-ASCII Vietnamese
/// is still admitted through rule hits before this check runs.
const VIETNAMESE_LETTERS: &str = "ăâđêôơư\
àáảãạằắẳẵặầấẩẫậ\
èéẻẽẹềếểễệ\
ìíỉĩị\
òóỏõọồốổỗộờớởỡợ\
ùúủũụừứửữự\
ỳýỷỹỵ";

pub fn contains_vietnamese_script(text: &str) -> bool {
    text.chars().any(|c| VIETNAMESE_LETTERS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use luatbot_core::types::Decision;

    fn classifier() -> RuleClassifier {
        RuleClassifier::new(Arc::new(RuleTable::from_entries([
            ("xe_máy", 120),
            ("ô_tô", 80),
            ("phạt", 200),
            ("tốc_độ", 90),
            ("giấy_phép_lái_xe", 40),
        ])))
    }

    #[test]
    fn domain_question_is_accepted() {
        let c = classifier().classify(
            "Xe máy chạy quá tốc độ bị phạt bao nhiêu tiền?",
            &BTreeSet::new(),
        );
        assert_eq!(c.decision, Decision::Accepted);
        assert!(c.matched_rules.contains(&"xe_máy".to_string()));
        assert!(c.matched_rules.contains(&"phạt".to_string()));
    }

    #[test]
    fn out_of_domain_vietnamese_is_rejected() {
        let c = classifier().classify("Công thức tính diện tích hình tròn là gì?", &BTreeSet::new());
        assert_eq!(c.decision, Decision::RejectedOutOfDomain);
        assert_eq!(c.reject_reason, Some(RejectReason::OutOfDomain));
        assert!(c.matched_rules.is_empty());
    }

    #[test]
    fn non_vietnamese_is_rejected_with_script_reason() {
        let c = classifier().classify("What is the speed limit in France?", &BTreeSet::new());
        assert_eq!(c.decision, Decision::RejectedOutOfDomain);
        assert_eq!(c.reject_reason, Some(RejectReason::NonVietnamese));
    }

    #[test]
    fn keyword_set_membership_matches() {
        let keywords: BTreeSet<String> = ["giấy_phép_lái_xe".to_string()].into();
        let c = classifier().classify("bị tước thì làm sao", &keywords);
        assert_eq!(c.decision, Decision::Accepted);
        assert_eq!(c.matched_rules, vec!["giấy_phép_lái_xe".to_string()]);
    }

    #[test]
    fn single_hit_is_sufficient() {
        let c = classifier().classify("mức phạt hiện nay", &BTreeSet::new());
        assert_eq!(c.decision, Decision::Accepted);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let q = "Ô tô vượt đèn đỏ bị phạt thế nào?";
        let first = c.classify(q, &BTreeSet::new());
        let second = c.classify(q, &BTreeSet::new());
        assert_eq!(first.decision, second.decision);
        assert_eq!(first.matched_rules, second.matched_rules);
    }

    #[test]
    fn malformed_rule_file_is_config_error() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "xe_máy: not-a-number").unwrap();
        let err = RuleTable::load_from(file.path()).unwrap_err();
        assert!(matches!(err, LuatbotError::Config(_)));
    }

    #[test]
    fn rule_file_parses_counts_and_bare_words() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "xe_máy: 120\n\n# comment\nphạt").unwrap();
        let table = RuleTable::load_from(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }
}
