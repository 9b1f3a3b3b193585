//! Artifact extraction from raw message text.
//!
//! The extractor is a pure function from text to typed candidate sets. It is
//! intentionally permissive: a false positive costs nothing downstream
//! because the merge only ever grows a collected-evidence set, while a missed
//! lead is gone for good.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Handle-like payment identifiers, e.g. `fraudster@okbank`.
static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._-]{2,}@[A-Za-z]{2,}").unwrap());

/// Links carrying an explicit scheme or `www.` prefix.
static SCHEMED_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").unwrap());

/// Scheme-less links: `label(.label)*.tld` with an optional path.
static BARE_DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9][A-Za-z0-9-]*(?:\.[A-Za-z0-9][A-Za-z0-9-]*)*\.[A-Za-z]{2,}(?:/\S*)?")
        .unwrap()
});

/// Phone candidates: optional country-code or trunk prefix, ten digits with
/// optional interleaved separators.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+?91|0)?[-\s]?(?:\d[-\s]?){10}").unwrap());

/// Standalone digit runs in the account-number length range.
static BANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{9,18}\b").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Vocabulary checked by case-insensitive containment.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "urgent",
    "verify",
    "blocked",
    "kyc",
    "otp",
    "upi",
    "account",
    "click",
    "apk",
    "suspended",
    "reward",
    "lottery",
    "refund",
    "anydesk",
    "password",
    "expire",
];

/// Leading digits accepted for a ten-digit mobile number (Indian numbering).
pub const DEFAULT_PHONE_LEADING_DIGITS: &[char] = &['5', '6', '7', '8', '9'];

/// Tunable knobs for the extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// First digit a reduced ten-digit number must carry to count as a phone.
    pub phone_leading_digits: BTreeSet<char>,
    /// Suspicious-keyword vocabulary, matched lowercased.
    pub keywords: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            phone_leading_digits: DEFAULT_PHONE_LEADING_DIGITS.iter().copied().collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Candidate artifacts pulled out of a single message.
///
/// Ephemeral: produced per inbound message and merged into the session's
/// [`IntelBundle`](super::IntelBundle), never persisted directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedIntel {
    pub upi_ids: BTreeSet<String>,
    pub bank_accounts: BTreeSet<String>,
    pub phone_numbers: BTreeSet<String>,
    pub phishing_links: BTreeSet<String>,
    pub suspicious_keywords: BTreeSet<String>,
}

impl ExtractedIntel {
    /// True when no field holds any candidate.
    pub fn is_empty(&self) -> bool {
        self.upi_ids.is_empty()
            && self.bank_accounts.is_empty()
            && self.phone_numbers.is_empty()
            && self.phishing_links.is_empty()
            && self.suspicious_keywords.is_empty()
    }
}

/// Parses free text into typed artifact candidates.
///
/// Pure: no side effects, no external state. Never fails; any input yields
/// a (possibly empty) result.
#[derive(Debug, Clone, Default)]
pub struct IntelExtractor {
    config: ExtractorConfig,
}

impl IntelExtractor {
    /// Creates an extractor with the default vocabulary and numbering plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with custom configuration.
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extracts all artifact candidates from one message.
    pub fn extract(&self, text: &str) -> ExtractedIntel {
        let text = WHITESPACE_RE.replace_all(text.trim(), " ");

        let upi_ids: BTreeSet<String> = HANDLE_RE
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect();

        let phishing_links = self.extract_links(&text);
        let phone_numbers = self.extract_phones(&text);
        let bank_accounts = Self::extract_bank_accounts(&text, &phone_numbers);

        let lowered = text.to_lowercase();
        let suspicious_keywords = self
            .config
            .keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect();

        ExtractedIntel {
            upi_ids,
            bank_accounts,
            phone_numbers,
            phishing_links,
            suspicious_keywords,
        }
    }

    /// Collects schemed links first, then bare domains that do not overlap a
    /// schemed match or a payment handle. When both patterns cover the same
    /// substring the more specific (schemed) form wins.
    fn extract_links(&self, text: &str) -> BTreeSet<String> {
        let mut links = BTreeSet::new();
        let mut covered: Vec<(usize, usize)> = Vec::new();

        for m in SCHEMED_LINK_RE.find_iter(text) {
            links.insert(m.as_str().to_string());
            covered.push((m.start(), m.end()));
        }
        // Handle spans are excluded so `support@fakebank.com` stays a payment
        // handle rather than doubling as a link.
        for m in HANDLE_RE.find_iter(text) {
            covered.push((m.start(), m.end()));
        }

        for m in BARE_DOMAIN_RE.find_iter(text) {
            let overlaps = covered
                .iter()
                .any(|&(start, end)| m.start() < end && start < m.end());
            if !overlaps {
                links.insert(m.as_str().to_string());
            }
        }

        links
    }

    /// Reduces each candidate digit run to its trailing ten digits and keeps
    /// it only when the leading digit is in the configured set.
    fn extract_phones(&self, text: &str) -> BTreeSet<String> {
        let mut phones = BTreeSet::new();
        for m in PHONE_RE.find_iter(text) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() < 10 {
                continue;
            }
            let last10 = &digits[digits.len() - 10..];
            let leading = last10.chars().next().unwrap_or('0');
            if self.config.phone_leading_digits.contains(&leading) {
                phones.insert(last10.to_string());
            }
        }
        phones
    }

    /// Digit runs of account-number length that are not contained in any
    /// accepted phone number. Disjointness by construction policy only; an
    /// account number that happens to end in a phone-like suffix is still
    /// dropped here.
    fn extract_bank_accounts(text: &str, phones: &BTreeSet<String>) -> BTreeSet<String> {
        BANK_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .filter(|run| !phones.iter().any(|p| p.contains(run.as_str())))
            .collect()
    }
}
