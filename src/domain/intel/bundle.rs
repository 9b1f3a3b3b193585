//! Accumulated per-session intelligence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ExtractedIntel;

/// Everything collected from one correspondent over a session's lifetime.
///
/// Each field only ever grows (set union, never removal) until the session
/// record expires out of the store. Field names serialize in the collector's
/// wire casing so the bundle can be embedded in the report payload as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelBundle {
    pub upi_ids: BTreeSet<String>,
    pub bank_accounts: BTreeSet<String>,
    pub phone_numbers: BTreeSet<String>,
    pub phishing_links: BTreeSet<String>,
    pub suspicious_keywords: BTreeSet<String>,
}

impl IntelBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one message's candidates into the bundle.
    ///
    /// Returns true iff any field gained at least one element, i.e. the turn
    /// produced novel intelligence. Merging the same candidates twice is a
    /// no-op the second time.
    pub fn absorb(&mut self, delta: &ExtractedIntel) -> bool {
        let mut novel = false;
        novel |= union_into(&mut self.upi_ids, &delta.upi_ids);
        novel |= union_into(&mut self.bank_accounts, &delta.bank_accounts);
        novel |= union_into(&mut self.phone_numbers, &delta.phone_numbers);
        novel |= union_into(&mut self.phishing_links, &delta.phishing_links);
        novel |= union_into(&mut self.suspicious_keywords, &delta.suspicious_keywords);
        novel
    }

    /// True iff the bundle holds at least one directly actionable artifact.
    ///
    /// Payment handles, bank accounts and links always qualify; whether a
    /// phone number alone does is a policy decision left to the caller.
    pub fn has_critical_data(&self, count_phones: bool) -> bool {
        !self.upi_ids.is_empty()
            || !self.bank_accounts.is_empty()
            || !self.phishing_links.is_empty()
            || (count_phones && !self.phone_numbers.is_empty())
    }

    /// True when no field holds anything.
    pub fn is_empty(&self) -> bool {
        self.upi_ids.is_empty()
            && self.bank_accounts.is_empty()
            && self.phone_numbers.is_empty()
            && self.phishing_links.is_empty()
            && self.suspicious_keywords.is_empty()
    }

    /// Total artifact count across all fields.
    pub fn len(&self) -> usize {
        self.upi_ids.len()
            + self.bank_accounts.len()
            + self.phone_numbers.len()
            + self.phishing_links.len()
            + self.suspicious_keywords.len()
    }
}

/// Unions `incoming` into `field`, reporting whether anything was new.
fn union_into(field: &mut BTreeSet<String>, incoming: &BTreeSet<String>) -> bool {
    let before = field.len();
    field.extend(incoming.iter().cloned());
    field.len() > before
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn delta(handles: &[&str], links: &[&str]) -> ExtractedIntel {
        ExtractedIntel {
            upi_ids: handles.iter().map(|s| s.to_string()).collect(),
            phishing_links: links.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn absorb_reports_novelty_for_new_artifacts() {
        let mut bundle = IntelBundle::new();
        assert!(bundle.absorb(&delta(&["pay@upi"], &[])));
        assert!(bundle.upi_ids.contains("pay@upi"));
    }

    #[test]
    fn absorb_is_idempotent() {
        let mut bundle = IntelBundle::new();
        let d = delta(&["pay@upi"], &["www.bad.example"]);

        assert!(bundle.absorb(&d));
        let after_first = bundle.clone();

        assert!(!bundle.absorb(&d));
        assert_eq!(bundle, after_first);
    }

    #[test]
    fn absorb_detects_novelty_in_any_single_field() {
        let mut bundle = IntelBundle::new();
        bundle.absorb(&delta(&["pay@upi"], &[]));

        // Same handle again plus one new link: still novel.
        assert!(bundle.absorb(&delta(&["pay@upi"], &["bit.ly/x"])));
    }

    #[test]
    fn empty_delta_is_not_novel() {
        let mut bundle = IntelBundle::new();
        assert!(!bundle.absorb(&ExtractedIntel::default()));
    }

    #[test]
    fn has_critical_data_ignores_keywords() {
        let mut bundle = IntelBundle::new();
        bundle.suspicious_keywords.insert("urgent".to_string());
        assert!(!bundle.has_critical_data(false));
    }

    #[test]
    fn phone_numbers_are_critical_only_when_configured() {
        let mut bundle = IntelBundle::new();
        bundle.phone_numbers.insert("9876543210".to_string());

        assert!(!bundle.has_critical_data(false));
        assert!(bundle.has_critical_data(true));
    }

    #[test]
    fn handles_accounts_and_links_are_always_critical() {
        for field in 0..3 {
            let mut bundle = IntelBundle::new();
            match field {
                0 => bundle.upi_ids.insert("pay@upi".to_string()),
                1 => bundle.bank_accounts.insert("123456789".to_string()),
                _ => bundle.phishing_links.insert("bit.ly/x".to_string()),
            };
            assert!(bundle.has_critical_data(false));
        }
    }

    #[test]
    fn serializes_with_collector_field_names() {
        let mut bundle = IntelBundle::new();
        bundle.upi_ids.insert("pay@upi".to_string());

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("upiIds").is_some());
        assert!(json.get("bankAccounts").is_some());
        assert!(json.get("phoneNumbers").is_some());
        assert!(json.get("phishingLinks").is_some());
        assert!(json.get("suspiciousKeywords").is_some());
    }

    fn arb_delta() -> impl Strategy<Value = ExtractedIntel> {
        let set = proptest::collection::btree_set("[a-z0-9@./]{1,12}", 0..5);
        (set.clone(), set.clone(), set.clone(), set.clone(), set).prop_map(
            |(upi_ids, bank_accounts, phone_numbers, phishing_links, suspicious_keywords)| {
                ExtractedIntel {
                    upi_ids,
                    bank_accounts,
                    phone_numbers,
                    phishing_links,
                    suspicious_keywords,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn merging_twice_equals_merging_once(d in arb_delta()) {
            let mut once = IntelBundle::new();
            once.absorb(&d);

            let mut twice = IntelBundle::new();
            twice.absorb(&d);
            twice.absorb(&d);

            prop_assert_eq!(once, twice);
        }

        #[test]
        fn bundle_only_grows(deltas in proptest::collection::vec(arb_delta(), 1..8)) {
            let mut bundle = IntelBundle::new();
            let mut previous_len = 0;

            for d in &deltas {
                let before = bundle.clone();
                bundle.absorb(d);

                prop_assert!(bundle.len() >= previous_len);
                prop_assert!(before.upi_ids.is_subset(&bundle.upi_ids));
                prop_assert!(before.bank_accounts.is_subset(&bundle.bank_accounts));
                prop_assert!(before.phone_numbers.is_subset(&bundle.phone_numbers));
                prop_assert!(before.phishing_links.is_subset(&bundle.phishing_links));
                prop_assert!(before.suspicious_keywords.is_subset(&bundle.suspicious_keywords));
                previous_len = bundle.len();
            }
        }

        #[test]
        fn novelty_is_false_iff_delta_already_absorbed(d in arb_delta()) {
            let mut bundle = IntelBundle::new();
            let first = bundle.absorb(&d);
            let second = bundle.absorb(&d);

            prop_assert_eq!(first, !d.is_empty());
            prop_assert!(!second);
        }
    }
}
