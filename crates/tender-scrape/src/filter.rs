use tender_core::TenderRecord;

/// True if the lowercased title contains any of `keywords` (also lowercased).
pub fn is_excluded(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| title.contains(&k.to_lowercase()))
}

/// Drop tenders whose title matches an excluded keyword, keeping order.
pub fn filter_tenders(records: Vec<TenderRecord>, keywords: &[String]) -> Vec<TenderRecord> {
    let before = records.len();
    let kept: Vec<TenderRecord> = records
        .into_iter()
        .filter(|r| {
            let excluded = is_excluded(&r.title, keywords);
            if excluded {
                tracing::debug!(title = %r.title, "excluded by keyword");
            }
            !excluded
        })
        .collect();
    tracing::info!(before, after = kept.len(), "keyword filter applied");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use tender_core::DEFAULT_EXCLUDED_KEYWORDS;

    fn defaults() -> Vec<String> {
        DEFAULT_EXCLUDED_KEYWORDS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn case_insensitive_substring() {
        let kw = defaults();
        assert!(is_excluded("TRAVAUX de réfection", &kw));
        assert!(is_excluded("Acquisition de matériel", &kw));
        // Substring match, as in "reconstruction".
        assert!(is_excluded("Reconstruction du pont", &kw));
        assert!(!is_excluded("Etude de faisabilité", &kw));
    }

    #[test]
    fn accented_variant_is_not_matched() {
        // "équipement" does not contain "equipement".
        assert!(!is_excluded("Équipement informatique", &defaults()));
    }

    #[test]
    fn empty_keyword_excludes_nothing() {
        assert!(!is_excluded("anything", &[String::new()]));
    }

    #[test]
    fn filter_keeps_order() {
        let records = vec![
            TenderRecord::new("Audit", "u1", vec![]),
            TenderRecord::new("Achat de fournitures", "u2", vec![]),
            TenderRecord::new("Formation", "u3", vec![]),
        ];
        let kept = filter_tenders(records, &defaults());
        let urls: Vec<_> = kept.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u3"]);
    }
}
