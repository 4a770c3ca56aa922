//! Change decision engine: pure classification of a resource from its prior
//! record and this run's probe.
//!
//! Priority: no record → NEW; failed probe → CHANGED; matching entity tags →
//! UNCHANGED; matching `Last-Modified` → UNCHANGED; anything else → CHANGED.

use crate::probe::ProbeResult;
use crate::store::ResourceRecord;

/// Which signal proved the resource unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ChangeTagMatch,
    ModifiedAtMatch,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ChangeTagMatch => f.write_str("etag unchanged"),
            SkipReason::ModifiedAtMatch => f.write_str("last-modified unchanged"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Never downloaded before.
    New,
    /// Known, and either changed or impossible to revalidate.
    Changed,
    /// Known and unchanged according to the given signal.
    Unchanged(SkipReason),
}

impl Classification {
    pub fn needs_fetch(self) -> bool {
        !matches!(self, Classification::Unchanged(_))
    }
}

pub fn classify(prior: Option<&ResourceRecord>, probe: &ProbeResult) -> Classification {
    let Some(prior) = prior else {
        return Classification::New;
    };
    if !probe.probe_succeeded {
        return Classification::Changed;
    }
    if let (Some(known), Some(observed)) = (&prior.change_tag, &probe.observed_change_tag) {
        if known == observed {
            return Classification::Unchanged(SkipReason::ChangeTagMatch);
        }
    }
    if let Some(known) = &prior.modified_at {
        if probe.observed_modified_at.as_ref() == Some(known) {
            return Classification::Unchanged(SkipReason::ModifiedAtMatch);
        }
    }
    Classification::Changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prior(tag: Option<&str>, modified: Option<&str>) -> ResourceRecord {
        ResourceRecord {
            identity: "ds::u".to_string(),
            url: "u".to_string(),
            local_filename: "f.csv".to_string(),
            change_tag: tag.map(str::to_string),
            modified_at: modified.map(str::to_string),
            fetched_at: Utc::now(),
            row_count: 1,
            column_count: 1,
        }
    }

    fn probe(tag: Option<&str>, modified: Option<&str>) -> ProbeResult {
        ProbeResult {
            identity: "ds::u".to_string(),
            observed_change_tag: tag.map(str::to_string),
            observed_modified_at: modified.map(str::to_string),
            probe_succeeded: true,
        }
    }

    const LM: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
    const LM2: &str = "Thu, 22 Oct 2015 07:28:00 GMT";

    #[test]
    fn no_prior_is_new_regardless_of_probe() {
        assert_eq!(classify(None, &probe(Some("abc"), Some(LM))), Classification::New);
        assert_eq!(classify(None, &ProbeResult::failed("ds::u")), Classification::New);
    }

    #[test]
    fn failed_probe_is_changed_even_if_tags_would_match() {
        let mut p = probe(Some("abc"), Some(LM));
        p.probe_succeeded = false;
        assert_eq!(
            classify(Some(&prior(Some("abc"), Some(LM))), &p),
            Classification::Changed
        );
    }

    #[test]
    fn equal_tags_unchanged() {
        assert_eq!(
            classify(Some(&prior(Some("abc"), None)), &probe(Some("abc"), None)),
            Classification::Unchanged(SkipReason::ChangeTagMatch)
        );
    }

    #[test]
    fn tag_takes_priority_over_modified_at() {
        assert_eq!(
            classify(Some(&prior(Some("abc"), Some(LM))), &probe(Some("abc"), Some(LM2))),
            Classification::Unchanged(SkipReason::ChangeTagMatch)
        );
    }

    #[test]
    fn equal_modified_at_unchanged_when_tags_unusable() {
        assert_eq!(
            classify(Some(&prior(None, Some(LM))), &probe(Some("new"), Some(LM))),
            Classification::Unchanged(SkipReason::ModifiedAtMatch)
        );
        assert_eq!(
            classify(Some(&prior(Some("abc"), Some(LM))), &probe(None, Some(LM))),
            Classification::Unchanged(SkipReason::ModifiedAtMatch)
        );
    }

    #[test]
    fn different_tag_and_modified_at_changed() {
        assert_eq!(
            classify(Some(&prior(Some("abc"), Some(LM))), &probe(Some("def"), Some(LM2))),
            Classification::Changed
        );
    }

    #[test]
    fn no_usable_signal_changed() {
        assert_eq!(
            classify(Some(&prior(None, None)), &probe(None, None)),
            Classification::Changed
        );
        assert_eq!(
            classify(Some(&prior(Some("abc"), None)), &probe(None, None)),
            Classification::Changed
        );
        assert_eq!(
            classify(Some(&prior(None, Some(LM))), &probe(None, None)),
            Classification::Changed
        );
    }

    #[test]
    fn needs_fetch_matches_classification() {
        assert!(Classification::New.needs_fetch());
        assert!(Classification::Changed.needs_fetch());
        assert!(!Classification::Unchanged(SkipReason::ModifiedAtMatch).needs_fetch());
    }
}
