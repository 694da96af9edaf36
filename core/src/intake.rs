//! Intake resolution for new requests.
//!
//! Which signals are taken from the classifier depends on what the caller
//! supplied. That decision is made up front as an [`IntakePlan`]; the
//! classifier is then called exactly once and the plan picks which parts of
//! the answer to honor.

use std::sync::Arc;

use chrono::Utc;
use strum_macros::AsRefStr;

use crate::classifier::Classification;
use crate::classifier::Classifier;
use crate::model::Category;
use crate::model::NEUTRAL_SENTIMENT;
use crate::model::NewServiceRequest;
use crate::model::Priority;
use crate::model::ResolvedRequest;

/// Category used when neither the caller nor the classifier provides one.
pub const DEFAULT_CATEGORY: Category = Category::General;

/// Priority used when neither the caller nor the classifier provides one.
pub const DEFAULT_PRIORITY: Priority = Priority::Low;

/// What the classifier is consulted for. Sentiment is always wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum IntakePlan {
    /// Nothing supplied: category, priority and sentiment.
    Full,
    /// Category supplied: priority and sentiment.
    PriorityAndSentiment { category: Category },
    /// Priority supplied: category and sentiment.
    CategoryAndSentiment { priority: Priority },
    /// Both supplied: sentiment only.
    SentimentOnly {
        category: Category,
        priority: Priority,
    },
}

/// Final category, priority and sentiment for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSignals {
    pub category: Category,
    pub priority: Priority,
    pub sentiment: String,
}

impl IntakePlan {
    pub fn for_submission(category: Option<Category>, priority: Option<Priority>) -> Self {
        match (category, priority) {
            (None, None) => IntakePlan::Full,
            (Some(category), None) => IntakePlan::PriorityAndSentiment { category },
            (None, Some(priority)) => IntakePlan::CategoryAndSentiment { priority },
            (Some(category), Some(priority)) => IntakePlan::SentimentOnly { category, priority },
        }
    }

    /// Combine the caller's values with the classifier outcome.
    ///
    /// Supplied values always win; missing ones come from the classifier or,
    /// when it is unavailable or has no usable suggestion, from the defaults.
    pub fn apply(self, outcome: &Classification) -> ResolvedSignals {
        let suggestion = match outcome {
            Classification::Available(suggestion) => Some(suggestion),
            Classification::Unavailable => None,
        };

        // Each signal falls back on its own: an unusable category does not
        // discard a usable priority.
        let suggested_category = suggestion
            .and_then(|s| s.suggested_category)
            .unwrap_or(DEFAULT_CATEGORY);
        let suggested_priority = suggestion
            .and_then(|s| s.suggested_priority)
            .unwrap_or(DEFAULT_PRIORITY);
        let sentiment = suggestion.map_or_else(
            || NEUTRAL_SENTIMENT.to_string(),
            |s| s.sentiment.clone(),
        );

        let (category, priority) = match self {
            IntakePlan::Full => (suggested_category, suggested_priority),
            IntakePlan::PriorityAndSentiment { category } => (category, suggested_priority),
            IntakePlan::CategoryAndSentiment { priority } => (suggested_category, priority),
            IntakePlan::SentimentOnly { category, priority } => (category, priority),
        };

        ResolvedSignals {
            category,
            priority,
            sentiment,
        }
    }
}

/// Turns a validated submission into a complete, id-less request.
#[derive(Clone)]
pub struct IntakeResolver {
    classifier: Arc<dyn Classifier>,
}

impl IntakeResolver {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Resolve category, priority and sentiment for `submission`.
    ///
    /// Never fails; classifier problems degrade to defaults.
    pub async fn resolve(&self, submission: NewServiceRequest) -> ResolvedRequest {
        let plan = IntakePlan::for_submission(submission.category, submission.priority);
        let outcome = self
            .classifier
            .classify(&submission.title, &submission.description)
            .await;

        if outcome == Classification::Unavailable {
            tracing::info!(plan = plan.as_ref(), "classifier unavailable, using defaults");
        }

        let signals = plan.apply(&outcome);
        ResolvedRequest {
            title: submission.title,
            description: submission.description,
            requester_name: submission.requester_name,
            requester_email: submission.requester_email,
            category: signals.category,
            priority: signals.priority,
            ai_notes: signals.sentiment,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierSuggestion;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    /// Returns a canned outcome and counts calls.
    struct FixedClassifier {
        outcome: Classification,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(outcome: Classification) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _title: &str, _description: &str) -> Classification {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn available() -> Classification {
        Classification::Available(ClassifierSuggestion {
            suggested_category: Some(Category::Facilities),
            suggested_priority: Some(Priority::High),
            sentiment: "Frustrated".to_string(),
        })
    }

    /// Reply whose category was not recognised.
    fn available_without_category() -> Classification {
        Classification::Available(ClassifierSuggestion {
            suggested_category: None,
            suggested_priority: Some(Priority::High),
            sentiment: "Frustrated".to_string(),
        })
    }

    /// Reply whose priority was not recognised.
    fn available_without_priority() -> Classification {
        Classification::Available(ClassifierSuggestion {
            suggested_category: Some(Category::Facilities),
            suggested_priority: None,
            sentiment: "Frustrated".to_string(),
        })
    }

    fn submission(category: Option<Category>, priority: Option<Priority>) -> NewServiceRequest {
        NewServiceRequest {
            title: "Printer broken".to_string(),
            description: "The 3rd floor printer is jammed and unusable".to_string(),
            requester_name: "A. Lee".to_string(),
            requester_email: "a@x.com".to_string(),
            category,
            priority,
        }
    }

    #[test]
    fn plan_follows_supplied_fields() {
        assert_eq!(IntakePlan::for_submission(None, None), IntakePlan::Full);
        assert_eq!(
            IntakePlan::for_submission(Some(Category::It), None),
            IntakePlan::PriorityAndSentiment {
                category: Category::It
            }
        );
        assert_eq!(
            IntakePlan::for_submission(None, Some(Priority::High)),
            IntakePlan::CategoryAndSentiment {
                priority: Priority::High
            }
        );
        assert_eq!(
            IntakePlan::for_submission(Some(Category::It), Some(Priority::Low)).as_ref(),
            "sentiment_only"
        );
    }

    #[test]
    fn apply_without_classifier_uses_defaults() {
        let cases = [
            (None, None, Category::General, Priority::Low),
            (Some(Category::It), None, Category::It, Priority::Low),
            (None, Some(Priority::High), Category::General, Priority::High),
            (
                Some(Category::Facilities),
                Some(Priority::High),
                Category::Facilities,
                Priority::High,
            ),
        ];
        for (category, priority, want_category, want_priority) in cases {
            let signals =
                IntakePlan::for_submission(category, priority).apply(&Classification::Unavailable);
            assert_eq!(
                signals,
                ResolvedSignals {
                    category: want_category,
                    priority: want_priority,
                    sentiment: NEUTRAL_SENTIMENT.to_string(),
                }
            );
        }
    }

    #[test]
    fn apply_with_classifier_keeps_supplied_values() {
        let signals = IntakePlan::for_submission(Some(Category::It), None).apply(&available());
        assert_eq!(signals.category, Category::It);
        assert_eq!(signals.priority, Priority::High);
        assert_eq!(signals.sentiment, "Frustrated");

        let signals = IntakePlan::for_submission(None, Some(Priority::Low)).apply(&available());
        assert_eq!(signals.category, Category::Facilities);
        assert_eq!(signals.priority, Priority::Low);

        let signals = IntakePlan::for_submission(Some(Category::General), Some(Priority::Low))
            .apply(&available());
        assert_eq!(signals.category, Category::General);
        assert_eq!(signals.priority, Priority::Low);
        assert_eq!(signals.sentiment, "Frustrated");
    }

    #[test]
    fn partial_suggestion_falls_back_per_field() {
        let plan = IntakePlan::for_submission(None, None);
        assert_eq!(
            plan.apply(&available_without_category()),
            ResolvedSignals {
                category: DEFAULT_CATEGORY,
                priority: Priority::High,
                sentiment: "Frustrated".to_string(),
            }
        );
        assert_eq!(
            plan.apply(&available_without_priority()),
            ResolvedSignals {
                category: Category::Facilities,
                priority: DEFAULT_PRIORITY,
                sentiment: "Frustrated".to_string(),
            }
        );
    }

    #[test]
    fn partial_suggestion_keeps_the_usable_field() {
        // Category supplied, classifier category unknown: priority still used.
        let signals = IntakePlan::for_submission(Some(Category::It), None)
            .apply(&available_without_category());
        assert_eq!(signals.category, Category::It);
        assert_eq!(signals.priority, Priority::High);
        assert_eq!(signals.sentiment, "Frustrated");

        // Priority supplied, classifier priority unknown: category still used.
        let signals = IntakePlan::for_submission(None, Some(Priority::Low))
            .apply(&available_without_priority());
        assert_eq!(signals.category, Category::Facilities);
        assert_eq!(signals.priority, Priority::Low);
        assert_eq!(signals.sentiment, "Frustrated");
    }

    #[test]
    fn sentiment_survives_unknown_suggestions_when_both_supplied() {
        let reply = Classification::Available(ClassifierSuggestion {
            suggested_category: None,
            suggested_priority: None,
            sentiment: "Frustrated".to_string(),
        });
        let signals =
            IntakePlan::for_submission(Some(Category::It), Some(Priority::Low)).apply(&reply);
        assert_eq!(
            signals,
            ResolvedSignals {
                category: Category::It,
                priority: Priority::Low,
                sentiment: "Frustrated".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn resolve_uses_all_classifier_signals() {
        let classifier = FixedClassifier::new(available());
        let resolver = IntakeResolver::new(classifier.clone());

        let resolved = resolver.resolve(submission(None, None)).await;

        assert_eq!(classifier.calls(), 1);
        assert_eq!(resolved.category, Category::Facilities);
        assert_eq!(resolved.priority, Priority::High);
        assert_eq!(resolved.ai_notes, "Frustrated");
        assert_eq!(resolved.title, "Printer broken");
    }

    #[tokio::test]
    async fn resolve_with_both_given_still_asks_for_sentiment() {
        let classifier = FixedClassifier::new(Classification::Unavailable);
        let resolver = IntakeResolver::new(classifier.clone());

        let resolved = resolver
            .resolve(submission(Some(Category::It), Some(Priority::High)))
            .await;

        assert_eq!(classifier.calls(), 1);
        assert_eq!(resolved.category, Category::It);
        assert_eq!(resolved.priority, Priority::High);
        assert_eq!(resolved.ai_notes, NEUTRAL_SENTIMENT);
    }

    #[tokio::test]
    async fn resolve_calls_classifier_once_per_submission() {
        let classifier = FixedClassifier::new(available());
        let resolver = IntakeResolver::new(classifier.clone());

        resolver.resolve(submission(None, None)).await;
        resolver.resolve(submission(Some(Category::It), None)).await;
        resolver.resolve(submission(None, Some(Priority::Low))).await;
        resolver
            .resolve(submission(Some(Category::It), Some(Priority::Low)))
            .await;

        assert_eq!(classifier.calls(), 4);
    }
}
