//! Redelivery and dead-letter decisions for the ingestion pipeline.
//!
//! A payload that cannot be decoded will never succeed, so it goes straight
//! to the dead-letter sink. Anything else (store or cache failures) is left
//! on the queue and retried through the visibility timeout until the
//! message has been received `max_receive_count` times.

/// Receives allowed before a failing message is dead-lettered.
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 5;

/// Why processing a message failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The body could not be decoded.
    Malformed,
    /// The store or cache rejected the write.
    Processing,
}

/// What to do with a message whose processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Leave it undeleted; the queue redelivers it after the visibility window.
    Retry,
    /// Move it to the dead-letter sink.
    DeadLetter,
}

/// Bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub max_receive_count: u32,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_receive_count: DEFAULT_MAX_RECEIVE_COUNT,
        }
    }
}

impl DeliveryPolicy {
    pub fn new(max_receive_count: u32) -> Self {
        Self {
            max_receive_count: max_receive_count.max(1),
        }
    }

    /// Decides the fate of a failed message given how often it was received.
    pub fn disposition(&self, receive_count: u32, failure: FailureKind) -> Disposition {
        match failure {
            FailureKind::Malformed => Disposition::DeadLetter,
            FailureKind::Processing if receive_count >= self.max_receive_count => {
                Disposition::DeadLetter
            }
            FailureKind::Processing => Disposition::Retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_is_dead_lettered_immediately() {
        let policy = DeliveryPolicy::default();

        assert_eq!(
            policy.disposition(1, FailureKind::Malformed),
            Disposition::DeadLetter
        );
    }

    #[test]
    fn test_processing_failures_retry_until_limit() {
        let policy = DeliveryPolicy::new(3);

        assert_eq!(
            policy.disposition(1, FailureKind::Processing),
            Disposition::Retry
        );
        assert_eq!(
            policy.disposition(2, FailureKind::Processing),
            Disposition::Retry
        );
        assert_eq!(
            policy.disposition(3, FailureKind::Processing),
            Disposition::DeadLetter
        );
        assert_eq!(
            policy.disposition(9, FailureKind::Processing),
            Disposition::DeadLetter
        );
    }

    #[test]
    fn test_zero_limit_is_clamped_to_one() {
        let policy = DeliveryPolicy::new(0);

        assert_eq!(policy.max_receive_count, 1);
        assert_eq!(
            policy.disposition(1, FailureKind::Processing),
            Disposition::DeadLetter
        );
    }

    #[test]
    fn test_default_limit() {
        assert_eq!(
            DeliveryPolicy::default().max_receive_count,
            DEFAULT_MAX_RECEIVE_COUNT
        );
    }
}
