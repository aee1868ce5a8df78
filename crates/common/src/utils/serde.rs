//! Serde helpers shared by the retry plan and outcome types

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// `Duration` as whole milliseconds
///
/// Use with `#[serde(with = "duration_millis")]`. Durations beyond
/// `u64::MAX` milliseconds serialize as `u64::MAX`.
///
/// ```rust
/// use std::time::Duration;
///
/// use serde::{Deserialize, Serialize};
/// use voxguard_common::duration_millis;
///
/// #[derive(Serialize, Deserialize)]
/// struct Wait {
///     #[serde(with = "duration_millis")]
///     delay: Duration,
/// }
/// ```
pub mod duration_millis {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{Outcome, OutcomeKind, RetryPlan};

    /// Validates retry plans serialize their delay in milliseconds.
    ///
    /// Assertions:
    /// - Confirms the JSON carries `"delay":353`.
    /// - Confirms the plan decodes back unchanged.
    #[test]
    fn test_retry_plan_delay_in_millis() {
        let plan = RetryPlan::new("transport", 1, Duration::from_millis(353));

        let json = serde_json::to_string(&plan).expect("plan serializes");
        assert!(json.contains("\"delay\":353"), "got {}", json);

        let decoded: RetryPlan = serde_json::from_str(&json).expect("plan decodes");
        assert_eq!(decoded, plan);
    }

    /// Validates outcome timings survive a JSON round trip.
    ///
    /// Assertions:
    /// - Confirms `total_delay` and `elapsed` are written as integers.
    /// - Confirms sub-millisecond precision is dropped.
    #[test]
    fn test_outcome_timings_in_millis() {
        let outcome = Outcome::new(
            OutcomeKind::Failed,
            3,
            "auth",
            "corr-9",
            Duration::from_millis(1_500),
            Duration::from_micros(1_612_400),
        );

        let value = serde_json::to_value(&outcome).expect("outcome serializes");
        assert_eq!(value["total_delay"], 1_500);
        assert_eq!(value["elapsed"], 1_612);

        let decoded: Outcome = serde_json::from_value(value).expect("outcome decodes");
        assert_eq!(decoded.elapsed, Duration::from_millis(1_612));
        assert_eq!(decoded.kind, OutcomeKind::Failed);
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let plan = RetryPlan::new("session", 2, Duration::MAX);
        let value = serde_json::to_value(&plan).expect("plan serializes");
        assert_eq!(value["delay"], u64::MAX);
    }

    #[test]
    fn test_non_numeric_delay_rejected() {
        let result = serde_json::from_str::<RetryPlan>(
            r#"{"delay":"350ms","attempt":1,"domain":"transport"}"#,
        );
        assert!(result.is_err());
    }
}
