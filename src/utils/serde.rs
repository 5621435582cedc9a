/*!
 * Serde helpers shared by persisted artifacts.
 *
 * Durations are written as integer milliseconds so that fleet summaries and
 * JSON reports stay readable by shell tooling (`jq '.outcomes[].elapsed_ms'`).
 */

/// Serialize a [`Duration`](std::time::Duration) as whole milliseconds.
///
/// # Usage with serde
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Serialize, Deserialize)]
/// struct Timing {
///     #[serde(with = "fleetcheck_core::utils::serde::duration_millis")]
///     elapsed_ms: Duration,
/// }
///
/// let json = serde_json::to_string(&Timing { elapsed_ms: Duration::from_millis(1500) }).unwrap();
/// assert_eq!(json, r#"{"elapsed_ms":1500}"#);
/// ```
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

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

/// Same as [`duration_millis`] for `Option<Duration>` fields.
pub mod optional_duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => {
                serializer.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
