//! Common types used across the platform

/// Free-form key/value payload attached to a batch event.
///
/// Deliberately schema-less: the event log is an audit trail, not a typed
/// contract between producers and consumers.
pub type EventMetadata = serde_json::Map<String, serde_json::Value>;

/// Build an [`EventMetadata`] from `key => value` pairs.
#[macro_export]
macro_rules! metadata {
    () => { $crate::types::EventMetadata::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::EventMetadata::new();
        $( map.insert(($key).to_string(), $crate::__serde_json::json!($value)); )+
        map
    }};
}
