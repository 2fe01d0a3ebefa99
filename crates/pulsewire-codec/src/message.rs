//! Decoded pulses.

use crate::header::{PulseHeader, Timestamp};
use crate::types::Data;

/// One channel's value in one pulse. Both parts are independently absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value {
    pub value: Option<Data>,
    pub timestamp: Option<Timestamp>,
}

impl Value {
    pub fn new(value: Option<Data>, timestamp: Option<Timestamp>) -> Self {
        Self { value, timestamp }
    }

    /// No value and no timestamp this pulse.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    pub fn timestamp_sec(&self) -> Option<u64> {
        self.timestamp.map(|ts| ts.sec)
    }

    pub fn timestamp_ns(&self) -> Option<u64> {
        self.timestamp.map(|ts| ts.ns)
    }
}

/// Channel name to value, in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelValues {
    entries: Vec<(String, Value)>,
}

impl ChannelValues {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a channel, replacing an existing entry of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter().position(|(existing, _)| *existing == name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append without checking for an existing name.
    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ChannelValues {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A decoded pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: PulseHeader,
    pub data: ChannelValues,
    /// True exactly when the schema differs from the previous pulse's.
    pub format_changed: bool,
}

impl Message {
    pub fn pulse_id(&self) -> u64 {
        self.header.pulse_id
    }

    pub fn global_timestamp(&self) -> Timestamp {
        self.header.global_timestamp
    }

    pub fn hash(&self) -> &str {
        &self.header.hash
    }

    /// Shorthand for the value of a channel.
    pub fn value(&self, name: &str) -> Option<&Data> {
        self.data.get(name).and_then(|value| value.value.as_ref())
    }

    /// A pulse that carried no channels.
    pub fn is_heartbeat(&self) -> bool {
        self.data.is_empty()
    }
}
