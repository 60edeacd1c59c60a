// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(DealId);

impl DealId {
    /// Id for a deal created through the lead form.
    pub fn for_lead(unix_ms: i64) -> Self {
        Self(format!("lead-{unix_ms}"))
    }

    /// Id for a deal created by CSV import; `line` is the 1-based data
    /// row number within the imported file.
    pub fn for_import(unix_ms: i64, line: usize) -> Self {
        Self(format!("imp-{unix_ms}-{line}"))
    }

    pub fn for_demo(index: usize) -> Self {
        Self(format!("demo-{index}"))
    }
}

#[cfg(test)]
mod tests {
    use super::DealId;

    #[test]
    fn import_ids_carry_timestamp_and_line() {
        let id = DealId::for_import(1_760_000_000_123, 4);
        assert_eq!(id.as_str(), "imp-1760000000123-4");
    }

    #[test]
    fn lead_and_demo_ids_are_distinct_namespaces() {
        assert_ne!(DealId::for_lead(7), DealId::for_demo(7));
        assert_eq!(DealId::for_demo(3).as_str(), "demo-3");
    }
}
