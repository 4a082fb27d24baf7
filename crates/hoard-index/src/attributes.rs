//! Value types shared by every [`AttributeStore`](crate::AttributeStore).

use std::collections::BTreeMap;

/// Attribute name to value. Values are opaque strings compared bytewise.
pub type Attributes = BTreeMap<String, String>;

/// Build an [`Attributes`] map holding a single pair.
pub fn single(name: &str, value: impl Into<String>) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert(name.to_string(), value.into());
    attrs
}

/// Condition checked atomically with a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// Write unconditionally.
    None,
    /// The named attribute must not exist on the item.
    Absent(String),
    /// The named attribute must currently hold exactly `value`.
    Equals { name: String, value: String },
}

impl Precondition {
    /// Evaluate the condition against the item's current attributes.
    ///
    /// Returns a description of the mismatch when the condition does not hold.
    pub fn check(&self, current: Option<&Attributes>) -> Result<(), String> {
        let lookup = |name: &str| current.and_then(|attrs| attrs.get(name));
        match self {
            Self::None => Ok(()),
            Self::Absent(name) => match lookup(name.as_str()) {
                None => Ok(()),
                Some(existing) => Err(format!("{name} already set to {existing:?}")),
            },
            Self::Equals { name, value } => match lookup(name.as_str()) {
                Some(existing) if existing == value => Ok(()),
                Some(existing) => Err(format!("{name} is {existing:?}, expected {value:?}")),
                None => Err(format!("{name} is absent, expected {value:?}")),
            },
        }
    }
}

/// Ordered range select over one attribute: `after < value <= until`.
///
/// Results come back ascending by value, ties broken by item name, and at
/// most `limit` of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeQuery {
    pub attr: String,
    pub after: String,
    pub until: String,
    pub limit: usize,
}

impl RangeQuery {
    /// Returns `true` if `value` falls inside the half-open range.
    pub fn contains(&self, value: &str) -> bool {
        value > self.after.as_str() && value <= self.until.as_str()
    }
}

/// A named item and the attributes selected with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub attrs: Attributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_holds_only_without_attribute() {
        let cond = Precondition::Absent("time".into());
        assert!(cond.check(None).is_ok());
        assert!(cond.check(Some(&single("other", "x"))).is_ok());
        assert!(cond.check(Some(&single("time", "t1"))).is_err());
    }

    #[test]
    fn equals_requires_exact_value() {
        let cond = Precondition::Equals {
            name: "size".into(),
            value: "10".into(),
        };
        assert!(cond.check(Some(&single("size", "10"))).is_ok());
        assert!(cond.check(Some(&single("size", "11"))).is_err());
        assert!(cond.check(None).is_err());
    }

    #[test]
    fn range_is_exclusive_below_inclusive_above() {
        let query = RangeQuery {
            attr: "time".into(),
            after: "b".into(),
            until: "d".into(),
            limit: 10,
        };
        assert!(!query.contains("b"));
        assert!(query.contains("c"));
        assert!(query.contains("d"));
        assert!(!query.contains("e"));
    }
}
