use crate::error::SearchError;

pub type Value = i64;

/// A single `destination source length` remap rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    destination: Value,
    source: Value,
    length: Value,
}

impl Rule {
    pub fn new(destination: Value, source: Value, length: Value) -> Result<Self, SearchError> {
        if length <= 0 {
            return Err(SearchError::InvalidConfiguration(format!(
                "rule length must be positive, got {length}"
            )));
        }
        Ok(Self {
            destination,
            source,
            length,
        })
    }

    #[inline]
    pub fn map(&self, value: Value) -> Option<Value> {
        // Overflowing subtraction means the distance exceeds any possible length
        let offset = value.checked_sub(self.source)?;
        if (0..self.length).contains(&offset) {
            Some(self.destination.saturating_add(offset))
        } else {
            None
        }
    }
}

/// One stage of the pipeline. Rules are tried in declaration order and the
/// first covering rule wins; overlapping rules are not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeMap {
    name: String,
    rules: Vec<Rule>,
}

impl RangeMap {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[inline]
    pub fn apply(&self, value: Value) -> Value {
        self.rules
            .iter()
            .find_map(|rule| rule.map(value))
            .unwrap_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(destination: Value, source: Value, length: Value) -> Rule {
        Rule::new(destination, source, length).unwrap()
    }

    #[test]
    fn test_rule_bounds() {
        let r = rule(50, 98, 2);
        assert_eq!(r.map(97), None);
        assert_eq!(r.map(98), Some(50));
        assert_eq!(r.map(99), Some(51));
        assert_eq!(r.map(100), None);
    }

    #[test]
    fn test_rule_rejects_non_positive_length() {
        assert!(matches!(
            Rule::new(0, 0, 0),
            Err(SearchError::InvalidConfiguration(_))
        ));
        assert!(Rule::new(0, 0, -3).is_err());
    }

    #[test]
    fn test_identity_for_uncovered_values() {
        let map = RangeMap::new("seed-to-soil", vec![rule(50, 98, 2), rule(52, 50, 48)]);
        assert_eq!(map.apply(0), 0);
        assert_eq!(map.apply(49), 49);
        assert_eq!(map.apply(50), 52);
        assert_eq!(map.apply(79), 81);
        assert_eq!(map.apply(97), 99);
        assert_eq!(map.apply(98), 50);
        assert_eq!(map.apply(100), 100);
        assert_eq!(map.apply(-5), -5);
    }

    #[test]
    fn test_first_rule_wins_on_overlap() {
        let map = RangeMap::new("overlap", vec![rule(1000, 10, 10), rule(2000, 15, 10)]);
        assert_eq!(map.apply(15), 1005);
        assert_eq!(map.apply(22), 2007);
    }

    #[test]
    fn test_extreme_values_are_total() {
        let map = RangeMap::new("edges", vec![rule(Value::MAX - 1, Value::MIN, 10)]);
        assert_eq!(map.apply(Value::MAX), Value::MAX);
        assert_eq!(map.apply(Value::MIN), Value::MAX - 1);
        assert_eq!(map.apply(Value::MIN + 5), Value::MAX);
    }
}
