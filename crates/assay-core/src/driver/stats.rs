use serde::Serialize;

/// Rule execution statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub rule_name: String,
    /// Invocations that found at least one match
    pub applications: u64,
    /// Rewrites performed
    pub transformations: u64,
    pub errors: u64,
    pub total_time_ms: u64,
}

impl RuleStats {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            applications: 0,
            transformations: 0,
            errors: 0,
            total_time_ms: 0,
        }
    }

    /// Rewrites per application
    pub fn transformations_per_application(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.transformations as f64) / (self.applications as f64)
        }
    }

    pub fn average_time_ms(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.total_time_ms as f64) / (self.applications as f64)
        }
    }

    pub fn merge(&mut self, other: &RuleStats) {
        self.applications += other.applications;
        self.transformations += other.transformations;
        self.errors += other.errors;
        self.total_time_ms += other.total_time_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_of_unused_rule_are_zero() {
        let stats = RuleStats::new("r".to_string());
        assert_eq!(stats.transformations_per_application(), 0.0);
        assert_eq!(stats.average_time_ms(), 0.0);
    }

    #[test]
    fn test_merge() {
        let mut total = RuleStats::new("r".to_string());
        let mut worker = RuleStats::new("r".to_string());
        worker.applications = 2;
        worker.transformations = 5;
        worker.total_time_ms = 4;
        total.merge(&worker);
        total.merge(&worker);
        assert_eq!(total.applications, 4);
        assert_eq!(total.transformations_per_application(), 2.5);
        assert_eq!(total.average_time_ms(), 2.0);
    }
}
