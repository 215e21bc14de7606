//! Resource naming convention.
//!
//! Every resource belonging to an environment is found again by name, so the
//! names below are the only link between a run and what it created earlier.
//! Nothing checks that they are unique within the account.

use serde::Serialize;

/// Names derived from an `(app, environment)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentNames {
    pub app: String,
    pub environment: String,
    /// Scaling group name: `{app}-{environment}`
    pub group: String,
    /// Load balancer name: `{group}-lb`
    pub load_balancer: String,
    /// DNS label under the base domain
    pub subdomain: String,
    /// Server name prefix used by the launch configuration
    pub node_base: String,
}

impl EnvironmentNames {
    /// Derive all names for an environment.
    pub fn resolve(app: &str, environment: &str) -> Self {
        let group = format!("{}-{}", app, environment);
        Self {
            app: app.to_string(),
            environment: environment.to_string(),
            load_balancer: format!("{}-lb", group),
            subdomain: group.clone(),
            node_base: group.clone(),
            group,
        }
    }

    /// Fully-qualified record name under `domain`.
    pub fn fqdn(&self, domain: &str) -> String {
        format!("{}.{}", self.subdomain, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_resolve() {
        let names = EnvironmentNames::resolve("app", "env");
        assert_eq!(names.group, "app-env");
        assert_eq!(names.load_balancer, "app-env-lb");
        assert_eq!(names.subdomain, "app-env");
        assert_eq!(names.node_base, "app-env");
    }

    #[test]
    fn test_fqdn() {
        let names = EnvironmentNames::resolve("win", "stg");
        assert_eq!(names.fqdn("example.com"), "win-stg.example.com");
    }

    #[test]
    fn test_collision_is_not_detected() {
        // "a-b" + "c" and "a" + "b-c" land on the same group.
        let left = EnvironmentNames::resolve("a-b", "c");
        let right = EnvironmentNames::resolve("a", "b-c");
        assert_eq!(left.group, right.group);
    }

    proptest! {
        #[test]
        fn prop_resolve_is_deterministic(app in "[a-z0-9]{1,12}", env in "[a-z0-9]{1,8}") {
            let first = EnvironmentNames::resolve(&app, &env);
            let second = EnvironmentNames::resolve(&app, &env);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.group.clone(), format!("{}-{}", app, env));
            prop_assert!(first.load_balancer.starts_with(&first.group));
            prop_assert!(first.load_balancer.ends_with("-lb"));
        }
    }
}
