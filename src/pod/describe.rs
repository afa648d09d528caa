use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "netpod.jlabath.mongo";

/// Operations served by the pod, in the order they are advertised.
pub const VARS: &[&str] = &["list-collections", "find-one", "find-many"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub vars: Vec<Var>,
}

/// Static description returned to the transport once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub format: String,
    pub namespaces: Vec<Namespace>,
}

impl DescribeResponse {
    #[must_use]
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            format: "json".to_string(),
            namespaces: vec![Namespace {
                name: namespace.to_string(),
                vars: VARS.iter().map(|v| Var { name: (*v).to_string() }).collect(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_three_vars_under_one_namespace() {
        let d = DescribeResponse::for_namespace(DEFAULT_NAMESPACE);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["format"], "json");
        assert_eq!(v["namespaces"][0]["name"], "netpod.jlabath.mongo");
        let names: Vec<_> = d.namespaces[0].vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, VARS);
    }
}
