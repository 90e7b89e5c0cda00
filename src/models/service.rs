use serde::{Deserialize, Serialize};

/// A registered upstream service (e.g. an internal API behind the proxy).
///
/// Tokens are issued per (user, service) pair; `base_url` is where the
/// server forwards authenticated calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub is_active: bool,
}

impl Service {
    /// Label used in selectors: `name (description)`.
    pub fn display_name(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.description)
        }
    }
}

/// Body for `POST /admin/services` and `PUT /admin/services/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInput {
    pub name: String,
    pub description: String,
    pub base_url: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut svc = Service {
            id: 1,
            name: "billing".into(),
            description: "invoices".into(),
            base_url: "http://billing.internal".into(),
            is_active: true,
        };
        assert_eq!(svc.display_name(), "billing (invoices)");
        svc.description.clear();
        assert_eq!(svc.display_name(), "billing");
    }
}
