//! Role directory: interviewer assignments per hiring role.
//! The CEO review view joins candidates to roles by job title, case-insensitively.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInterviewers {
    pub role_name: String,
    #[serde(default)]
    pub technical_interviewer: Option<String>,
    #[serde(default)]
    pub final_interviewer: Option<String>,
}

/// Supplies the current role list. Read-only from this crate's point of view.
pub trait RoleSource: Send + Sync {
    fn roles(&self) -> Vec<RoleInterviewers>;
}

impl RoleSource for Vec<RoleInterviewers> {
    fn roles(&self) -> Vec<RoleInterviewers> {
        self.clone()
    }
}

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("role file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("role file parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Role list loaded from a JSON array of [`RoleInterviewers`].
pub struct RoleDirectory {
    roles: Vec<RoleInterviewers>,
}

impl RoleDirectory {
    pub fn load_from_file(path: &Path) -> Result<Self, RoleError> {
        let content = std::fs::read_to_string(path)?;
        let roles: Vec<RoleInterviewers> = serde_json::from_str(&content)?;
        Ok(Self { roles })
    }

    pub fn from_roles(roles: Vec<RoleInterviewers>) -> Self {
        Self { roles }
    }

    /// Fallback when no role file is configured.
    pub fn empty() -> Self {
        Self { roles: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleSource for RoleDirectory {
    fn roles(&self) -> Vec<RoleInterviewers> {
        self.roles.clone()
    }
}

/// Index roles by lowercased name. Later duplicates win, like a map built from a list.
pub fn index_by_lowercase_name(roles: &[RoleInterviewers]) -> HashMap<String, &RoleInterviewers> {
    roles
        .iter()
        .map(|r| (r.role_name.to_lowercase(), r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_camel_case_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"roleName":"Brand Manager","technicalInterviewer":"Alice"}},
                {{"roleName":"Ops Lead","technicalInterviewer":null,"finalInterviewer":"Bob"}}]"#
        )
        .unwrap();

        let dir = RoleDirectory::load_from_file(file.path()).unwrap();
        assert_eq!(dir.len(), 2);
        let roles = dir.roles();
        assert_eq!(roles[0].technical_interviewer.as_deref(), Some("Alice"));
        assert_eq!(roles[0].final_interviewer, None);
        assert_eq!(roles[1].final_interviewer.as_deref(), Some("Bob"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RoleDirectory::load_from_file(Path::new("/nonexistent/roles.json"));
        assert!(matches!(err, Err(RoleError::Io(_))));
    }

    #[test]
    fn index_is_case_insensitive_and_last_wins() {
        let roles = vec![
            RoleInterviewers {
                role_name: "Brand Manager".into(),
                technical_interviewer: Some("Alice".into()),
                final_interviewer: None,
            },
            RoleInterviewers {
                role_name: "BRAND MANAGER".into(),
                technical_interviewer: Some("Carol".into()),
                final_interviewer: None,
            },
        ];
        let idx = index_by_lowercase_name(&roles);
        assert_eq!(idx.len(), 1);
        assert_eq!(
            idx["brand manager"].technical_interviewer.as_deref(),
            Some("Carol")
        );
    }
}
