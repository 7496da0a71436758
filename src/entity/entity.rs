use crate::error::OrchestratorError;

/// Entity names may only contain letters, digits, `-` and `_` (§6).
pub fn validate_entity_name(name: &str) -> Result<(), OrchestratorError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(OrchestratorError::config(format!(
            "entity name `{name}` can only contain letters, digits, '-' and '_'"
        )))
    }
}

/// Shared read-only surface every entity kind exposes: a human-readable
/// label for this node (`short_name`) and the dotted path from the root
/// (`long_name`), both used in log lines the way the teacher crate logs
/// `container_id` throughout `executor::NativeExecutor`.
pub trait Entity {
    /// `"Plan"`, `"Suite"`, `"Case"` or `"Command"`.
    fn kind_label(&self) -> &'static str;
    fn name(&self) -> &str;
    /// `<kind>_<name>` directory segment contributed at this level (§6).
    fn dir_name(&self) -> String {
        format!("{}_{}", self.kind_label().to_lowercase(), self.name())
    }
    fn short_name(&self) -> String {
        format!("{}[{}]", self.kind_label(), self.name())
    }
    fn long_name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_dash_underscore() {
        for name in ["test", "Test123", "123", "T123456789", "test-dash", "test_underscore"] {
            assert!(validate_entity_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_space_and_symbol() {
        for name in ["test space", "a@b", "a b"] {
            let err = validate_entity_name(name).unwrap_err();
            assert!(err.to_string().contains("can only contain"));
        }
    }
}
