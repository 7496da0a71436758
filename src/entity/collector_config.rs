use serde::{Deserialize, Serialize};

/// A single perf event, optionally scoped to a cgroup (§6 "Collector config
/// shape"). An event with no `cgroup` is a system-wide (`-a`) event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorEventConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup: Option<String>,
    pub name: String,
}

/// The external, parser-produced shape a collector is built from (§6). A
/// plan carries a list of these; `PluginManager` resolves `engine` to a
/// concrete [`crate::collector::Collector`] which then parses the rest of
/// this struct for its own fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub engine: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub custom: Vec<String>,
    #[serde(default)]
    pub events: Vec<CollectorEventConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub become_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_executable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_stderr: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_config() {
        let json = r#"{"engine": "perf_stat", "name": "stat1", "custom": [], "events": []}"#;
        let config: CollectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.engine, "perf_stat");
        assert_eq!(config.name, "stat1");
        assert!(config.events.is_empty());
        assert!(config.ramp.is_none());
    }

    #[test]
    fn deserializes_full_config() {
        let json = r#"{
            "engine": "perf_stat",
            "name": "stat1",
            "custom": ["--no-buffering"],
            "events": [
                {"cgroup": "cg1", "name": "cpu-cycles"},
                {"name": "page-faults"}
            ],
            "ramp": 2,
            "interval": 1,
            "become_cmd": "sudo"
        }"#;
        let config: CollectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.events.len(), 2);
        assert_eq!(config.events[0].cgroup.as_deref(), Some("cg1"));
        assert!(config.events[1].cgroup.is_none());
        assert_eq!(config.ramp, Some(2));
        assert_eq!(config.become_cmd.as_deref(), Some("sudo"));
    }
}
