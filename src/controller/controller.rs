use std::fmt;

/// A cgroup limit value. Most limits are numeric (`weight=100`) but some
/// accept human-readable sizes (`limit_in_bytes=2G`), so both shapes are
/// kept instead of coercing everything to a number.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for LimitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitValue::Int(v) => write!(f, "{v}"),
            LimitValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for LimitValue {
    fn from(v: i64) -> Self {
        LimitValue::Int(v)
    }
}

impl From<&str> for LimitValue {
    fn from(v: &str) -> Self {
        LimitValue::Str(v.to_string())
    }
}

impl From<String> for LimitValue {
    fn from(v: String) -> Self {
        LimitValue::Str(v)
    }
}

/// A single typed cgroup controller: a name matching one of the v2
/// controller files, a set of key→value limits, and the stat files it
/// exposes for periodic sampling (§3, §4.6).
///
/// Limits are kept as an ordered association list rather than a
/// `HashMap` so `ControllerGroup::builders` emits `cgset` commands in the
/// order limits were added, matching the deterministic command sequence
/// the scenarios in the spec assert on.
#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    name: String,
    limits: Vec<(String, LimitValue)>,
    stat_files: Vec<String>,
}

impl Controller {
    pub const TYPE_CPU: &'static str = "cpu";
    pub const TYPE_CPUSET: &'static str = "cpuset";
    pub const TYPE_IO: &'static str = "io";
    pub const TYPE_MEMORY: &'static str = "memory";
    pub const TYPE_HUGETLB: &'static str = "hugetlb";
    pub const TYPE_PIDS: &'static str = "pids";
    pub const TYPE_RDMA: &'static str = "rdma";
    pub const TYPE_MISC: &'static str = "misc";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limits: Vec::new(),
            stat_files: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> &[(String, LimitValue)] {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: Vec<(String, LimitValue)>) {
        self.limits = limits;
    }

    pub fn add_limit(&mut self, key: impl Into<String>, value: impl Into<LimitValue>) {
        self.limits.push((key.into(), value.into()));
    }

    pub fn stat_files(&self) -> &[String] {
        &self.stat_files
    }

    pub fn set_stat_files(&mut self, files: Vec<String>) {
        self.stat_files = files;
    }

    pub fn add_stat_file(&mut self, file: impl Into<String>) {
        self.stat_files.push(file.into());
    }

    pub fn cpuset() -> Self {
        Self::new(Self::TYPE_CPUSET)
    }

    pub fn cpu() -> Self {
        let mut c = Self::new(Self::TYPE_CPU);
        c.set_stat_files(vec!["cpu.stat".into()]);
        c
    }

    pub fn io() -> Self {
        let mut c = Self::new(Self::TYPE_IO);
        c.set_stat_files(vec!["io.stat".into()]);
        c
    }

    pub fn memory() -> Self {
        let mut c = Self::new(Self::TYPE_MEMORY);
        c.set_stat_files(vec!["memory.stat".into(), "memory.numa_stat".into()]);
        c
    }

    pub fn hugetlb() -> Self {
        let mut c = Self::new(Self::TYPE_HUGETLB);
        c.set_stat_files(vec![
            "hugetlb.1GB.numa_stat".into(),
            "hugetlb.2MB.numa_stat".into(),
        ]);
        c
    }

    pub fn pids() -> Self {
        Self::new(Self::TYPE_PIDS)
    }

    pub fn rdma() -> Self {
        Self::new(Self::TYPE_RDMA)
    }

    pub fn misc() -> Self {
        Self::new(Self::TYPE_MISC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init() {
        let controller = Controller::new("test");
        assert_eq!(controller.name(), "test");
        assert!(controller.limits().is_empty());
        assert!(controller.stat_files().is_empty());
    }

    #[test]
    fn add_limit() {
        let mut controller = Controller::new("test");
        controller.add_limit("limit1", 100i64);
        controller.add_limit("limit2", "value");
        assert_eq!(
            controller.limits(),
            [
                ("limit1".to_string(), LimitValue::Int(100)),
                ("limit2".to_string(), LimitValue::Str("value".to_string())),
            ]
        );
    }

    #[test]
    fn add_stat_file() {
        let mut controller = Controller::new("test");
        controller.add_stat_file("stat1.file");
        controller.add_stat_file("stat2.file");
        assert_eq!(controller.stat_files(), ["stat1.file".to_string(), "stat2.file".to_string()]);
    }

    #[test]
    fn subclass_defaults() {
        assert_eq!(Controller::cpuset().name(), Controller::TYPE_CPUSET);

        let cpu = Controller::cpu();
        assert_eq!(cpu.name(), Controller::TYPE_CPU);
        assert!(cpu.stat_files().iter().any(|f| f == "cpu.stat"));

        let io = Controller::io();
        assert_eq!(io.name(), Controller::TYPE_IO);
        assert!(io.stat_files().iter().any(|f| f == "io.stat"));

        let memory = Controller::memory();
        assert_eq!(memory.name(), Controller::TYPE_MEMORY);
        assert!(memory.stat_files().iter().any(|f| f == "memory.stat"));
        assert!(memory.stat_files().iter().any(|f| f == "memory.numa_stat"));

        let hugetlb = Controller::hugetlb();
        assert_eq!(hugetlb.name(), Controller::TYPE_HUGETLB);
        assert!(hugetlb.stat_files().iter().any(|f| f == "hugetlb.1GB.numa_stat"));
        assert!(hugetlb.stat_files().iter().any(|f| f == "hugetlb.2MB.numa_stat"));

        assert_eq!(Controller::pids().name(), Controller::TYPE_PIDS);
        assert_eq!(Controller::rdma().name(), Controller::TYPE_RDMA);
        assert_eq!(Controller::misc().name(), Controller::TYPE_MISC);
    }
}
