//! Common test utilities for integration tests.
//!
//! Provides `TestNamespace` for isolated network namespace testing
//! and helper macros for conditional test execution.

use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

use nfvtest::{Error, Host, Result};

/// Global counter for unique namespace names.
static NAMESPACE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a namespace name unique to this test, short enough for a safe name.
pub fn unique_ns_name(prefix: &str) -> String {
    let id = NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 10_000;
    format!("{}{}-{}", prefix, pid, id)
}

/// A test network namespace with automatic cleanup.
///
/// The namespace is deleted when the struct is dropped.
///
/// ```ignore
/// let ns = TestNamespace::new("lnk")?;
/// let interfaces = InterfaceService::new(&ns.host());
/// ```
pub struct TestNamespace {
    name: String,
}

impl TestNamespace {
    /// Create a namespace named after `prefix`, at most 5 characters.
    pub fn new(prefix: &str) -> Result<Self> {
        let name = unique_ns_name(prefix);
        run(&["ip", "netns", "add", &name])?;
        run(&["ip", "netns", "set", &name, "auto"])?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A host running commands inside this namespace.
    pub fn host(&self) -> Host {
        Host::system().in_namespace(&self.name)
    }

    /// Run `ip` in the namespace and return its output.
    pub fn ip(&self, args: &[&str]) -> Result<String> {
        let mut argv = vec!["ip", "netns", "exec", self.name.as_str(), "ip"];
        argv.extend_from_slice(args);
        run(&argv)
    }

    /// Add a dummy interface.
    pub fn add_dummy(&self, name: &str) -> Result<()> {
        self.ip(&["link", "add", name, "type", "dummy"]).map(|_| ())
    }

    /// Add a veth pair with `local_name` here and `remote_name` in `other`.
    pub fn connect_to(&self, other: &TestNamespace, local_name: &str, remote_name: &str) -> Result<()> {
        self.ip(&["link", "add", local_name, "type", "veth", "peer", "name", remote_name])?;
        self.ip(&["link", "set", remote_name, "netns", other.name()])?;
        Ok(())
    }
}

impl Drop for TestNamespace {
    fn drop(&mut self) {
        let _ = Command::new("ip").args(["netns", "del", &self.name]).status();
    }
}

fn run(argv: &[&str]) -> Result<String> {
    let output = Command::new(argv[0]).args(&argv[1..]).output()?;
    if !output.status.success() {
        return Err(Error::command_failed(
            argv,
            String::from_utf8_lossy(&output.stderr),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ns_name() {
        let name1 = unique_ns_name("lnk");
        let name2 = unique_ns_name("lnk");
        assert_ne!(name1, name2);
        assert!(name1.starts_with("lnk"));
        assert!(nfvtest::types::SafeName::new(name1).is_ok());
    }
}
