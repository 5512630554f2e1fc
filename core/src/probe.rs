use crate::error::{HostError, InsertError};
use crate::host::{HostIdentity, HostSession};
use crate::operation_log::{Operation, OperationLog};

/// What the host offers, established before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCapabilities {
    pub identity: HostIdentity,
    /// The presentation automation namespace and its run entry point exist.
    pub automation: bool,
}

/// Checks the integration layer and the automation API. Logs exactly one
/// `OfficeAPICheck` entry.
pub fn probe(host: &dyn HostSession, log: &OperationLog) -> Result<HostCapabilities, InsertError> {
    let Some(identity) = host.identity() else {
        let err = HostError::IntegrationMissing;
        log.fail(Operation::HostCheck, None, &err, None);
        return Err(InsertError::HostUnavailable(err));
    };

    let automation = host.supports_automation();
    log.ok(
        Operation::HostCheck,
        None,
        Some(serde_json::json!({
            "host": identity.name,
            "automation": automation,
        })),
    );
    Ok(HostCapabilities {
        identity,
        automation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn test_probe_records_host() {
        let log = OperationLog::new();
        let caps = probe(&MemoryHost::new(), &log).unwrap();
        assert!(caps.automation);
        assert_eq!(caps.identity.name, "PowerPoint");

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
        assert_eq!(entries[0].details.as_ref().unwrap()["host"], "PowerPoint");
    }

    #[test]
    fn test_probe_without_automation_still_succeeds() {
        let log = OperationLog::new();
        let caps = probe(&MemoryHost::new().without_automation(), &log).unwrap();
        assert!(!caps.automation);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_probe_detached_host() {
        let log = OperationLog::new();
        let err = probe(&MemoryHost::detached(), &log).unwrap_err();
        assert!(matches!(err, InsertError::HostUnavailable(HostError::IntegrationMissing)));
        assert_eq!(log.trail(), "OfficeAPICheck:FAIL");
    }
}
