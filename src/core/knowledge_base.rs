//! Static, read-only catalog of the well-known services that live on the
//! common ports, used to label open ports in the user interface.

use std::fmt;

/// Broad grouping of a service, used for colouring and prefixes in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceCategory {
    /// Interactive access to the machine (SSH, Telnet, RDP).
    RemoteAccess,
    /// Moving files around (FTP).
    FileTransfer,
    /// Mail delivery (SMTP).
    Mail,
    /// HTTP and HTTPS, including alternate ports.
    Web,
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceCategory::RemoteAccess => write!(f, "Remote Access"),
            ServiceCategory::FileTransfer => write!(f, "File Transfer"),
            ServiceCategory::Mail => write!(f, "Mail"),
            ServiceCategory::Web => write!(f, "Web"),
        }
    }
}

/// What usually listens on a port and why an exposed one matters.
pub struct ServiceDetail {
    pub port: u16,
    /// Short service name (e.g. "SSH").
    pub service: &'static str,
    pub category: ServiceCategory,
    /// Whether the protocol sends credentials or data in clear text.
    pub cleartext: bool,
    pub description: &'static str,
}

static SERVICES: &[ServiceDetail] = &[
    ServiceDetail {
        port: 21,
        service: "FTP",
        category: ServiceCategory::FileTransfer,
        cleartext: true,
        description: "File Transfer Protocol. Credentials and data travel unencrypted; anonymous login is a frequent misconfiguration.",
    },
    ServiceDetail {
        port: 22,
        service: "SSH",
        category: ServiceCategory::RemoteAccess,
        cleartext: false,
        description: "Secure Shell. Encrypted remote login; exposed instances attract constant password-guessing.",
    },
    ServiceDetail {
        port: 23,
        service: "Telnet",
        category: ServiceCategory::RemoteAccess,
        cleartext: true,
        description: "Unencrypted remote terminal. Should not be reachable from the internet.",
    },
    ServiceDetail {
        port: 25,
        service: "SMTP",
        category: ServiceCategory::Mail,
        cleartext: true,
        description: "Mail transfer. Expected on mail exchangers; elsewhere check it is not an open relay.",
    },
    ServiceDetail {
        port: 80,
        service: "HTTP",
        category: ServiceCategory::Web,
        cleartext: true,
        description: "Plain web server. Normally only redirects to HTTPS.",
    },
    ServiceDetail {
        port: 443,
        service: "HTTPS",
        category: ServiceCategory::Web,
        cleartext: false,
        description: "Web server over TLS.",
    },
    ServiceDetail {
        port: 3389,
        service: "RDP",
        category: ServiceCategory::RemoteAccess,
        cleartext: false,
        description: "Windows Remote Desktop. A common entry point for ransomware when exposed publicly.",
    },
    ServiceDetail {
        port: 8080,
        service: "HTTP-Alt",
        category: ServiceCategory::Web,
        cleartext: true,
        description: "Alternate HTTP port, often a proxy, admin panel or development server.",
    },
];

/// Looks up the catalog entry for `port`, if it is one of the known ports.
pub fn get_service_detail(port: u16) -> Option<&'static ServiceDetail> {
    SERVICES.iter().find(|s| s.port == port)
}

/// Short label for a port: the service name when known, `"unknown"` otherwise.
pub fn service_name(port: u16) -> &'static str {
    get_service_detail(port).map_or("unknown", |s| s.service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::COMMON_PORTS;

    #[test]
    fn every_common_port_is_catalogued() {
        for port in COMMON_PORTS {
            assert!(get_service_detail(*port).is_some(), "port {port} missing");
        }
    }

    #[test]
    fn unknown_port_has_no_detail() {
        assert!(get_service_detail(6379).is_none());
        assert_eq!(service_name(6379), "unknown");
        assert_eq!(service_name(22), "SSH");
    }
}
