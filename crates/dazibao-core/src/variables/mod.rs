//! Built-in variables
//!
//! A command string of the form `%name` is not run in a shell; it is resolved
//! here to a value read from the clock or the OS. Resolution never fails:
//! unknown names map to [`UNKNOWN_VARIABLE`] and OS query failures are turned
//! into inline `Error: ...` text so one bad variable cannot abort a tick.

use std::net::Ipv4Addr;

use chrono::{DateTime, Local};
use tracing::debug;

/// Marker prefix that distinguishes a variable reference from a shell command.
pub const SENTINEL: char = '%';

/// Value returned for identifiers that are not built-in variables.
pub const UNKNOWN_VARIABLE: &str = "Unknown variable";

/// Value returned by `%ip_address` when the host has no usable IPv4 address.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Hostname,
    Time,
    Date,
    Year,
    Month,
    Day,
    DayName,
    Hours,
    Minutes,
    Seconds,
    Username,
    IpAddress,
    AppName,
    AppVersion,
}

impl Variable {
    pub const ALL: [Variable; 14] = [
        Variable::Hostname,
        Variable::Time,
        Variable::Date,
        Variable::Year,
        Variable::Month,
        Variable::Day,
        Variable::DayName,
        Variable::Hours,
        Variable::Minutes,
        Variable::Seconds,
        Variable::Username,
        Variable::IpAddress,
        Variable::AppName,
        Variable::AppVersion,
    ];

    /// Look up a variable by identifier, with or without the leading `%`.
    pub fn parse(name: &str) -> Option<Self> {
        let ident = name.strip_prefix(SENTINEL).unwrap_or(name);
        Self::ALL.into_iter().find(|v| v.name() == ident)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Hostname => "hostname",
            Variable::Time => "time",
            Variable::Date => "date",
            Variable::Year => "year",
            Variable::Month => "month",
            Variable::Day => "day",
            Variable::DayName => "dayname",
            Variable::Hours => "hours",
            Variable::Minutes => "minutes",
            Variable::Seconds => "seconds",
            Variable::Username => "username",
            Variable::IpAddress => "ip_address",
            Variable::AppName => "app_name",
            Variable::AppVersion => "app_version",
        }
    }

    /// Compute the value of this variable. Clock variables read `now`.
    pub fn value_at(&self, now: DateTime<Local>) -> String {
        match self {
            Variable::Hostname => hostname(),
            Variable::Time => now.format("%H:%M:%S").to_string(),
            Variable::Date => now.format("%Y-%m-%d").to_string(),
            Variable::Year => now.format("%Y").to_string(),
            Variable::Month => now.format("%m").to_string(),
            Variable::Day => now.format("%d").to_string(),
            Variable::DayName => now.format("%A").to_string(),
            Variable::Hours => now.format("%H").to_string(),
            Variable::Minutes => now.format("%M").to_string(),
            Variable::Seconds => now.format("%S").to_string(),
            Variable::Username => username(),
            Variable::IpAddress => ip_address(),
            Variable::AppName => crate::APP_NAME.to_string(),
            Variable::AppVersion => crate::APP_VERSION.to_string(),
        }
    }
}

/// Resolve a variable reference to its current value.
///
/// Accepts `"%date"` as well as `"date"`. Never fails.
pub fn resolve(name: &str) -> String {
    match Variable::parse(name) {
        Some(variable) => variable.value_at(Local::now()),
        None => {
            debug!(event = "core.variables.unknown", name = name);
            UNKNOWN_VARIABLE.to_string()
        }
    }
}

fn hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => format!("Error: {}", e),
    }
}

fn username() -> String {
    match nix::unistd::User::from_uid(nix::unistd::getuid()) {
        Ok(Some(user)) => user.name,
        Ok(None) => "Error: current user has no passwd entry".to_string(),
        Err(e) => format!("Error: {}", e),
    }
}

fn ip_address() -> String {
    let addrs = match nix::ifaddrs::getifaddrs() {
        Ok(addrs) => addrs,
        Err(e) => return format!("Error: {}", e),
    };

    addrs
        .filter_map(|ifaddr| {
            let sin = *ifaddr.address.as_ref()?.as_sockaddr_in()?;
            Some(Ipv4Addr::from(sin.ip()))
        })
        .find(|ip| !ip.is_loopback())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 3)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_parse_with_and_without_sentinel() {
        assert_eq!(Variable::parse("%date"), Some(Variable::Date));
        assert_eq!(Variable::parse("date"), Some(Variable::Date));
        assert_eq!(Variable::parse("%ip_address"), Some(Variable::IpAddress));
        assert_eq!(Variable::parse("%nope"), None);
        assert_eq!(Variable::parse("%"), None);
    }

    #[test]
    fn test_every_variable_name_round_trips() {
        for variable in Variable::ALL {
            assert_eq!(Variable::parse(variable.name()), Some(variable));
        }
    }

    #[test]
    fn test_clock_formats() {
        let now = fixed_time();
        assert_eq!(Variable::Time.value_at(now), "07:05:03");
        assert_eq!(Variable::Date.value_at(now), "2024-03-09");
        assert_eq!(Variable::Year.value_at(now), "2024");
        assert_eq!(Variable::Month.value_at(now), "03");
        assert_eq!(Variable::Day.value_at(now), "09");
        assert_eq!(Variable::DayName.value_at(now), "Saturday");
        assert_eq!(Variable::Hours.value_at(now), "07");
        assert_eq!(Variable::Minutes.value_at(now), "05");
        assert_eq!(Variable::Seconds.value_at(now), "03");
    }

    #[test]
    fn test_unknown_variable_placeholder() {
        assert_eq!(resolve("%does_not_exist"), UNKNOWN_VARIABLE);
    }

    #[test]
    fn test_app_variables() {
        assert_eq!(resolve("%app_name"), "Dazibao");
        assert_eq!(resolve("%app_version"), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_os_variables_never_empty() {
        for name in ["%hostname", "%username", "%ip_address"] {
            let value = resolve(name);
            assert!(!value.is_empty(), "{} resolved to empty string", name);
            assert_ne!(value, UNKNOWN_VARIABLE);
        }
    }

    #[test]
    fn test_ip_address_is_ipv4_or_sentinel() {
        let value = resolve("%ip_address");
        if value != NOT_AVAILABLE && !value.starts_with("Error:") {
            let ip: Ipv4Addr = value.parse().expect("valid IPv4 address");
            assert!(!ip.is_loopback());
        }
    }
}
