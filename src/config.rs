use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MediTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Default interval between background reconciliation sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Get the application data directory
/// ~/MediTrack/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MediTrack")
}

/// Database file path. Overridable via `MEDITRACK_DB`.
pub fn db_path() -> PathBuf {
    std::env::var("MEDITRACK_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_data_dir().join("meditrack.db"))
}

/// Bind address for the HTTP server. Overridable via `MEDITRACK_ADDR`.
pub fn bind_addr() -> SocketAddr {
    std::env::var("MEDITRACK_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            DEFAULT_BIND_ADDR
                .parse()
                .expect("default bind address is valid")
        })
}

/// Background sweep interval. Overridable via `MEDITRACK_SWEEP_SECS`.
pub fn sweep_interval_secs() -> u64 {
    std::env::var("MEDITRACK_SWEEP_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("MediTrack"));
    }

    #[test]
    fn default_bind_addr_parses() {
        let addr: SocketAddr = DEFAULT_BIND_ADDR.parse().unwrap();
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn app_name_is_meditrack() {
        assert_eq!(APP_NAME, "MediTrack");
    }
}
