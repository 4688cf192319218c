use log::{debug, error, info, warn};

/// Initialize the logger
pub fn init_logger() {
    env_logger::init();
}

/// Log an informational message
pub fn log_info(message: &str) {
    info!("{}", message);
}

/// Log a debug message
pub fn log_debug(message: &str) {
    debug!("{}", message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    warn!("{}", message);
}

/// Log an error message
pub fn log_error(message: &str) {
    error!("{}", message);
}

/// Log connection details for the host chain node, without credentials
pub fn log_node_connection_details(host: &str, port: &str, username: &str, network: &str) {
    info!(
        "Node connection details for {}: http://{}@{}:{}",
        network, username, host, port
    );
}

/// Log where the engine snapshot is kept
pub fn log_state_store_details(path: &str) {
    info!("State snapshot file: {}", path);
}
