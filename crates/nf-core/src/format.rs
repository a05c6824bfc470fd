//! Display formatting shared by the evaluator and the CLI.

/// Format a remote address the way the request list shows it.
///
/// IPv6 addresses are bracketed when a port follows; a zero port is omitted.
pub fn format_ip_and_port(address: &str, port: Option<u16>) -> String {
    match port {
        Some(port) if port != 0 => {
            if address.contains(':') {
                format!("[{}]:{}", address, port)
            } else {
                format!("{}:{}", address, port)
            }
        }
        _ => address.to_string(),
    }
}
