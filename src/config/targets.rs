use crate::domain::model::Target;
use crate::utils::error::{ProbeError, Result};
use std::net::IpAddr;
use std::path::Path;

const MAX_HOSTNAME_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Reads a target list: one `<ip> <hostname>` pair per line, `#` starts a comment.
pub fn load_targets<P: AsRef<Path>>(path: P) -> Result<Vec<Target>> {
    let content = std::fs::read_to_string(path)?;
    parse_targets(&content)
}

pub fn parse_targets(content: &str) -> Result<Vec<Target>> {
    let mut targets = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let target = parse_target(line).map_err(|e| ProbeError::ValidationError {
            message: format!("line {}: {}", number + 1, e),
        })?;
        targets.push(target);
    }

    Ok(targets)
}

/// Parses `ip hostname` or `ip,hostname`.
pub fn parse_target(entry: &str) -> Result<Target> {
    let mut parts = entry
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());

    let (ip, hostname) = match (parts.next(), parts.next(), parts.next()) {
        (Some(ip), Some(hostname), None) => (ip, hostname),
        _ => {
            return Err(ProbeError::ValidationError {
                message: format!("expected '<ip> <hostname>', got '{}'", entry),
            })
        }
    };

    let ip: IpAddr = ip.parse().map_err(|_| ProbeError::ValidationError {
        message: format!("'{}' is not an IP address", ip),
    })?;

    let hostname = hostname.trim_end_matches('.').to_lowercase();
    validate_hostname(&hostname)?;

    Ok(Target::new(ip, hostname))
}

pub fn validate_hostname(hostname: &str) -> Result<()> {
    let invalid = |reason: &str| ProbeError::ValidationError {
        message: format!("'{}' is not a valid hostname: {}", hostname, reason),
    };

    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LENGTH {
        return Err(invalid("length must be between 1 and 253"));
    }

    for label in hostname.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Err(invalid("each label must be 1 to 63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("labels cannot start or end with '-'"));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("only letters, digits, '-' and '_' are allowed"));
        }
    }

    Ok(())
}
