//! Monitor configuration
//!
//! Parsed from a small TOML subset so it works without an allocator:
//!
//! ```toml
//! [monitor]
//! echo_lines = true       # print each frame line before its block
//! report_declines = false # say so when an interpreter refuses a payload
//! ```
//!
//! Supported: `[section]` headers, `key = true|false` pairs, `#` comments
//! (whole-line and trailing). Anything else is rejected.

/// Output options for the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    /// Print the raw frame line before the decoded block
    pub echo_lines: bool,
    /// Print a line when an interpreter declines a payload
    pub report_declines: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            echo_lines: true,
            report_declines: false,
        }
    }
}

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Unknown key, or a line that is not `key = value`
    InvalidKey,
    /// Value is not a boolean
    InvalidValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Monitor,
}

/// Parse configuration text, starting from [`MonitorConfig::default`]
pub fn parse_config(input: &str) -> Result<MonitorConfig, ParseError> {
    let mut config = MonitorConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidKey)?;
        match (section, key) {
            (Section::Monitor, "echo_lines") => config.echo_lines = parse_bool(value)?,
            (Section::Monitor, "report_declines") => config.report_declines = parse_bool(value)?,
            _ => return Err(ParseError::InvalidKey),
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "monitor" => Ok(Section::Monitor),
        _ => Err(ParseError::InvalidSection),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}
