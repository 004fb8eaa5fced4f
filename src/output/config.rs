use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    pub fn from_env() -> Self {
        Self::parse(
            env::var("SPANWIN_OUTPUT_FORMAT").ok().as_deref(),
            env::var("SPANWIN_OUTPUT_PRETTY").ok().as_deref(),
        )
    }

    fn parse(format: Option<&str>, pretty: Option<&str>) -> Self {
        let format = match format {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };
        let pretty = match pretty {
            Some(v) if v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") => true,
            _ => false,
        };
        OutputConfig { format, pretty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_compact_text() {
        assert_eq!(OutputConfig::parse(None, None), OutputConfig { format: OutputFormat::Text, pretty: false });
    }

    #[test]
    fn reads_format_and_pretty_flags() {
        let cfg = OutputConfig::parse(Some("json"), Some("TRUE"));
        assert_eq!(cfg.format, OutputFormat::Json);
        assert!(cfg.pretty);
        assert!(!OutputConfig::parse(Some("json"), Some("0")).pretty);
    }
}
