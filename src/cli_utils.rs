//! Terminal helpers shared by the nutriplan binaries: program termination
//! with formatted errors, and JSON/YAML output of API payloads.

use std::process;
use std::str::FromStr;

/// Output format for get/list commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON (the default).
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format '{}'; use json or yaml", other)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Exits the program with an error message.
pub fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exits the program with an error message and usage information.
pub fn exit_with_usage_error(message: &str, usage: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", usage);
    process::exit(1);
}

/// Prints a payload in the requested format, or exits on a formatting error.
pub fn print_formatted_or_exit<T>(value: &T, format: OutputFormat, context: &str)
where
    T: serde::Serialize,
{
    let rendered = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| e.to_string())
        }
        OutputFormat::Yaml => serde_yml::to_string(value).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => exit_with_error(&format!("Failed to format {} output: {}", context, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
