use std::io::Write;

use log::{Level, LevelFilter, SetLoggerError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace | Level::Debug => Self::Debug,
            Level::Info => Self::Info,
            Level::Warn => Self::Warning,
            Level::Error => Self::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderStyles {
    templates: [String; 5],
}

impl Default for HeaderStyles {
    fn default() -> Self {
        Self {
            templates: [
                "--- DEBUG: {} ---".to_string(),
                "--- INFO: {} ---".to_string(),
                "--! WARNING: {} ---".to_string(),
                "-!! ERROR: {} ---".to_string(),
                "!!! CRITICAL: {} ---".to_string(),
            ],
        }
    }
}

impl HeaderStyles {
    pub fn from_single(template: &str) -> Self {
        Self {
            templates: std::array::from_fn(|_| template.to_string()),
        }
    }

    pub fn set_list(&mut self, templates: Vec<String>) -> bool {
        match <[String; 5]>::try_from(templates) {
            Ok(templates) => {
                self.templates = templates;
                true
            }
            Err(rejected) => {
                log::warn!(
                    target: "logging",
                    "expected 5 header templates, got {}; keeping the current ones",
                    rejected.len()
                );
                false
            }
        }
    }

    pub fn set_single(&mut self, template: &str) {
        *self = Self::from_single(template);
    }

    pub fn template(&self, severity: Severity) -> &str {
        &self.templates[severity as usize]
    }

    pub fn render(&self, severity: Severity, message: &str) -> String {
        let template = self.template(severity);
        if template.contains("{}") {
            template.replacen("{}", message, 1)
        } else {
            format!("{template} {message}")
        }
    }
}

pub fn init(level: LevelFilter, styles: HeaderStyles) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(move |buf, record| {
            let message = record.args().to_string();
            writeln!(buf, "{}", styles.render(record.level().into(), &message))
        })
        .try_init()
}
