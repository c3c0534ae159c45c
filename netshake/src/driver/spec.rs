//! Serializable dialect tables.

use serde::{Deserialize, Serialize};

use super::definition::Driver;
use super::elevation::Elevation;
use crate::error::DriverError;

/// A dialect described as plain data, e.g. loaded from JSON.
///
/// ```
/// use netshake::driver::DriverSpec;
///
/// let spec: DriverSpec = serde_json::from_str(r#"{
///     "name": "acme",
///     "password_prompt": ["[\\r\\n]Password: ?$"],
///     "command_prompt": ["[\\r\\n]acme[>#] ?$"],
///     "head_signatures": [{ "pattern": "ACME Router OS", "score": 90 }]
/// }"#).unwrap();
/// let driver = spec.compile().unwrap();
/// assert_eq!(driver.score(b"Welcome to ACME Router OS"), 90);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSpec {
    pub name: String,
    pub user_prompt: Vec<String>,
    pub password_prompt: Vec<String>,
    pub command_prompt: Vec<String>,
    pub login_error: Vec<String>,
    pub head_signatures: Vec<HeadSignatureSpec>,
    pub init_commands: Vec<String>,
    pub elevation: Option<ElevationSpec>,
    pub error_patterns: Vec<String>,
    pub prepare_mandatory: bool,
    pub line_terminator: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadSignatureSpec {
    pub pattern: String,
    pub score: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationSpec {
    pub command: String,
    pub password_prompt: Vec<String>,
    pub elevated_prompt: Vec<String>,
}

fn refs(patterns: &[String]) -> Vec<&str> {
    patterns.iter().map(String::as_str).collect()
}

impl DriverSpec {
    /// Compile into a validated [`Driver`].
    pub fn compile(&self) -> Result<Driver, DriverError> {
        let mut driver = Driver::new(self.name.clone())
            .with_user_prompt(&refs(&self.user_prompt))?
            .with_password_prompt(&refs(&self.password_prompt))?
            .with_command_prompt(&refs(&self.command_prompt))?
            .with_login_error(&refs(&self.login_error))?
            .with_error_patterns(&refs(&self.error_patterns))?
            .with_prepare_mandatory(self.prepare_mandatory);

        for signature in &self.head_signatures {
            driver = driver.with_head_signature(&signature.pattern, signature.score)?;
        }
        for command in &self.init_commands {
            driver = driver.with_init_command(command.clone());
        }
        if let Some(terminator) = &self.line_terminator {
            driver = driver.with_line_terminator(terminator.clone());
        }
        if let Some(spec) = &self.elevation {
            driver = driver.with_elevation(spec.compile(&self.name)?);
        }

        driver.validate()?;
        Ok(driver)
    }
}

impl ElevationSpec {
    fn compile(&self, driver: &str) -> Result<Elevation, DriverError> {
        if self.command.is_empty() {
            return Err(DriverError::InvalidDefinition {
                message: format!("driver '{driver}' has an elevation without a command"),
            });
        }
        let mut elevation = Elevation::new(self.command.clone())
            .with_elevated_prompt(&refs(&self.elevated_prompt))
            .map_err(|e| DriverError::invalid_pattern(driver, "elevated", e))?;
        if !self.password_prompt.is_empty() {
            elevation = elevation
                .with_password_prompt(&refs(&self.password_prompt))
                .map_err(|e| DriverError::invalid_pattern(driver, "elevation password", e))?;
        }
        Ok(elevation)
    }
}
