//! `config` command implementation.

use std::io::Write;

use ocm_config::CredentialRecord;
use ocm_config::gateway::{self, UrlSource};
use ocm_config::record::SETTINGS;
use serde::Serialize;
use tracing::debug;

use crate::cli::ConfigCommands;
use crate::context::Context;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, TableDisplay, mask};

/// Settings whose values are masked when listing.
const SECRET_SETTINGS: &[&str] = &["access_token", "refresh_token", "client_secret", "password"];

/// Handler for config subcommands.
#[derive(Debug, Default)]
pub struct ConfigCommand;

impl ConfigCommand {
    /// Creates a new config command handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Executes the config subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting is unknown, the value is invalid, or
    /// the record can't be saved.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        ctx: &mut Context,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::Get { name: Some(name) } => {
                let record = ctx.record().cloned().unwrap_or_default();
                let setting = Setting {
                    name: name.clone(),
                    value: record.setting(name)?,
                };
                format.write(out, &setting)
            }
            ConfigCommands::Get { name: None } => {
                let record = ctx.record().cloned().unwrap_or_default();
                let settings = SETTINGS
                    .iter()
                    .map(|name| {
                        let value = record.setting(name)?;
                        let value = if SECRET_SETTINGS.contains(name) { mask(&value) } else { value };
                        Ok(Setting {
                            name: (*name).to_string(),
                            value,
                        })
                    })
                    .collect::<Result<Vec<_>, CliError>>()?;
                format.write(out, &SettingList { settings })
            }
            ConfigCommands::Set { name, value } => {
                if matches!(name.as_str(), "url" | "token_url") && !value.is_empty() {
                    gateway::validate(value, UrlSource::Config)?;
                }
                ctx.record_mut().set_setting(name, value)?;
                ctx.save()?;
                debug!(setting = %name, "changed setting");
                format.write(out, &Message::success(format!("Set '{name}'")))
            }
            ConfigCommands::Delete { name } => {
                let Some(mut record) = ctx.record().cloned() else {
                    // Unknown names are still rejected.
                    CredentialRecord::default().setting(name)?;
                    return format.write(out, &Message::info(format!("'{name}' isn't set")));
                };
                record.delete_setting(name)?;
                ctx.replace(record);
                ctx.save()?;
                format.write(out, &Message::success(format!("Deleted '{name}'")))
            }
            ConfigCommands::Path => {
                let location = ConfigLocation {
                    location: ctx.store().location(),
                };
                format.write(out, &location)
            }
        }
    }
}

// Output types

/// A single setting.
#[derive(Debug, Clone, Serialize)]
pub struct Setting {
    /// Setting name.
    pub name: String,
    /// Setting value as text.
    pub value: String,
}

impl TableDisplay for Setting {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.value)?;
        Ok(())
    }
}

/// Every setting.
#[derive(Debug, Clone, Serialize)]
pub struct SettingList {
    /// Settings in file order.
    pub settings: Vec<Setting>,
}

impl TableDisplay for SettingList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Settings")?;
        writeln!(writer, "══════════════════════════════════")?;
        for setting in &self.settings {
            writeln!(writer, "{:<16}{}", format!("{}:", setting.name), setting.value)?;
        }
        Ok(())
    }
}

/// Where the settings are stored.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigLocation {
    /// File path, or `keyring:<backend>`.
    pub location: String,
}

impl TableDisplay for ConfigLocation {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.location)?;
        Ok(())
    }
}
