//! Field providers: where the synchronizer gets values it does not already have.
use chrono::NaiveDate;
use dialoguer::{Input, Password};

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub trait FieldProvider: Send + Sync {
    /// Ask for a string. An empty answer keeps `default`; `required` fields
    /// never come back blank.
    fn ask_string(&self, label: &str, default: &str, required: bool) -> Result<String>;

    /// Ask for a value that must not be echoed.
    fn ask_secret(&self, label: &str, required: bool) -> Result<String>;

    fn ask_date(&self, label: &str, default: NaiveDate) -> Result<NaiveDate>;

    fn ask_csv(&self, label: &str, default: &[String]) -> Result<Vec<String>>;

    /// Whether a failed value can be asked for again.
    fn interactive(&self) -> bool;
}

/// Prompts an operator on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn label(label: &str, required: bool) -> String {
        if required {
            format!("{label} *")
        } else {
            label.to_string()
        }
    }
}

impl FieldProvider for TerminalPrompter {
    fn ask_string(&self, label: &str, default: &str, required: bool) -> Result<String> {
        loop {
            let mut input = Input::<String>::new()
                .with_prompt(Self::label(label, required))
                .allow_empty(true);
            if !default.is_empty() {
                input = input.default(default.to_string());
            }
            let value = input
                .interact_text()
                .map_err(|e| Error::Prompt(e.to_string()))?;
            let value = if value.is_empty() {
                default.to_string()
            } else {
                value
            };
            if required && value.trim().is_empty() {
                continue;
            }
            return Ok(value);
        }
    }

    fn ask_secret(&self, label: &str, required: bool) -> Result<String> {
        Password::new()
            .with_prompt(Self::label(label, required))
            .allow_empty_password(!required)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn ask_date(&self, label: &str, default: NaiveDate) -> Result<NaiveDate> {
        let default_text = default.format(DATE_FORMAT).to_string();
        loop {
            let value: String = Input::new()
                .with_prompt(label)
                .default(default_text.clone())
                .interact_text()
                .map_err(|e| Error::Prompt(e.to_string()))?;
            match parse_date(&value) {
                Some(date) => return Ok(date),
                None => eprintln!("Invalid date, please try again (mm/dd/yyyy)"),
            }
        }
    }

    fn ask_csv(&self, label: &str, default: &[String]) -> Result<Vec<String>> {
        let value = self.ask_string(label, &default.join(", "), false)?;
        Ok(split_csv(&value))
    }

    fn interactive(&self) -> bool {
        true
    }
}

/// Keeps whatever the article already carries and refuses to invent
/// required values.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl FieldProvider for NonInteractive {
    fn ask_string(&self, label: &str, default: &str, required: bool) -> Result<String> {
        if required && default.trim().is_empty() {
            return Err(Error::MissingField(label.to_string()));
        }
        Ok(default.to_string())
    }

    fn ask_secret(&self, label: &str, required: bool) -> Result<String> {
        self.ask_string(label, "", required)
    }

    fn ask_date(&self, _label: &str, default: NaiveDate) -> Result<NaiveDate> {
        Ok(default)
    }

    fn ask_csv(&self, _label: &str, default: &[String]) -> Result<Vec<String>> {
        Ok(default.to_vec())
    }

    fn interactive(&self) -> bool {
        false
    }
}

/// Use the id given on the command line, or ask for one.
pub fn given_or_ask(fields: &dyn FieldProvider, given: Option<&str>, label: &str) -> Result<String> {
    match given {
        Some(id) => Ok(id.to_string()),
        None => fields.ask_string(label, "", true),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Split a comma separated answer into trimmed, non-empty labels.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
