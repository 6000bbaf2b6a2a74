use std::collections::BTreeSet;

use appreg::{ApplicationRecord, Violation};
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Printable application. The secret hash is never shown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView<'a> {
    pub id: Option<&'a str>,
    pub client_id: Option<&'a str>,
    pub client_type: Option<&'a str>,
    pub consent_type: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub has_secret: bool,
    pub permissions: &'a BTreeSet<String>,
    pub redirect_uris: &'a [String],
    pub post_logout_redirect_uris: &'a [String],
}

impl<'a> From<&'a ApplicationRecord> for ApplicationView<'a> {
    fn from(record: &'a ApplicationRecord) -> Self {
        Self {
            id: record.id(),
            client_id: record.client_id(),
            client_type: record.client_type(),
            consent_type: record.consent_type.as_deref(),
            display_name: record.display_name.as_deref(),
            has_secret: record.client_secret().is_some(),
            permissions: &record.permissions,
            redirect_uris: &record.redirect_uris,
            post_logout_redirect_uris: &record.post_logout_redirect_uris,
        }
    }
}

pub fn print_record(record: &ApplicationRecord, format: OutputFormat) {
    let view = ApplicationView::from(record);
    match format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            builder.push_record(["ID".to_string(), or_dash(view.id)]);
            builder.push_record(["Client ID".to_string(), or_dash(view.client_id)]);
            builder.push_record(["Type".to_string(), or_dash(view.client_type)]);
            builder.push_record(["Consent".to_string(), or_dash(view.consent_type)]);
            builder.push_record(["Display Name".to_string(), or_dash(view.display_name)]);
            builder.push_record(["Secret".to_string(), secret_label(view.has_secret)]);
            builder.push_record(["Permissions".to_string(), join(view.permissions.iter())]);
            builder.push_record(["Redirect URIs".to_string(), join(view.redirect_uris.iter())]);
            builder.push_record([
                "Post-logout URIs".to_string(),
                join(view.post_logout_redirect_uris.iter()),
            ]);
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
}

pub fn print_records(records: &[ApplicationRecord], total: u64, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let views: Vec<ApplicationView<'_>> = records.iter().map(Into::into).collect();
            print_json(&views);
        }
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No applications found.");
                return;
            }
            let mut builder = Builder::default();
            builder.push_record(["Client ID", "Type", "Display Name", "Secret", "Permissions"]);
            for record in records {
                builder.push_record([
                    or_dash(record.client_id()),
                    or_dash(record.client_type()),
                    or_dash(record.display_name.as_deref()),
                    secret_label(record.client_secret().is_some()),
                    record.permissions.len().to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            println!("Total: {total}");
        }
    }
}

pub fn print_violations(client_id: &str, violations: &[Violation], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
            print_json(&serde_json::json!({
                "clientId": client_id,
                "valid": violations.is_empty(),
                "violations": messages,
            }));
        }
        OutputFormat::Table => {
            if violations.is_empty() {
                print_success(&format!("{} is valid", client_id.cyan()));
                return;
            }
            print_error(&format!("{} has {} violation(s)", client_id.cyan(), violations.len()));
            for violation in violations {
                println!("  - {violation}");
            }
        }
    }
}

/// Print the outcome of a yes/no check.
pub fn print_check(passed: bool, subject: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "check": subject,
            "passed": passed,
        })),
        OutputFormat::Table if passed => print_success(subject),
        OutputFormat::Table => print_error(subject),
    }
}

pub fn print_generated_secret(secret: &str) {
    eprintln!(
        "{} {}",
        "Generated client secret (shown once):".yellow(),
        secret.bold()
    );
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => print_error(&format!("Failed to render JSON: {e}")),
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn secret_label(has_secret: bool) -> String {
    let label = if has_secret { "set" } else { "-" };
    label.to_string()
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = values.map(String::as_str).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_hides_secret_hash() {
        let record = ApplicationRecord {
            client_id: Some("backend".to_string()),
            client_secret: Some("$argon2id$v=19$hash".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(ApplicationView::from(&record)).unwrap();
        assert_eq!(json["clientId"], "backend");
        assert_eq!(json["hasSecret"], true);
        assert!(!json.to_string().contains("argon2id"));
    }

    #[test]
    fn test_join_formats_lists() {
        let values = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join(values.iter()), "a\nb");
        assert_eq!(join(Vec::<String>::new().iter()), "-");
    }
}
