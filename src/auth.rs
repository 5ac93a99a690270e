use serde::Serialize;

use crate::columns::{self, ColumnRole};
use crate::table::{Cell, Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }
}

struct StaticAccount {
    email: &'static str,
    password: &'static str,
    role: Role,
    display_name: &'static str,
}

// Plaintext constants, per the deployment's single-tenant setup. Not a
// security boundary.
const STATIC_ACCOUNTS: [StaticAccount; 2] = [
    StaticAccount {
        email: "admin@college.edu",
        password: "admin123",
        role: Role::Admin,
        display_name: "Admin User",
    },
    StaticAccount {
        email: "teacher@college.edu",
        password: "teacher123",
        role: Role::Teacher,
        display_name: "Teacher User",
    },
];

#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub role: Role,
    pub email: String,
    pub display_name: String,
}

/// Local part of an email address: everything before the first '@', or the
/// whole string when there is none. Lowercased.
pub fn email_prefix(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_lowercase()
}

/// Credential check, first match wins: the two static accounts, then the
/// uploaded dataset (student password = local part of the row's email,
/// compared case-insensitively). Pure and read-only; there is no rate
/// limiting or lockout.
pub fn authenticate(email: &str, password: &str, dataset: Option<&Dataset>) -> Option<AuthOutcome> {
    let email = email.trim().to_lowercase();
    let password = password.trim();

    for account in &STATIC_ACCOUNTS {
        if email == account.email && password == account.password {
            return Some(AuthOutcome {
                role: account.role,
                email,
                display_name: account.display_name.to_string(),
            });
        }
    }

    let dataset = dataset?;
    let email_col = columns::detect_role(dataset, ColumnRole::Email)?;
    let idx = dataset.column_index(email_col)?;

    for row in dataset.rows() {
        let Cell::Text(raw) = &row[idx] else {
            continue;
        };
        if raw.trim().to_lowercase() != email {
            continue;
        }
        let expected = email_prefix(raw.trim());
        if password.to_lowercase() != expected {
            return None;
        }
        let display_name = columns::detect_role(dataset, ColumnRole::Name)
            .and_then(|name_col| dataset.column_index(name_col))
            .map(|name_idx| &row[name_idx])
            .and_then(|cell| match cell {
                Cell::Missing => None,
                other => Some(other.display()),
            })
            .unwrap_or_else(|| "Student".to_string());
        return Some(AuthOutcome {
            role: Role::Student,
            email,
            display_name,
        });
    }

    None
}
