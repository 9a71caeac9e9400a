use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::Datelike;
use chrono::NaiveDate;
use chrono::Utc;
use regex::Regex;

use crate::context::RequestContext;
use crate::domain::user::models::parse_birthday;
use crate::domain::user::models::CreateUserInput;
use crate::domain::user::models::Role;
use crate::domain::user::models::UpdateUserInput;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::i18n::Catalog;
use crate::i18n::Locale;
use crate::i18n::MessageKey;

static USERNAME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.]{3,24}$").unwrap());

// Same character class as usernames; a storage format, not a strength policy.
static PASSWORD_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.]{8,36}$").unwrap());

pub const MIN_AGE: i32 = 5;
pub const MAX_AGE: i32 = 100;

/// Named constraint applied to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Username,
    Password,
    Role,
    Birthday,
    /// Needs a store round-trip; fails closed on timeout or error.
    UniqueUsername,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Username => "username",
            Rule::Password => "password",
            Rule::Role => "role",
            Rule::Birthday => "birthday",
            Rule::UniqueUsername => "unique_username",
        }
    }
}

/// Ordered rules for one field; the first failing rule is reported.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

/// Request models that carry an explicit field → rules table.
pub trait Validate: Send + Sync {
    const RULES: &'static [FieldRules];

    /// Raw value of `field`, if supplied.
    fn value(&self, field: &str) -> Option<&str>;
}

impl Validate for CreateUserInput {
    const RULES: &'static [FieldRules] = &[
        FieldRules {
            field: "username",
            rules: &[Rule::Required, Rule::Username, Rule::UniqueUsername],
        },
        FieldRules {
            field: "password",
            rules: &[Rule::Required, Rule::Password],
        },
        FieldRules {
            field: "role",
            rules: &[Rule::Required, Rule::Role],
        },
        FieldRules {
            field: "birthday",
            rules: &[Rule::Required, Rule::Birthday],
        },
    ];

    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "username" => self.username.as_deref(),
            "password" => self.password.as_deref(),
            "full_name" => self.full_name.as_deref(),
            "role" => self.role.as_deref(),
            "birthday" => self.birthday.as_deref(),
            _ => None,
        }
    }
}

impl Validate for UpdateUserInput {
    const RULES: &'static [FieldRules] = &[
        FieldRules {
            field: "username",
            rules: &[Rule::Username, Rule::UniqueUsername],
        },
        FieldRules {
            field: "password",
            rules: &[Rule::Password],
        },
        FieldRules {
            field: "role",
            rules: &[Rule::Role],
        },
        FieldRules {
            field: "birthday",
            rules: &[Rule::Birthday],
        },
    ];

    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "username" => self.username.as_deref(),
            "password" => self.password.as_deref(),
            "full_name" => self.full_name.as_deref(),
            "role" => self.role.as_deref(),
            "birthday" => self.birthday.as_deref(),
            _ => None,
        }
    }
}

/// Message reported for a failed `(field, rule)` pair.
pub fn message_key(field: &str, rule: Rule) -> MessageKey {
    match (field, rule) {
        ("username", Rule::Required) => MessageKey::UsernameRequire,
        ("username", Rule::Username) => MessageKey::InvalidUsername,
        ("username", Rule::UniqueUsername) => MessageKey::DuplicateUsername,
        ("password", Rule::Required) => MessageKey::PasswordRequire,
        ("password", Rule::Password) => MessageKey::InvalidPassword,
        ("role", Rule::Required) => MessageKey::RoleRequire,
        ("role", Rule::Role) => MessageKey::InvalidRole,
        ("birthday", _) => MessageKey::InvalidBirthday,
        _ => MessageKey::InvalidValue,
    }
}

/// Failures keyed by field name, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, MessageKey>,
}

impl ValidationReport {
    pub fn single(field: impl Into<String>, key: MessageKey) -> Self {
        let mut report = Self::default();
        report.insert(field, key);
        report
    }

    /// Record a failure unless the field already has one.
    pub fn insert(&mut self, field: impl Into<String>, key: MessageKey) {
        self.errors.entry(field.into()).or_insert(key);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<MessageKey> {
        self.errors.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MessageKey)> {
        self.errors.iter().map(|(field, key)| (field.as_str(), *key))
    }

    /// Render every failure in `locale`.
    pub fn localize(&self, catalog: &Catalog, locale: Locale) -> BTreeMap<String, String> {
        self.iter()
            .map(|(field, key)| (field.to_string(), catalog.message(locale, key)))
            .collect()
    }
}

/// Applies rule tables to request models.
///
/// Built once at startup and shared read-only across requests.
pub struct FieldValidator<R>
where
    R: UserRepository,
{
    repository: Arc<R>,
    uniqueness_timeout: Duration,
    today: fn() -> NaiveDate,
}

impl<R> FieldValidator<R>
where
    R: UserRepository,
{
    /// Create a validator backed by `repository` for uniqueness checks.
    ///
    /// # Arguments
    /// * `repository` - Store consulted by `unique_username`
    /// * `uniqueness_timeout` - Upper bound for one uniqueness lookup
    pub fn new(repository: Arc<R>, uniqueness_timeout: Duration) -> Self {
        Self {
            repository,
            uniqueness_timeout,
            today: || Utc::now().date_naive(),
        }
    }

    /// Replace the clock used for age computation.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Evaluate every field of `input` and collect the failures.
    ///
    /// Fields without `required` are skipped when absent or empty. Within a
    /// field, rules run in table order and stop at the first failure.
    ///
    /// # Arguments
    /// * `ctx` - Request context; bounds the uniqueness lookup
    /// * `input` - Request model to check
    /// * `exclude` - Record whose own username does not count as a duplicate
    pub async fn validate<T: Validate>(
        &self,
        ctx: &RequestContext,
        input: &T,
        exclude: Option<UserId>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        for field_rules in T::RULES {
            let field = field_rules.field;
            let Some(value) = input.value(field).filter(|value| !value.is_empty()) else {
                if field_rules.rules.contains(&Rule::Required) {
                    report.insert(field, message_key(field, Rule::Required));
                }
                continue;
            };

            for &rule in field_rules.rules {
                if !self.check(ctx, rule, value, exclude).await {
                    tracing::debug!(field, rule = rule.name(), "Field failed validation");
                    report.insert(field, message_key(field, rule));
                    break;
                }
            }
        }

        report
    }

    async fn check(
        &self,
        ctx: &RequestContext,
        rule: Rule,
        value: &str,
        exclude: Option<UserId>,
    ) -> bool {
        match rule {
            Rule::Required => true,
            Rule::Username => USERNAME_FORMAT.is_match(value),
            Rule::Password => PASSWORD_FORMAT.is_match(value),
            Rule::Role => value.parse::<Role>().is_ok(),
            Rule::Birthday => is_valid_birthday(value, (self.today)()),
            Rule::UniqueUsername => self.is_username_available(ctx, value, exclude).await,
        }
    }

    async fn is_username_available(
        &self,
        ctx: &RequestContext,
        username: &str,
        exclude: Option<UserId>,
    ) -> bool {
        let budget = self.uniqueness_timeout.min(ctx.remaining());
        let lookup = self.repository.username_taken(ctx, username, exclude);

        match tokio::time::timeout(budget, lookup).await {
            Ok(Ok(taken)) => !taken,
            Ok(Err(e)) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    error = %e,
                    "Username uniqueness check failed, rejecting"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    timeout_ms = budget.as_millis() as u64,
                    "Username uniqueness check timed out, rejecting"
                );
                false
            }
        }
    }
}

/// Whole years between `birthday` and `today`, counting a year only once
/// the birthday has been reached.
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

fn is_valid_birthday(value: &str, today: NaiveDate) -> bool {
    parse_birthday(value)
        .map(|birthday| age_on(birthday, today))
        .is_some_and(|age| (MIN_AGE..=MAX_AGE).contains(&age))
}
