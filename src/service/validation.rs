//! Request validation from declarative field rules.
//!
//! Two phases: `validate` is pure and runs every syntactic check; `check_unique`
//! consults the store for `Unique` fields. `check_all` runs both and merges the
//! issues back into rule order.

use crate::config::{Check, FieldRule, Resource};
use crate::error::StoreError;
use crate::store::{text_of, Document, DocumentId, DocumentStore, Filter, FindQuery, ID_FIELD};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// One failed check, reported to the client as `{value, msg, param, location}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(skip_serializing_if = "Value::is_null")]
    pub value: Value,
    pub msg: String,
    pub param: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'static str>,
}

impl ValidationIssue {
    pub fn new(param: impl Into<String>, value: Value, msg: impl Into<String>) -> Self {
        ValidationIssue {
            value,
            msg: msg.into(),
            param: param.into(),
            location: Some("body"),
        }
    }

    pub fn at(mut self, location: Option<&'static str>) -> Self {
        self.location = location;
        self
    }
}

pub struct RequestValidator;

impl RequestValidator {
    /// Trim string fields in place, then run every non-unique check in rule order.
    /// Issues come back in the order the checks are declared.
    pub fn validate(body: &mut Document, rules: &[FieldRule]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for rule in rules {
            if let Some(Value::String(s)) = body.get_mut(&rule.field) {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
            let value = body.get(&rule.field).cloned().unwrap_or(Value::Null);
            let text = text_of(&value).unwrap_or_default();

            for fc in &rule.checks {
                let passed = match &fc.check {
                    Check::NotEmpty => !text.is_empty(),
                    Check::Length { min, max } => {
                        let n = text.chars().count();
                        n >= *min && max.map_or(true, |max| n <= max)
                    }
                    Check::Numeric => is_numeric(&text),
                    Check::Pattern(pattern) => match Regex::new(pattern) {
                        Ok(re) => re.is_match(&text),
                        Err(e) => {
                            tracing::warn!(field = %rule.field, error = %e, "invalid pattern in rule");
                            false
                        }
                    },
                    Check::Unique => true,
                };
                if !passed {
                    issues.push(ValidationIssue::new(
                        rule.field.as_str(),
                        value.clone(),
                        fc.message.replace("{value}", &text),
                    ));
                }
            }
        }
        issues
    }

    /// Both phases. The lookup is skipped for fields whose own checks already failed;
    /// issues come back grouped by field in rule order, lookup issues last within a field.
    pub async fn check_all(
        store: &dyn DocumentStore,
        resource: &Resource,
        body: &mut Document,
        current: Option<DocumentId>,
    ) -> Result<Vec<ValidationIssue>, StoreError> {
        let mut issues = Self::validate(body, &resource.rules);
        for rule in resource.rules.iter().filter(|r| r.is_unique()) {
            if issues.iter().any(|i| i.param == rule.field) {
                continue;
            }
            if let Some(issue) = Self::lookup_unique(store, resource, rule, body, current).await? {
                issues.push(issue);
            }
        }
        let rank = |param: &str| resource.rules.iter().position(|r| r.field == param);
        issues.sort_by_key(|i| rank(&i.param));
        Ok(issues)
    }

    /// Look up each `Unique` field by exact match. A hit fails unless it is the
    /// record identified by `current` (a record may keep its own value).
    pub async fn check_unique(
        store: &dyn DocumentStore,
        resource: &Resource,
        body: &Document,
        current: Option<DocumentId>,
    ) -> Result<Vec<ValidationIssue>, StoreError> {
        let mut issues = Vec::new();
        for rule in resource.rules.iter().filter(|r| r.is_unique()) {
            if let Some(issue) = Self::lookup_unique(store, resource, rule, body, current).await? {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    async fn lookup_unique(
        store: &dyn DocumentStore,
        resource: &Resource,
        rule: &FieldRule,
        body: &Document,
        current: Option<DocumentId>,
    ) -> Result<Option<ValidationIssue>, StoreError> {
        let Some(text) = body.get(&rule.field).and_then(text_of).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let own_id = current.map(|id| Value::String(id.to_string()));
        let query = FindQuery::new(Filter::FieldEq {
            field: rule.field.clone(),
            value: text,
        });
        let taken = store
            .find(&resource.collection, &query)
            .await?
            .iter()
            .any(|doc| own_id.is_none() || doc.get(ID_FIELD) != own_id.as_ref());
        if !taken {
            return Ok(None);
        }
        let value = body.get(&rule.field).cloned().unwrap_or(Value::Null);
        Ok(Some(Self::duplicate_issue(resource, &rule.field, value)))
    }

    /// Issue for a uniqueness failure, whether found by lookup or by the store's own constraint.
    pub fn duplicate_issue(resource: &Resource, field: &str, value: Value) -> ValidationIssue {
        let text = text_of(&value).unwrap_or_default();
        let template = resource
            .rules
            .iter()
            .filter(|r| r.field == field)
            .flat_map(|r| r.checks.iter())
            .find(|c| c.check == Check::Unique)
            .map(|c| c.message.as_str())
            .unwrap_or("O valor {value} já está em uso");
        ValidationIssue::new(field, value, template.replace("{value}", &text))
    }
}

/// `^[+-]?([0-9]*[.])?[0-9]+$`
fn is_numeric(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (int, frac) = unsigned.split_once('.').unwrap_or(("", unsigned));
    !frac.is_empty() && int.bytes().all(|b| b.is_ascii_digit()) && frac.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use testresult::TestResult;

    fn body(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => Document::new(),
        }
    }

    fn params(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.param.as_str()).collect()
    }

    #[test]
    fn numeric_matches_decimal_forms() {
        for ok in ["12", "19.90", ".5", "-3", "+0.25"] {
            assert!(is_numeric(ok), "{ok} should be numeric");
        }
        for bad in ["", "12a", "1.2.3", "1.", "R$10", "1,50", "-", " 1"] {
            assert!(!is_numeric(bad), "{bad} should not be numeric");
        }
    }

    #[test]
    fn valid_produto_passes_and_is_trimmed() {
        let mut b = body(json!({"nome": "  Combo X  ", "preco": " 19.90 "}));
        let issues = RequestValidator::validate(&mut b, &Resource::produtos().rules);
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(b.get("nome"), Some(&json!("Combo X")));
        assert_eq!(b.get("preco"), Some(&json!("19.90")));
    }

    #[test]
    fn numeric_json_price_is_accepted() {
        let mut b = body(json!({"nome": "Suco", "preco": 7.5}));
        assert!(RequestValidator::validate(&mut b, &Resource::produtos().rules).is_empty());
        assert_eq!(b.get("preco"), Some(&json!(7.5)));
    }

    #[test]
    fn non_numeric_price_fails_on_preco() {
        let mut b = body(json!({"nome": "Combo X", "preco": "12a"}));
        let issues = RequestValidator::validate(&mut b, &Resource::produtos().rules);
        assert_eq!(params(&issues), vec!["preco"]);
        assert_eq!(
            issues[0].msg,
            "O Preço não pode conter caracteres especiais, apenas números"
        );
        assert_eq!(issues[0].value, json!("12a"));
    }

    #[test]
    fn blank_name_reports_every_failed_check_in_order() {
        let mut b = body(json!({"nome": "   ", "preco": "10"}));
        let issues = RequestValidator::validate(&mut b, &Resource::produtos().rules);
        let msgs: Vec<&str> = issues.iter().map(|i| i.msg.as_str()).collect();
        assert_eq!(
            msgs,
            vec![
                "É obrigatório informar o NOME do Produto",
                "O tamanho do NOME informado é inválido."
            ]
        );
    }

    #[test]
    fn name_length_counts_characters() {
        let mut short = body(json!({"nome": "Pé", "preco": "1"}));
        assert_eq!(params(&RequestValidator::validate(&mut short, &Resource::produtos().rules)), vec!["nome"]);

        let mut accented = body(json!({"nome": "Açaí", "preco": "1"}));
        assert!(RequestValidator::validate(&mut accented, &Resource::produtos().rules).is_empty());

        let mut long = body(json!({"nome": "x".repeat(101), "preco": "1"}));
        assert_eq!(params(&RequestValidator::validate(&mut long, &Resource::produtos().rules)), vec!["nome"]);
    }

    #[test]
    fn missing_fields_are_reported_without_value() {
        let mut b = Document::new();
        let issues = RequestValidator::validate(&mut b, &Resource::produtos().rules);
        assert_eq!(params(&issues), vec!["nome", "nome", "preco", "preco"]);
        let json = serde_json::to_value(&issues[0]).unwrap_or_default();
        assert!(json.get("value").is_none());
        assert_eq!(json.get("location"), Some(&json!("body")));
    }

    #[test]
    fn usuario_email_and_password_rules() {
        let mut b = body(json!({"nome": "Maria", "email": "maria.exemplo", "senha": "123"}));
        let issues = RequestValidator::validate(&mut b, &Resource::usuarios().rules);
        assert_eq!(params(&issues), vec!["email", "senha"]);
    }

    #[tokio::test]
    async fn existing_name_is_rejected_for_new_record() -> TestResult {
        let store = MemoryStore::new();
        let resource = Resource::produtos();
        store
            .insert_one("produtos", body(json!({"nome": "Combo X", "preco": "19.90"})))
            .await?;

        let candidate = body(json!({"nome": "Combo X", "preco": "1"}));
        let issues = RequestValidator::check_unique(&store, &resource, &candidate, None).await?;
        assert_eq!(params(&issues), vec!["nome"]);
        assert_eq!(issues[0].msg, "O nome Combo X já está informado em outro Produto");
        Ok(())
    }

    #[tokio::test]
    async fn record_may_keep_its_own_name() -> TestResult {
        let store = MemoryStore::new();
        let resource = Resource::produtos();
        let own = store
            .insert_one("produtos", body(json!({"nome": "Combo X", "preco": "19.90"})))
            .await?;
        let other = store
            .insert_one("produtos", body(json!({"nome": "Combo Y", "preco": "9"})))
            .await?;

        let candidate = body(json!({"nome": "Combo X", "preco": "21.90"}));
        assert!(RequestValidator::check_unique(&store, &resource, &candidate, Some(own)).await?.is_empty());

        let stolen = RequestValidator::check_unique(&store, &resource, &candidate, Some(other)).await?;
        assert_eq!(params(&stolen), vec!["nome"]);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_name_is_reported_alongside_other_failures() -> TestResult {
        let store = MemoryStore::new();
        let resource = Resource::produtos();
        store
            .insert_one("produtos", body(json!({"nome": "Combo X", "preco": "19.90"})))
            .await?;

        let mut candidate = body(json!({"preco": "12a", "nome": " Combo X "}));
        let issues = RequestValidator::check_all(&store, &resource, &mut candidate, None).await?;
        assert_eq!(params(&issues), vec!["nome", "preco"]);
        assert_eq!(issues[0].msg, "O nome Combo X já está informado em outro Produto");
        Ok(())
    }

    #[tokio::test]
    async fn lookup_is_skipped_for_fields_that_already_failed() -> TestResult {
        let store = MemoryStore::new();
        let resource = Resource::produtos();
        store.insert_one("produtos", body(json!({"nome": "Pé", "preco": "1"}))).await?;

        let mut candidate = body(json!({"nome": "Pé", "preco": "1"}));
        let issues = RequestValidator::check_all(&store, &resource, &mut candidate, None).await?;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].msg, "O tamanho do NOME informado é inválido.");
        Ok(())
    }
}
