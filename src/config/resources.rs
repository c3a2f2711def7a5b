//! Resource definitions: collection, route keys and declarative field rules.

/// One constraint on a body field.
#[derive(Clone, Debug, PartialEq)]
pub enum Check {
    /// Present, not null and not blank after trimming.
    NotEmpty,
    /// Character count of the trimmed value.
    Length { min: usize, max: Option<usize> },
    /// Optional sign, digits, at most one decimal point (`12`, `-3`, `.5`, `19.90`).
    Numeric,
    /// Regular expression the trimmed value must match.
    Pattern(String),
    /// No other record may hold the same value. Checked against the store, after the pure rules.
    Unique,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldCheck {
    pub check: Check,
    /// `{value}` is replaced with the offending value.
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub checks: Vec<FieldCheck>,
}

impl FieldRule {
    pub fn new(field: &str) -> Self {
        FieldRule {
            field: field.to_string(),
            checks: Vec::new(),
        }
    }

    pub fn check(mut self, check: Check, message: &str) -> Self {
        self.checks.push(FieldCheck {
            check,
            message: message.to_string(),
        });
        self
    }

    pub fn is_unique(&self) -> bool {
        self.checks.iter().any(|c| c.check == Check::Unique)
    }
}

/// A CRUD resource mounted at `/api/<collection>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    pub collection: String,
    /// Field served by `GET /<lookup_field>/:value`.
    pub lookup_field: String,
    pub sort_field: String,
    /// Never returned by any read.
    pub hidden_fields: Vec<String>,
    pub rules: Vec<FieldRule>,
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

impl Resource {
    pub fn produtos() -> Self {
        Resource {
            collection: "produtos".into(),
            lookup_field: "preco".into(),
            sort_field: "nome".into(),
            hidden_fields: vec!["senha".into()],
            rules: vec![
                FieldRule::new("nome")
                    .check(Check::NotEmpty, "É obrigatório informar o NOME do Produto")
                    .check(
                        Check::Length { min: 3, max: Some(100) },
                        "O tamanho do NOME informado é inválido.",
                    )
                    .check(Check::Unique, "O nome {value} já está informado em outro Produto"),
                FieldRule::new("preco")
                    .check(Check::NotEmpty, "É obrigatório informar a o Preço do Produto")
                    .check(
                        Check::Numeric,
                        "O Preço não pode conter caracteres especiais, apenas números",
                    ),
            ],
        }
    }

    pub fn usuarios() -> Self {
        Resource {
            collection: "usuarios".into(),
            lookup_field: "email".into(),
            sort_field: "nome".into(),
            hidden_fields: vec!["senha".into()],
            rules: vec![
                FieldRule::new("nome")
                    .check(Check::NotEmpty, "É obrigatório informar o NOME do Usuário")
                    .check(
                        Check::Length { min: 3, max: Some(100) },
                        "O tamanho do NOME informado é inválido.",
                    ),
                FieldRule::new("email")
                    .check(Check::NotEmpty, "É obrigatório informar o EMAIL do Usuário")
                    .check(Check::Pattern(EMAIL_PATTERN.into()), "O EMAIL informado é inválido.")
                    .check(Check::Unique, "O email {value} já está cadastrado em outro Usuário"),
                FieldRule::new("senha")
                    .check(Check::NotEmpty, "É obrigatório informar a SENHA do Usuário")
                    .check(
                        Check::Length { min: 6, max: None },
                        "A SENHA deve ter no mínimo 6 caracteres.",
                    ),
            ],
        }
    }

    /// Every resource the server mounts.
    pub fn all() -> Vec<Resource> {
        vec![Resource::usuarios(), Resource::produtos()]
    }

    pub fn unique_fields(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| r.is_unique())
            .map(|r| r.field.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_fields_follow_rules() {
        assert_eq!(Resource::produtos().unique_fields(), vec!["nome".to_string()]);
        assert_eq!(Resource::usuarios().unique_fields(), vec!["email".to_string()]);
    }

    #[test]
    fn collections_are_distinct() {
        let all = Resource::all();
        assert_eq!(all.len(), 2);
        assert_ne!(all[0].collection, all[1].collection);
    }
}
