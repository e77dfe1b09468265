//! SAS setup parsing into a column schema.
//!
//! A setup file declares the fixed-width columns in an `INPUT` statement
//! and their descriptions in one or more `LABEL` statements. Parsing is
//! two passes: [`lexer`] turns text into tokens, [`statements`] turns
//! tokens into typed declarations, and [`LayoutParser`] assembles them
//! into a [`Schema`].

pub mod lexer;
pub mod statements;

use crate::config::UnknownLabelPolicy;
use crate::error::{ConvertError, Result};
use crate::models::{FieldDefinition, Schema};
use statements::{FieldDeclaration, LabelAssignment, Statement};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Parse layout text with the default label policy
pub fn parse_layout(text: &str) -> Result<Schema> {
    LayoutParser::new().parse(text)
}

/// Parser for SAS setup files
#[derive(Debug, Clone, Default)]
pub struct LayoutParser {
    label_policy: UnknownLabelPolicy,
}

impl LayoutParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how labels for undeclared variables are handled
    pub fn with_label_policy(mut self, policy: UnknownLabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn parse_file(&self, path: &Path) -> Result<Schema> {
        if !path.exists() {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let schema = self.parse(&text)?;
        debug!(
            "Parsed layout {}: {} fields, record length {}",
            path.display(),
            schema.len(),
            schema.record_length()
        );
        Ok(schema)
    }

    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Schema> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.parse(&text)
    }

    pub fn parse(&self, text: &str) -> Result<Schema> {
        let tokens = lexer::tokenize(text)?;
        let parsed = statements::parse_statements(&tokens)?;

        let mut declarations: Option<Vec<FieldDeclaration>> = None;
        let mut labels: Vec<LabelAssignment> = Vec::new();

        for statement in parsed {
            match statement {
                Statement::Input { line, fields } => {
                    if declarations.is_some() {
                        warn!("Ignoring additional INPUT statement at line {}", line);
                        continue;
                    }
                    if fields.is_empty() {
                        return Err(ConvertError::schema_parse(
                            line,
                            "INPUT statement declares no variables",
                        ));
                    }
                    declarations = Some(fields);
                }
                Statement::Label { labels: found, .. } => labels.extend(found),
                Statement::Other { .. } => {}
            }
        }

        let declarations = declarations
            .ok_or_else(|| ConvertError::schema_parse(1, "no INPUT statement found"))?;

        self.assemble(declarations, labels)
    }

    fn assemble(
        &self,
        declarations: Vec<FieldDeclaration>,
        labels: Vec<LabelAssignment>,
    ) -> Result<Schema> {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(declarations.len());
        let mut fields = Vec::with_capacity(declarations.len());

        for declaration in declarations {
            if positions.contains_key(&declaration.name) {
                return Err(ConvertError::schema_parse(
                    declaration.line,
                    format!("variable '{}' is declared more than once", declaration.name),
                ));
            }
            positions.insert(declaration.name.clone(), fields.len());
            fields.push(FieldDefinition::new(
                declaration.name,
                declaration.start,
                declaration.end,
            ));
        }

        for assignment in labels {
            let Some(&position) = positions.get(&assignment.name) else {
                match self.label_policy {
                    UnknownLabelPolicy::Ignore => {
                        warn!(
                            "Ignoring label for undeclared variable '{}' at line {}",
                            assignment.name, assignment.line
                        );
                        continue;
                    }
                    UnknownLabelPolicy::Error => {
                        return Err(ConvertError::UnknownLabel {
                            name: assignment.name,
                            line: assignment.line,
                        });
                    }
                }
            };

            let field = &mut fields[position];
            if field.label.is_some() {
                debug!(
                    "Label for '{}' redefined at line {}",
                    field.name, assignment.line
                );
            }
            field.label = Some(assignment.text);
        }

        Schema::from_fields(fields).map_err(|name| {
            ConvertError::schema_parse(1, format!("variable '{}' is declared more than once", name))
        })
    }
}
