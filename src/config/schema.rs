use crate::automaton::{Automaton, AutomatonBuilder, CompileError};
use crate::pattern::PatternSet;
use serde::Deserialize;
use std::fmt;

/// A rules file: optional matcher options plus an ordered list of rules.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RulesConfig {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Options {
    /// Bytes that count as word ends for `\b`. Defaults to ASCII whitespace.
    #[serde(default)]
    pub word_end_chars: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Rule {
    pub from: String,
    #[serde(default)]
    pub to: String,
}

impl RulesConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.from.is_empty() {
                issues.push(ValidationIssue::EmptyFrom { index });
            }
            if rule.from.contains('\0') {
                issues.push(ValidationIssue::NulInFrom { index });
            }
        }

        if let Some(chars) = &self.options.word_end_chars {
            if chars.contains('\0') {
                issues.push(ValidationIssue::NulWordEnd);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// An empty pattern set configured with this file's options.
    pub fn pattern_set(&self) -> PatternSet {
        match &self.options.word_end_chars {
            Some(chars) => PatternSet::with_word_end_chars(chars.as_bytes()),
            None => PatternSet::new(),
        }
    }

    /// Add this file's rules, in order, to `patterns`.
    pub fn add_to(&self, patterns: &mut PatternSet) -> Result<(), CompileError> {
        for rule in &self.rules {
            patterns.add(&rule.from, &rule.to)?;
        }
        Ok(())
    }

    pub fn compile(&self) -> Result<Automaton, CompileError> {
        let mut patterns = self.pattern_set();
        self.add_to(&mut patterns)?;
        AutomatonBuilder::new(&patterns).build()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    EmptyFrom { index: usize },
    NulInFrom { index: usize },
    NulWordEnd,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rules file contains no rules"),
            ValidationIssue::EmptyFrom { index } => {
                write!(f, "rule {index} has an empty 'from'")
            }
            ValidationIssue::NulInFrom { index } => {
                write!(f, "rule {index} has a NUL byte in 'from'")
            }
            ValidationIssue::NulWordEnd => {
                write!(f, "options.word_end_chars may not contain NUL")
            }
        }
    }
}
