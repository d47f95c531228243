//! Structural contract model and verification
//!
//! A [`ContractSpec`] is a read-only table of expectations the document's
//! DOM must satisfy: element counts, required attributes, label↔control
//! association, and default selection state. [`verify`] sweeps every check
//! and collects [`AssertionOutcome`]s; a contract violation is ordinary
//! data for the reporting collaborator, not an error.

use std::fmt;

use serde::Serialize;

use crate::dom::DomQuery;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Count,
    Attribute,
    Label,
    DefaultSelection,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::Count => "count",
            CheckKind::Attribute => "attribute",
            CheckKind::Label => "label",
            CheckKind::DefaultSelection => "default-selection",
        };
        f.write_str(name)
    }
}

/// Pass/fail for one check, with enough diagnostics to act on.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionOutcome {
    pub check: CheckKind,
    pub selector: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

impl fmt::Display for AssertionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: expected {}, actual {} ({})",
            self.check,
            self.selector,
            self.expected,
            self.actual,
            if self.passed { "ok" } else { "FAIL" }
        )
    }
}

/// Expectations for one group of controls matched by a selector.
#[derive(Debug, Clone)]
pub struct ControlRule {
    pub selector: String,
    pub expected_count: usize,
    pub required_attributes: Vec<String>,
    pub label_required: bool,
    /// Minimum number of matches that must carry the `checked` attribute.
    /// `>= min`, so multiple defaults are accepted.
    pub min_checked: Option<u64>,
}

impl ControlRule {
    pub fn new(selector: impl Into<String>, expected_count: usize) -> Self {
        Self {
            selector: selector.into(),
            expected_count,
            required_attributes: Vec::new(),
            label_required: false,
            min_checked: None,
        }
    }

    pub fn require_attribute(mut self, name: impl Into<String>) -> Self {
        self.required_attributes.push(name.into());
        self
    }

    /// Every match must have an `id` with exactly one matching
    /// `form > label[for=<id>]`.
    pub fn labelled(mut self) -> Self {
        self.label_required = true;
        self
    }

    pub fn min_checked(mut self, min: u64) -> Self {
        self.min_checked = Some(min);
        self
    }
}

/// The declarative set of structural expectations for one document.
#[derive(Debug, Clone, Default)]
pub struct ContractSpec {
    pub rules: Vec<ControlRule>,
}

impl ContractSpec {
    pub fn new(rules: Vec<ControlRule>) -> Self {
        Self { rules }
    }

    /// The registration-form contract: exactly 2 radios and 3 checkboxes,
    /// each with exactly one label and at least one checked by default; one
    /// text input carrying `placeholder` and `required`; one submit button.
    pub fn registration_form() -> Self {
        Self::new(vec![
            ControlRule::new("form > input[type='radio']", 2)
                .labelled()
                .min_checked(1),
            ControlRule::new("form > input[type='checkbox']", 3)
                .labelled()
                .min_checked(1),
            ControlRule::new("form > input[type='text']", 1)
                .require_attribute("placeholder")
                .require_attribute("required"),
            ControlRule::new("form > button[type='submit']", 1),
        ])
    }
}

/// Aggregated outcomes of one verification sweep.
#[derive(Debug, Serialize)]
pub struct ContractReport {
    pub outcomes: Vec<AssertionOutcome>,
    pub passed: usize,
    pub failed: usize,
}

impl ContractReport {
    fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            passed: 0,
            failed: 0,
        }
    }

    fn push(&mut self, outcome: AssertionOutcome) {
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
            log::debug!("{}", outcome);
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_pass(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Check every rule of `spec` against the current page.
///
/// Violations are collected; one failing check never stops its siblings, so
/// a single run yields the full diagnostic picture. Only harness faults
/// (CDP transport, marshalling) return `Err`.
pub async fn verify(dom: &DomQuery<'_>, spec: &ContractSpec) -> Result<ContractReport> {
    let mut report = ContractReport::new();

    for rule in &spec.rules {
        let actual = dom.count(&rule.selector).await?;
        report.push(AssertionOutcome {
            check: CheckKind::Count,
            selector: rule.selector.clone(),
            expected: rule.expected_count.to_string(),
            actual: actual.to_string(),
            passed: actual == rule.expected_count,
        });

        for attribute in &rule.required_attributes {
            let presence = dom.attribute_presence(&rule.selector, attribute).await?;
            let missing = presence.iter().filter(|present| !**present).count();
            let actual = if presence.is_empty() {
                "no matching elements".to_string()
            } else {
                format!("missing on {} of {}", missing, presence.len())
            };
            report.push(AssertionOutcome {
                check: CheckKind::Attribute,
                selector: rule.selector.clone(),
                expected: format!("'{}' on every match", attribute),
                actual,
                passed: !presence.is_empty() && missing == 0,
            });
        }

        if rule.label_required {
            verify_labels(dom, rule, &mut report).await?;
        }

        if let Some(min) = rule.min_checked {
            let checked = dom.checked_count(&rule.selector).await?;
            report.push(AssertionOutcome {
                check: CheckKind::DefaultSelection,
                selector: rule.selector.clone(),
                expected: format!(">= {} checked", min),
                actual: checked.to_string(),
                passed: checked >= min,
            });
        }
    }

    log::info!(
        "Contract verified: {} checks, {} passed, {} failed",
        report.total(),
        report.passed,
        report.failed
    );
    Ok(report)
}

/// Each control needs exactly one `form > label[for=<id>]`: zero means an
/// orphaned control, more than one an ambiguous binding. A control without
/// an `id` cannot be associated at all and fails the same check.
async fn verify_labels(
    dom: &DomQuery<'_>,
    rule: &ControlRule,
    report: &mut ContractReport,
) -> Result<()> {
    let ids = dom.ids(&rule.selector).await?;

    for (position, id) in ids.iter().enumerate() {
        match id.as_deref() {
            Some(id) if !id.is_empty() => {
                let label_selector = format!("form > label[for='{}']", id);
                let labels = dom.count(&label_selector).await?;
                report.push(AssertionOutcome {
                    check: CheckKind::Label,
                    selector: label_selector,
                    expected: "1".to_string(),
                    actual: labels.to_string(),
                    passed: labels == 1,
                });
            }
            _ => {
                report.push(AssertionOutcome {
                    check: CheckKind::Label,
                    selector: format!("{} (match #{})", rule.selector, position + 1),
                    expected: "an id with exactly 1 label".to_string(),
                    actual: "control has no id".to_string(),
                    passed: false,
                });
            }
        }
    }

    Ok(())
}
