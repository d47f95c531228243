//! End-to-end structural contract scenarios
//!
//! Each test brackets its own suite context: asset server up, fresh browser
//! session navigated to a fixture page, contract swept, session closed
//! unconditionally, server stopped. Contract violations arrive as collected
//! outcomes, never as panics or harness errors.

use std::path::PathBuf;
use std::time::Duration;

use domcheck::{
    verify, BrowserSession, CheckKind, ContractSpec, ControlRule, HarnessError, SessionConfig,
    SuiteContext,
};

fn pages_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pages")
}

fn test_config() -> SessionConfig {
    SessionConfig {
        no_sandbox: true,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn valid_form_satisfies_the_contract() -> anyhow::Result<()> {
    let suite = SuiteContext::start(pages_root(), 0).await?;
    let test = suite.open_with("/index.html", test_config()).await?;

    let report = verify(&test.dom(), &ContractSpec::registration_form()).await?;
    println!(
        "Contract report: {} checks, {} passed, {} failed",
        report.total(),
        report.passed,
        report.failed
    );
    for failure in report.failures() {
        println!("   {}", failure);
    }
    let pass = report.is_pass();
    let total = report.total();

    test.close().await?;
    suite.stop().await;

    assert!(pass, "the valid fixture should satisfy every check");
    // 4 counts + 2 attributes + 5 labels + 2 default selections.
    assert_eq!(total, 13);
    Ok(())
}

#[tokio::test]
async fn missing_label_is_a_reported_failure() -> anyhow::Result<()> {
    let suite = SuiteContext::start(pages_root(), 0).await?;
    let test = suite.open_with("/missing-label.html", test_config()).await?;

    let report = verify(&test.dom(), &ContractSpec::registration_form()).await?;
    test.close().await?;
    suite.stop().await;

    assert!(!report.is_pass());

    // The orphaned checkbox shows up as a label check with zero matches.
    let orphan = report
        .failures()
        .find(|o| o.check == CheckKind::Label && o.selector.contains("topic-events"))
        .expect("orphaned control should produce a label failure");
    assert_eq!(orphan.actual, "0");

    // Sibling checks still ran: the checkbox count itself passed.
    let count = report
        .outcomes
        .iter()
        .find(|o| {
            o.check == CheckKind::Count && o.selector == "form > input[type='checkbox']"
        })
        .expect("count check should be present");
    assert!(count.passed, "count check runs regardless of label failures");

    Ok(())
}

#[tokio::test]
async fn no_default_selection_fails_with_actual_zero() -> anyhow::Result<()> {
    let suite = SuiteContext::start(pages_root(), 0).await?;
    let test = suite.open_with("/no-default.html", test_config()).await?;

    let report = verify(&test.dom(), &ContractSpec::registration_form()).await?;
    test.close().await?;
    suite.stop().await;

    let selection_failures: Vec<_> = report
        .failures()
        .filter(|o| o.check == CheckKind::DefaultSelection)
        .collect();
    assert_eq!(
        selection_failures.len(),
        2,
        "both the radio and the checkbox group lack a default"
    );
    for failure in &selection_failures {
        assert_eq!(failure.actual, "0");
    }

    Ok(())
}

#[tokio::test]
async fn optional_text_input_fails_only_the_required_check() -> anyhow::Result<()> {
    let suite = SuiteContext::start(pages_root(), 0).await?;
    let test = suite.open_with("/optional-text.html", test_config()).await?;

    let report = verify(&test.dom(), &ContractSpec::registration_form()).await?;
    test.close().await?;
    suite.stop().await;

    let attribute = |name: &str| {
        report
            .outcomes
            .iter()
            .find(|o| o.check == CheckKind::Attribute && o.expected.contains(name))
            .unwrap_or_else(|| panic!("attribute check for '{}' should be present", name))
    };

    assert!(attribute("placeholder").passed, "placeholder is present");
    assert!(!attribute("required").passed, "required is missing");

    Ok(())
}

#[tokio::test]
async fn navigation_failure_aborts_the_test_not_the_suite() -> anyhow::Result<()> {
    let suite = SuiteContext::start(pages_root(), 0).await?;

    // A black-hole endpoint: accepts, never responds.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let dead_addr = listener.local_addr()?;
    tokio::spawn(async move {
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let _hold = socket;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                });
            }
        }
    });

    // First "test": navigation times out; its session is torn down.
    let mut session =
        BrowserSession::launch(test_config().nav_timeout(Duration::from_secs(3))).await?;
    let page = session.new_page().await?;
    let result = page
        .navigate(&format!("http://{}/index.html", dead_addr))
        .await;
    assert!(
        matches!(result, Err(HarnessError::NavigationTimeout { .. })),
        "hung navigation should be reported as a timeout"
    );
    session.close().await?;

    // Next "test" on the same suite still works.
    let test = suite.open_with("/index.html", test_config()).await?;
    let radios = test.dom().count("form > input[type='radio']").await?;
    test.close().await?;
    suite.stop().await;

    assert_eq!(radios, 2, "the suite keeps going after a failed test");
    Ok(())
}

#[test]
fn registration_form_contract_shape() {
    let spec = ContractSpec::registration_form();
    assert_eq!(spec.rules.len(), 4);

    let radio = &spec.rules[0];
    assert_eq!(radio.expected_count, 2);
    assert!(radio.label_required);
    assert_eq!(radio.min_checked, Some(1));

    let text = &spec.rules[2];
    assert_eq!(text.expected_count, 1);
    assert_eq!(text.required_attributes, vec!["placeholder", "required"]);
    assert!(!text.label_required);

    // Rules are plain data; a custom contract composes the same way.
    let custom = ControlRule::new("form > select", 1).labelled();
    assert!(custom.min_checked.is_none());
}
