//! Integration tests for subject state transitions.

use std::sync::Arc;

use kernel_auth::{
    AccessMode, AuthConfig, AuthSubject, AuthenticationResult, BasicAuthManager,
    BasicAuthSubject, SecurityError, StaticAccessMode, Subject, User, ViolationKind,
    ANONYMOUS, AUTH_DISABLED,
};

struct TestContext {
    manager: Arc<BasicAuthManager>,
}

impl TestContext {
    fn new() -> Self {
        let config = AuthConfig::new().with_initial_user("neo", "matrix");
        let manager = BasicAuthManager::open(config).unwrap();
        manager.new_user("trinity", "follow", false).unwrap();
        Self { manager }
    }

    fn subject(&self, result: AuthenticationResult) -> BasicAuthSubject {
        let user = self.manager.get_user("trinity").unwrap();
        BasicAuthSubject::new(self.manager.clone(), user, result)
    }
}

/// Capabilities as (reads, writes, schema writes).
fn capabilities(mode: &dyn AccessMode) -> (bool, bool, bool) {
    (
        mode.allows_reads(),
        mode.allows_writes(),
        mode.allows_schema_writes(),
    )
}

fn assert_mode_matches_result(subject: &BasicAuthSubject) {
    let expected = match subject.authentication_result() {
        AuthenticationResult::Success => (true, true, true),
        AuthenticationResult::PasswordChangeRequired | AuthenticationResult::Failure => {
            (false, false, false)
        }
    };
    assert_eq!(capabilities(subject), expected);
    assert_eq!(
        subject.access_mode(),
        subject.authentication_result().access_mode()
    );
}

#[test]
fn construction_maps_result_to_mode() {
    let ctx = TestContext::new();

    let failed = ctx.subject(AuthenticationResult::Failure);
    assert_eq!(failed.access_mode(), StaticAccessMode::NONE);

    let expired = ctx.subject(AuthenticationResult::PasswordChangeRequired);
    assert_eq!(expired.access_mode(), StaticAccessMode::CREDENTIALS_EXPIRED);
    assert_eq!(capabilities(&expired), (false, false, false));

    let ok = ctx.subject(AuthenticationResult::Success);
    assert_eq!(ok.access_mode(), StaticAccessMode::FULL);

    for subject in [&failed, &expired, &ok] {
        assert_mode_matches_result(subject);
    }
}

#[test]
fn mandated_password_change_round_trip() {
    let ctx = TestContext::new();
    let mut subject = ctx.manager.login("neo", "matrix").unwrap();

    assert_eq!(
        subject.authentication_result(),
        AuthenticationResult::PasswordChangeRequired
    );
    let violation = subject.require_read().unwrap_err();
    assert_eq!(violation.kind(), ViolationKind::CredentialsExpired);

    subject.set_password("red pill", false).unwrap();

    assert_eq!(subject.authentication_result(), AuthenticationResult::Success);
    assert!(subject.require_read().is_ok());
    assert!(subject.require_write().is_ok());
    assert!(subject.require_schema_write().is_ok());
    assert_mode_matches_result(subject.as_basic().unwrap());
}

#[test]
fn set_password_on_successful_subject_stays_full() {
    let ctx = TestContext::new();
    let mut subject = ctx.subject(AuthenticationResult::Success);

    subject.set_password("white rabbit", false).unwrap();

    assert_eq!(subject.authentication_result(), AuthenticationResult::Success);
    assert_eq!(subject.access_mode(), StaticAccessMode::FULL);
    assert!(ctx
        .manager
        .get_user("trinity")
        .unwrap()
        .verify_password("white rabbit"));
}

#[test]
fn no_longer_required_is_idempotent() {
    let ctx = TestContext::new();

    let mut once = ctx.subject(AuthenticationResult::PasswordChangeRequired);
    once.set_password_change_no_longer_required();

    let mut twice = ctx.subject(AuthenticationResult::PasswordChangeRequired);
    twice.set_password_change_no_longer_required();
    twice.set_password_change_no_longer_required();

    assert_eq!(once.authentication_result(), twice.authentication_result());
    assert_eq!(once.access_mode(), twice.access_mode());
    assert_eq!(twice.access_mode(), StaticAccessMode::FULL);

    let mut failed = ctx.subject(AuthenticationResult::Failure);
    failed.set_password_change_no_longer_required();
    assert_eq!(failed.authentication_result(), AuthenticationResult::Failure);
    assert_mode_matches_result(&failed);
}

#[test]
fn rejected_password_leaves_subject_restricted() {
    let ctx = TestContext::new();
    let mut subject = ctx.subject(AuthenticationResult::PasswordChangeRequired);

    let err = subject.set_password("follow", false).unwrap_err();
    assert!(matches!(err, SecurityError::InvalidCredential(_)));
    assert_eq!(
        subject.authentication_result(),
        AuthenticationResult::PasswordChangeRequired
    );
    assert_mode_matches_result(&subject);
}

#[test]
fn has_username_is_exact_and_cleared_by_logout() {
    let ctx = TestContext::new();
    let mut subject = ctx.subject(AuthenticationResult::Success);

    assert!(subject.has_username("trinity"));
    assert!(!subject.has_username("Trinity"));
    assert!(!subject.has_username("trin"));

    subject.logout();

    for name in ["trinity", "Trinity", "", "<no user>"] {
        assert!(!subject.has_username(name));
    }
    assert_eq!(subject.username(), None);
}

/// Logout forces FAILURE and also drops the access mode to NONE.
///
/// Earlier kernels cleared the identity and the result but left the previous
/// mode in place, so a logged-out session could still report FULL access.
/// That combination is deliberately no longer possible.
#[test]
fn logout_resets_access_mode_to_none() {
    let ctx = TestContext::new();
    let mut subject = ctx.subject(AuthenticationResult::Success);
    assert!(subject.allows_writes());

    subject.logout();

    assert_eq!(subject.authentication_result(), AuthenticationResult::Failure);
    assert_eq!(subject.access_mode(), StaticAccessMode::NONE);
    assert_eq!(capabilities(&subject), (false, false, false));
    assert_mode_matches_result(&subject);

    subject.logout();
    assert_eq!(subject.access_mode(), StaticAccessMode::NONE);
}

#[test]
fn failed_login_cannot_rotate_password() {
    let ctx = TestContext::new();
    let mut subject = ctx.manager.login("trinity", "not the password").unwrap();
    assert_eq!(subject.authentication_result(), AuthenticationResult::Failure);
    assert!(subject.has_username("trinity"));

    let err = subject.set_password("taken over", false).unwrap_err();
    assert!(matches!(err, SecurityError::AuthorizationDenied(_)));

    assert_eq!(subject.authentication_result(), AuthenticationResult::Failure);
    assert_mode_matches_result(subject.as_basic().unwrap());
    let stored = ctx.manager.get_user("trinity").unwrap();
    assert!(stored.verify_password("follow"));
    assert!(!stored.verify_password("taken over"));
}

#[test]
fn logout_of_pending_subject_blocks_rotation() {
    let ctx = TestContext::new();
    let mut subject = ctx.manager.login("neo", "matrix").unwrap();
    subject.logout();

    subject.set_password_change_no_longer_required();
    assert_eq!(subject.authentication_result(), AuthenticationResult::Failure);

    let err = subject.set_password("another", false).unwrap_err();
    assert!(matches!(err, SecurityError::AuthorizationDenied(_)));
    assert!(ctx.manager.get_user("neo").unwrap().verify_password("matrix"));
}

#[test]
fn snapshot_survives_later_mutation() {
    let ctx = TestContext::new();
    let mut subject: Subject = ctx.subject(AuthenticationResult::Success).into();

    let snapshot = subject.snapshot();
    subject.logout();

    assert!(snapshot.allows_writes());
    assert!(snapshot.allows_schema_writes());
    assert_eq!(snapshot.name(), "trinity");
    assert!(!subject.allows_writes());
}

#[test]
fn anonymous_properties() {
    let mut subject = Subject::anonymous();

    assert!(!subject.allows_reads());
    assert!(!subject.allows_writes());
    assert_eq!(subject.authentication_result(), AuthenticationResult::Failure);
    assert!(matches!(
        subject.set_password("x", false),
        Err(SecurityError::AuthorizationDenied(_))
    ));
    assert!(!subject.has_username("<anonymous>"));
    assert!(!subject.allows_procedure_with(&["admin"]));
    assert!(matches!(
        subject.into_basic(),
        Err(SecurityError::IllegalSubjectType { .. })
    ));
    assert_eq!(ANONYMOUS.name(), "<anonymous>");
}

#[test]
fn auth_disabled_properties() {
    let ctx = TestContext::new();
    let mut subject = Subject::auth_disabled();

    assert!(subject.allows_schema_writes());
    assert_eq!(subject.authentication_result(), AuthenticationResult::Success);
    assert!(subject.set_password("ignored", true).is_ok());
    assert!(subject.allows_procedure_with(&[]));
    assert!(subject.allows_procedure_with(&["reader", "editor"]));
    assert!(!subject.has_username("neo"));
    assert_eq!(AUTH_DISABLED.name(), "<auth disabled>");

    // Nothing reached the store.
    assert!(ctx.manager.get_user("neo").unwrap().verify_password("matrix"));
}

#[test]
fn existence_checks_consult_the_directory() {
    let user = User::with_password("smith", "agent");
    let manager = BasicAuthManager::open(AuthConfig::new()).unwrap();
    let subject = BasicAuthSubject::new(manager, user, AuthenticationResult::Success);

    // The shipped manager exposes a directory; "smith" was never stored in it.
    assert!(matches!(
        subject.ensure_user_exists_with_name("smith"),
        Err(SecurityError::UnknownUser(_))
    ));
    assert!(subject.ensure_user_exists_with_name("admin").is_ok());
    assert!(matches!(
        Subject::anonymous().ensure_user_exists_with_name("admin"),
        Err(SecurityError::UnknownUser(_))
    ));
}
