use bitedrop_api::{
    entity::users::UserRole,
    mailer::{MailError, Mailer, TracingMailer, WelcomeEmail},
    routes::params::{MAX_PAGE, Pagination},
};

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));

    let p = Pagination {
        page: Some(0),
        per_page: Some(500),
    };
    assert_eq!(p.normalize(), (1, 100, 0));

    let p = Pagination {
        page: Some(3),
        per_page: Some(10),
    };
    assert_eq!(p.normalize(), (3, 10, 20));
}

#[test]
fn huge_page_does_not_overflow() {
    for page in [i64::MAX / 10, i64::MAX] {
        let (page, per_page, offset) = Pagination {
            page: Some(page),
            per_page: Some(100),
        }
        .normalize();
        assert_eq!(page, MAX_PAGE);
        assert_eq!(per_page, 100);
        assert_eq!(offset, (MAX_PAGE - 1) * 100);
    }
}

fn welcome() -> WelcomeEmail {
    WelcomeEmail {
        to: "chef@example.com".into(),
        name: "Chef".into(),
        role: UserRole::RestaurantAdmin,
        temporary_password: "Tmp!pass1234".into(),
        login_url: "http://localhost:3000/login".into(),
        restaurant_name: Some("Crab Shack".into()),
    }
}

#[test]
fn welcome_body_carries_credentials() {
    let body = welcome().body();
    assert!(body.starts_with("Hello Chef,"));
    assert!(body.contains("restaurant_admin at Crab Shack"));
    assert!(body.contains("Temporary password: Tmp!pass1234"));
    assert!(body.contains("http://localhost:3000/login"));
}

#[tokio::test]
async fn mailer_without_sender_reports_not_configured() {
    let err = TracingMailer::new(None)
        .send_welcome(&welcome())
        .await
        .unwrap_err();
    assert!(matches!(err, MailError::NotConfigured));

    assert!(
        TracingMailer::new(Some("noreply@bitedrop.test".into()))
            .send_welcome(&welcome())
            .await
            .is_ok()
    );
}
